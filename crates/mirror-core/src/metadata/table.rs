//! Line format shared by both metadata files: `<path> <value>` per line.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

/// Parse `path value` lines. The split happens at the last space, so paths
/// may contain spaces but values may not. Malformed lines are skipped.
pub(super) fn parse<V: FromStr>(content: &str, file: &str) -> BTreeMap<String, V> {
    let mut entries = BTreeMap::new();
    for (number, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let Some((path, value)) = line.rsplit_once(' ') else {
            tracing::warn!(file, line = number + 1, "Skipping metadata line without a value");
            continue;
        };
        match value.parse::<V>() {
            Ok(value) if !path.is_empty() => {
                entries.insert(path.to_string(), value);
            }
            _ => {
                tracing::warn!(file, line = number + 1, "Skipping malformed metadata line");
            }
        }
    }
    entries
}

/// Render entries one per line in path order.
pub(super) fn render<V: Display>(entries: &BTreeMap<String, V>) -> String {
    let mut out = String::new();
    for (path, value) in entries {
        out.push_str(path);
        out.push(' ');
        out.push_str(&value.to_string());
        out.push('\n');
    }
    out
}
