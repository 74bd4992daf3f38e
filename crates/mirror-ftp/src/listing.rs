//! LIST reply parsing

use std::str::FromStr;

use mirror_core::RemoteEntry;
use suppaftp::list::File;
use tracing::debug;

/// Parse raw LIST lines into entries.
///
/// Both UNIX and DOS formats are accepted. Lines that match neither
/// (such as a leading `total` line) are skipped. Symlinks are reported as
/// files.
pub fn parse_listing<S: AsRef<str>>(lines: &[S]) -> Vec<RemoteEntry> {
    lines
        .iter()
        .filter_map(|line| {
            let line = line.as_ref();
            match File::from_str(line) {
                Ok(file) => Some(file),
                Err(e) => {
                    debug!(line, error = %e, "Skipping unparseable listing line");
                    None
                }
            }
        })
        .map(|file| {
            // Some servers echo the full path when listing a single file
            let name = file.name().rsplit('/').next().unwrap_or_default().to_string();
            if file.is_directory() {
                RemoteEntry::directory(name)
            } else {
                RemoteEntry::file(name)
            }
        })
        .collect()
}
