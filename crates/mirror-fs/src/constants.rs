//! Well-known file names used inside a synced root.

use std::path::Path;

/// Files the mirror keeps for its own bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorFile {
    /// Ownership mapping (`path owner` per line)
    Owners,
    /// Lifetime mapping (`path expiry-epoch-ms` per line)
    Lifetimes,
    /// Default front-end configuration file
    Config,
}

impl MirrorFile {
    /// Get the file name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owners => "metadata.txt",
            Self::Lifetimes => "lifetime_metadata.txt",
            Self::Config => "mirror.toml",
        }
    }

    /// Whether a root-level file name belongs to the metadata store,
    /// including the temporary files left by an atomic rewrite.
    pub fn is_metadata_name(name: &str) -> bool {
        [Self::Owners, Self::Lifetimes].iter().any(|file| {
            let base = file.as_str();
            name == base || (name.starts_with(&format!(".{base}.")) && name.ends_with(".tmp"))
        })
    }
}

impl AsRef<Path> for MirrorFile {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for MirrorFile {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for MirrorFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
