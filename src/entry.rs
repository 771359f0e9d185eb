use std::fmt;
use std::path::{Path, PathBuf};

/// Expected on-disk shape of a registered path.
///
/// Inferred from the key suffix (`_DIR`/`_FOLDER`, `_FILE`/`_PATH`) when a
/// caller does not supply one; stored explicitly so nothing downstream has
/// to re-derive it from the key string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathKind {
    Directory,
    File,
    Opaque,
}

impl PathKind {
    /// Default kind for a key, from the suffix convention.
    pub fn infer(key: &str) -> PathKind {
        if key.ends_with("_DIR") || key.ends_with("_FOLDER") {
            PathKind::Directory
        } else if key.ends_with("_FILE") || key.ends_with("_PATH") {
            PathKind::File
        } else {
            PathKind::Opaque
        }
    }
}

/// Who wrote an entry. Later variants outrank earlier ones, so a plain
/// comparison decides whether a write is allowed to replace what is stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Origin {
    Default,
    Config,
    Legacy,
    Env,
    UserRegistered,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Origin::Default => "default",
            Origin::Config => "config",
            Origin::Legacy => "legacy",
            Origin::Env => "env",
            Origin::UserRegistered => "user",
        };
        write!(f, "{label}")
    }
}

/// A single key to location binding.
#[derive(Clone, Debug)]
pub struct PathEntry {
    pub key: String,
    pub path: PathBuf,
    pub kind: PathKind,
    pub origin: Origin,
}

impl PathEntry {
    pub fn is_user_registered(&self) -> bool {
        self.origin == Origin::UserRegistered
    }
}

/// Registry keys are uppercase; normalize once at the boundary.
pub fn normalize_key(key: &str) -> String {
    key.trim().to_uppercase()
}

/// Make a path absolute without touching the filesystem. Relative paths are
/// resolved against the current working directory; symlinks are left alone.
pub fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    }
}
