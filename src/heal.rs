use std::fs;
use std::path::Path;

use crate::entry::{PathEntry, PathKind};

/// Create what is safe to create for a missing target. Directories get the
/// full tree; file-kind targets get their parent only, so an empty file is
/// never mistaken for real data. Opaque targets are left alone.
pub fn heal_missing(kind: PathKind, path: &Path) -> bool {
    match kind {
        PathKind::Directory => fs::create_dir_all(path).is_ok(),
        PathKind::File => ensure_parent(path),
        PathKind::Opaque => false,
    }
}

/// Backing for `Registry::ensure_directory`: idempotent tree creation.
pub fn ensure(entry: &PathEntry) -> bool {
    match entry.kind {
        PathKind::File => ensure_parent(&entry.path),
        _ => fs::create_dir_all(&entry.path).is_ok() && entry.path.is_dir(),
    }
}

fn ensure_parent(path: &Path) -> bool {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).is_ok() && parent.is_dir()
        }
        _ => false,
    }
}
