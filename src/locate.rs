use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use crate::defaults::Defaults;

/// Renamed path segments seen across suite versions, each with its
/// candidate replacements.
const SEGMENT_SWAPS: &[(&str, &[&str])] = &[
    ("ProjectManagerSuite", &["ProjectSuite", "ProjectManager"]),
    ("data/exports", &["exports", "data"]),
    ("documents/projects", &["projects", "documents"]),
];

/// Recursion bound for the fallback-root scan; resolution stays cheap even
/// on a deep user tree.
const MAX_SCAN_DEPTH: usize = 4;

/// Search for a relocated target. Strategies run in order, first hit wins;
/// no hit means the caller keeps the original path.
pub fn find_alternative(defaults: &Defaults, original: &Path) -> Option<PathBuf> {
    substituted_segments(original)
        .or_else(|| sibling_match(original))
        .or_else(|| fallback_roots(defaults, original))
}

/// Strategy 1: rewrite known renamed segments and take the first variant
/// that exists.
fn substituted_segments(original: &Path) -> Option<PathBuf> {
    let raw = original.to_string_lossy().replace('\\', "/");
    for (old, replacements) in SEGMENT_SWAPS {
        if !raw.contains(old) {
            continue;
        }
        for replacement in *replacements {
            let candidate = PathBuf::from(raw.replace(old, replacement));
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }
    None
}

/// Strategy 2: a case-insensitive substring match against the parent's
/// entries catches renames that kept the original name inside the new one.
fn sibling_match(original: &Path) -> Option<PathBuf> {
    let needle = original.file_name()?.to_string_lossy().to_lowercase();
    let parent = original.parent()?;
    let mut siblings: Vec<PathBuf> = fs::read_dir(parent).ok()?.flatten().map(|e| e.path()).collect();
    siblings.sort();
    siblings.into_iter().find(|sibling| {
        sibling
            .file_name()
            .map(|name| name.to_string_lossy().to_lowercase().contains(&needle))
            .unwrap_or(false)
    })
}

/// Strategy 3: look for the same filename under the plausible roots,
/// direct child first, then a bounded recursive scan.
fn fallback_roots(defaults: &Defaults, original: &Path) -> Option<PathBuf> {
    let name = original.file_name()?;
    for root in defaults.fallback_roots() {
        if !root.is_dir() {
            continue;
        }
        let direct = root.join(name);
        if direct.exists() {
            return Some(direct);
        }
        if let Some(found) = scan_for(&root, name, MAX_SCAN_DEPTH) {
            return Some(found);
        }
    }
    None
}

fn scan_for(dir: &Path, name: &OsStr, depth: usize) -> Option<PathBuf> {
    if depth == 0 {
        return None;
    }
    let mut children: Vec<PathBuf> = fs::read_dir(dir).ok()?.flatten().map(|e| e.path()).collect();
    children.sort();
    for child in &children {
        if child.file_name() == Some(name) {
            return Some(child.clone());
        }
    }
    for child in &children {
        if child.is_dir() {
            if let Some(found) = scan_for(child, name, depth - 1) {
                return Some(found);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn renamed_product_segment_is_substituted() {
        let tmp = tempdir().unwrap();
        let current = tmp.path().join("ProjectSuite").join("data").join("templates");
        fs::create_dir_all(&current).unwrap();
        let stale = tmp
            .path()
            .join("ProjectManagerSuite")
            .join("data")
            .join("templates");

        let defaults = Defaults::rooted_at(tmp.path());
        assert_eq!(find_alternative(&defaults, &stale), Some(current));
    }

    #[test]
    fn sibling_with_matching_name_is_found() {
        let tmp = tempdir().unwrap();
        let renamed = tmp.path().join("templates_v2");
        fs::create_dir_all(&renamed).unwrap();
        let missing = tmp.path().join("templates");

        let defaults = Defaults::rooted_at(tmp.path().join("elsewhere").as_path());
        assert_eq!(find_alternative(&defaults, &missing), Some(renamed));
    }

    #[test]
    fn fallback_roots_are_scanned_recursively() {
        let tmp = tempdir().unwrap();
        let actual = tmp.path().join("data").join("exports").join("dashboard.csv");
        fs::create_dir_all(actual.parent().unwrap()).unwrap();
        fs::write(&actual, "project_id\n").unwrap();

        let missing = tmp
            .path()
            .join("gone")
            .join("deeper")
            .join("dashboard.csv");
        let defaults = Defaults::rooted_at(tmp.path());
        assert_eq!(find_alternative(&defaults, &missing), Some(actual));
    }

    #[test]
    fn no_match_yields_none() {
        let tmp = tempdir().unwrap();
        let defaults = Defaults::rooted_at(tmp.path());
        let missing = tmp.path().join("nothing").join("here.csv");
        assert_eq!(find_alternative(&defaults, &missing), None);
    }
}
