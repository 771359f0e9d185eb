use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::clock;
use crate::entry::Origin;
use crate::registry::Registry;

/// The cross-process hand-off document: the full key to path map plus a
/// little provenance.
#[derive(Serialize, Deserialize, Debug)]
pub struct Snapshot {
    pub paths: BTreeMap<String, String>,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub app_version: String,
}

/// Accepts the current tagged form and the bare key to path map written by
/// earlier suite versions.
pub(crate) fn parse_snapshot(content: &str) -> Result<Snapshot, String> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Doc {
        Tagged(Snapshot),
        Bare(BTreeMap<String, String>),
    }

    match serde_json::from_str::<Doc>(content) {
        Ok(Doc::Tagged(snapshot)) => Ok(snapshot),
        Ok(Doc::Bare(paths)) => Ok(Snapshot {
            paths,
            timestamp: String::new(),
            app_version: String::new(),
        }),
        Err(e) => Err(format!("Failed to parse path snapshot: {e}")),
    }
}

impl Registry {
    /// Write the registry snapshot, defaulting to the user data dir. A
    /// failed save is reported, never swallowed: losing configuration is
    /// operator-visible.
    pub fn export_config(&self, path: Option<&Path>) -> Result<PathBuf, String> {
        let target = match path {
            Some(p) => p.to_path_buf(),
            None => self.defaults().snapshot_file(),
        };
        let snapshot = Snapshot {
            paths: self
                .get_all_paths()
                .into_iter()
                .map(|(key, path)| (key, path.display().to_string()))
                .collect(),
            timestamp: clock::now_iso(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
        };
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| format!("Failed to serialize path snapshot: {e}"))?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
        fs::write(&target, format!("{json}\n"))
            .map_err(|e| format!("Failed to write {}: {e}", target.display()))?;
        Ok(target)
    }

    /// Load a snapshot; imported values win over whatever is currently
    /// stored. Returns how many entries were applied.
    pub fn import_config(&self, path: &Path) -> Result<usize, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
        let snapshot = parse_snapshot(&content)?;
        let mut applied = 0;
        for (key, value) in &snapshot.paths {
            if value.is_empty() {
                continue;
            }
            self.put_forced(key, Path::new(value), Origin::Config);
            applied += 1;
        }
        Ok(applied)
    }
}
