use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::defaults::Defaults;
use crate::entry::{self, Origin, PathKind};
use crate::registry::Registry;
use crate::snapshot;

/// Lowercase key names used by earlier config formats, mapped to the
/// current registry names.
pub const LEGACY_KEY_MAP: &[(&str, &str)] = &[
    ("project_dir", "PROJECTS_DIR"),
    ("projects_dir", "PROJECTS_DIR"),
    ("output_dir", "PROJECTS_DIR"),
    ("output_base_dir", "PROJECTS_DIR"),
    ("database_path", "DB_PATH"),
    ("db_path", "DB_PATH"),
    ("data_dir", "DATA_DIR"),
    ("user_data_dir", "USER_DATA_DIR"),
    ("log_dir", "LOGS_DIR"),
    ("logs_dir", "LOGS_DIR"),
    ("master_dir", "MASTER_DIR"),
    ("template_dir", "TEMPLATES_DIR"),
    ("templates_dir", "TEMPLATES_DIR"),
    ("export_dir", "EXPORTS_DIR"),
    ("exports_dir", "EXPORTS_DIR"),
    ("temp_dir", "TEMP_DIR"),
    ("backup_dir", "BACKUP_DIR"),
    ("dashboard_file", "DASHBOARD_FILE"),
    ("projects_file", "PROJECTS_FILE"),
];

/// Map a config key to its registry name. Current uppercase names pass
/// through unchanged; anything else is unmapped.
pub fn normalize_config_key(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    for (old, current) in LEGACY_KEY_MAP {
        if trimmed.eq_ignore_ascii_case(old) {
            return Some((*current).to_string());
        }
    }
    let already_upper = trimmed
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
    if already_upper {
        return Some(trimmed.to_string());
    }
    None
}

/// The settings document shared with the suite GUIs. Sections other than
/// `paths` belong to the applications; missing sections are fine.
#[derive(Serialize, Deserialize, Default, Debug)]
pub struct SettingsDoc {
    #[serde(default)]
    pub paths: BTreeMap<String, String>,
    #[serde(default)]
    pub defaults: BTreeMap<String, String>,
    #[serde(default)]
    pub app: BTreeMap<String, serde_json::Value>,
}

pub fn load_settings(path: &Path) -> Result<SettingsDoc, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read settings {}: {e}", path.display()))?;
    serde_json::from_str(&content)
        .map_err(|e| format!("Failed to parse settings {}: {e}", path.display()))
}

/// Parse `key=value` lines; `#` starts a comment. Returns the pairs plus
/// the lines that could not be parsed.
pub fn parse_flat(content: &str) -> (Vec<(String, String)>, Vec<String>) {
    let mut pairs = Vec::new();
    let mut skipped = Vec::new();
    for (idx, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match line.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                pairs.push((key.trim().to_string(), value.trim().to_string()));
            }
            _ => skipped.push(format!("line {}: {line}", idx + 1)),
        }
    }
    (pairs, skipped)
}

/// Ordered candidates for the flat `defaults.txt` override file.
pub fn flat_candidates(defaults: &Defaults) -> Vec<PathBuf> {
    vec![
        defaults.install_root.join("defaults.txt"),
        defaults.install_root.join("config").join("defaults.txt"),
        defaults.user_data_dir.join("defaults.txt"),
    ]
}

/// Ordered candidates for a persisted registry snapshot.
pub fn snapshot_candidates(defaults: &Defaults) -> Vec<PathBuf> {
    vec![
        defaults.install_root.join("path_registry.json"),
        defaults.install_root.join("config").join("path_registry.json"),
        defaults.user_data_dir.join("path_registry.json"),
    ]
}

/// Seed the registry from disk, lowest precedence first: snapshot and
/// settings as the config layer, then the flat file as the legacy layer.
/// Problems never abort the boot; they come back as notes.
pub fn load_layers(registry: &Registry) -> Vec<String> {
    let mut notes = Vec::new();
    let defaults = registry.defaults().clone();

    for candidate in snapshot_candidates(&defaults) {
        if !candidate.is_file() {
            continue;
        }
        match fs::read_to_string(&candidate) {
            Ok(content) => match snapshot::parse_snapshot(&content) {
                Ok(snap) => {
                    for (key, value) in &snap.paths {
                        let kind = PathKind::infer(&entry::normalize_key(key));
                        registry.put(key, Path::new(value), kind, Origin::Config);
                    }
                    break;
                }
                Err(e) => notes.push(format!("{}: {e}", candidate.display())),
            },
            Err(e) => notes.push(format!("Failed to read {}: {e}", candidate.display())),
        }
    }

    let settings_path = defaults.settings_file();
    if settings_path.is_file() {
        match load_settings(&settings_path) {
            Ok(doc) => apply_pairs(
                registry,
                doc.paths.iter().map(|(k, v)| (k.clone(), v.clone())),
                Origin::Config,
                &mut notes,
            ),
            Err(e) => notes.push(e),
        }
    }

    for candidate in flat_candidates(&defaults) {
        if !candidate.is_file() {
            continue;
        }
        match fs::read_to_string(&candidate) {
            Ok(content) => {
                let (pairs, skipped) = parse_flat(&content);
                for line in skipped {
                    notes.push(format!("{}: skipped {line}", candidate.display()));
                }
                apply_pairs(registry, pairs.into_iter(), Origin::Legacy, &mut notes);
                break;
            }
            Err(e) => notes.push(format!("Failed to read {}: {e}", candidate.display())),
        }
    }

    notes
}

/// Register mapped pairs; application defaults (`default_*`) live in the
/// same files and are not the registry's business.
fn apply_pairs(
    registry: &Registry,
    pairs: impl Iterator<Item = (String, String)>,
    origin: Origin,
    notes: &mut Vec<String>,
) {
    for (raw, value) in pairs {
        if raw.starts_with("default_") || value.is_empty() {
            continue;
        }
        match normalize_config_key(&raw) {
            Some(key) => {
                let kind = PathKind::infer(&key);
                registry.put(&key, Path::new(&value), kind, origin);
            }
            None => notes.push(format!("unrecognized config key: {raw}")),
        }
    }
}

/// Deferred lookup for the projects tree, used when the key is absent from
/// the store entirely. The suite settings dialog writes this value.
pub fn custom_projects_dir(defaults: &Defaults) -> Option<PathBuf> {
    let doc = load_settings(&defaults.settings_file()).ok()?;
    for key in ["output_base_dir", "project_dir", "projects_dir"] {
        if let Some(value) = doc.paths.get(key) {
            if !value.is_empty() {
                return Some(entry::absolutize(Path::new(value)));
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
    fn flat_parsing_skips_comments_and_reports_bad_lines() {
        let content = "# comment\n\nproject_dir=/x/y\nnot a pair\n=no-key\nDB_PATH = /db\n";
        let (pairs, skipped) = parse_flat(content);
        assert_eq!(
            pairs,
            vec![
                ("project_dir".to_string(), "/x/y".to_string()),
                ("DB_PATH".to_string(), "/db".to_string()),
            ]
        );
        assert_eq!(skipped.len(), 2);
        assert!(skipped[0].contains("not a pair"));
    }

    #[test]
    fn key_normalization_maps_legacy_names() {
        assert_eq!(
            normalize_config_key("output_base_dir").as_deref(),
            Some("PROJECTS_DIR")
        );
        assert_eq!(normalize_config_key("DB_PATH").as_deref(), Some("DB_PATH"));
        assert_eq!(normalize_config_key("bogus_key"), None);
        assert_eq!(normalize_config_key(""), None);
    }

    #[test]
    fn settings_document_tolerates_missing_sections() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, "{\"paths\": {\"db_path\": \"/srv/projects.db\"}}").unwrap();
        let doc = load_settings(&path).unwrap();
        assert_eq!(doc.paths.get("db_path").map(String::as_str), Some("/srv/projects.db"));
        assert!(doc.defaults.is_empty());
        assert!(doc.app.is_empty());
    }

    #[test]
    fn layers_feed_the_registry_in_order() {
        let tmp = tempdir().unwrap();
        let defaults = Defaults::rooted_at(tmp.path());
        fs::create_dir_all(&defaults.user_data_dir).unwrap();

        // Config layer: settings document.
        fs::write(
            defaults.settings_file(),
            "{\"paths\": {\"templates_dir\": \"/cfg/templates\", \"mystery\": \"/x\"}}",
        )
        .unwrap();
        // Legacy layer: flat file overriding the same key.
        fs::write(
            tmp.path().join("defaults.txt"),
            "templates_dir=/flat/templates\ndefault_manager=somebody\n",
        )
        .unwrap();

        let registry = Registry::new(defaults);
        registry.seed_defaults();
        let notes = load_layers(&registry);

        assert_eq!(
            registry.get_all_paths().get("TEMPLATES_DIR"),
            Some(&PathBuf::from("/flat/templates"))
        );
        assert!(notes.iter().any(|n| n.contains("mystery")));
        assert!(!notes.iter().any(|n| n.contains("default_manager")));
    }

    #[test]
    fn snapshot_layer_loads_first_existing_candidate() {
        let tmp = tempdir().unwrap();
        let defaults = Defaults::rooted_at(tmp.path());
        fs::create_dir_all(&defaults.user_data_dir).unwrap();
        fs::write(
            defaults.user_data_dir.join("path_registry.json"),
            "{\"paths\": {\"MASTER_DIR\": \"/snap/master\"}, \"timestamp\": \"\", \"app_version\": \"\"}",
        )
        .unwrap();

        let registry = Registry::new(defaults);
        let notes = load_layers(&registry);
        assert!(notes.is_empty());
        assert_eq!(
            registry.get_all_paths().get("MASTER_DIR"),
            Some(&PathBuf::from("/snap/master"))
        );
    }

    #[test]
    fn custom_projects_dir_reads_the_settings_document() {
        let tmp = tempdir().unwrap();
        let defaults = Defaults::rooted_at(tmp.path());
        fs::create_dir_all(&defaults.user_data_dir).unwrap();
        fs::write(
            defaults.settings_file(),
            "{\"paths\": {\"output_base_dir\": \"/custom/projects\"}}",
        )
        .unwrap();
        assert_eq!(
            custom_projects_dir(&defaults),
            Some(PathBuf::from("/custom/projects"))
        );
    }
}
