use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config;
use crate::defaults::Defaults;
use crate::entry::{Origin, PathKind};
use crate::registry::Registry;

/// One migrated key with the value it carried.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Migrated {
    pub key: String,
    pub value: String,
}

#[derive(Serialize, Clone, Debug, Default)]
pub struct MigrationOutcome {
    pub migrated: Vec<Migrated>,
    pub unmapped: Vec<String>,
    pub skipped: Vec<String>,
    pub renamed: Vec<PathBuf>,
}

impl MigrationOutcome {
    pub fn is_noop(&self) -> bool {
        self.migrated.is_empty()
            && self.unmapped.is_empty()
            && self.skipped.is_empty()
            && self.renamed.is_empty()
    }
}

/// Flat config files left behind by the pre-rename suite.
pub fn legacy_candidates(defaults: &Defaults) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(parent) = defaults.user_data_dir.parent() {
        let old_suite = parent.join("ProjectManagerSuite");
        candidates.push(old_suite.join("paths.conf"));
        candidates.push(old_suite.join("defaults.txt"));
    }
    candidates.push(defaults.install_root.join("paths.conf"));
    candidates
}

impl Registry {
    /// Pull path settings out of pre-rename config files. Mapped keys are
    /// registered; unmapped keys are reported, never silently dropped; the
    /// source file is renamed to `.bak` so user data is preserved. Running
    /// again once the files are gone is a no-op.
    pub fn migrate_legacy(&self) -> MigrationOutcome {
        let mut outcome = MigrationOutcome::default();

        for candidate in legacy_candidates(self.defaults()) {
            if !candidate.is_file() {
                continue;
            }
            let content = match fs::read_to_string(&candidate) {
                Ok(content) => content,
                Err(e) => {
                    outcome
                        .skipped
                        .push(format!("{}: {e}", candidate.display()));
                    continue;
                }
            };

            let (pairs, skipped) = config::parse_flat(&content);
            for line in skipped {
                outcome
                    .skipped
                    .push(format!("{}: {line}", candidate.display()));
            }
            for (raw, value) in pairs {
                match config::normalize_config_key(&raw) {
                    Some(key) if !value.is_empty() => {
                        self.put(&key, Path::new(&value), PathKind::infer(&key), Origin::Legacy);
                        outcome.migrated.push(Migrated { key, value });
                    }
                    _ => outcome.unmapped.push(raw),
                }
            }

            let backup = candidate.with_extension("bak");
            match fs::rename(&candidate, &backup) {
                Ok(()) => outcome.renamed.push(backup),
                Err(e) => outcome.skipped.push(format!(
                    "could not rename {} to {}: {e}",
                    candidate.display(),
                    backup.display()
                )),
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn maps_old_keys_and_reports_the_rest() {
        let tmp = tempdir().unwrap();
        let defaults = Defaults::rooted_at(tmp.path());
        fs::write(
            tmp.path().join("paths.conf"),
            "project_dir=/x/y\nbogus_key=1\n",
        )
        .unwrap();

        let registry = Registry::new(defaults);
        let outcome = registry.migrate_legacy();

        assert_eq!(
            outcome.migrated,
            vec![Migrated {
                key: "PROJECTS_DIR".to_string(),
                value: "/x/y".to_string(),
            }]
        );
        assert_eq!(outcome.unmapped, vec!["bogus_key".to_string()]);
        assert_eq!(
            registry.get_all_paths().get("PROJECTS_DIR"),
            Some(&PathBuf::from("/x/y"))
        );
    }

    #[test]
    fn renames_the_source_to_bak() {
        let tmp = tempdir().unwrap();
        let source = tmp.path().join("paths.conf");
        fs::write(&source, "db_path=/srv/projects.db\n").unwrap();

        let registry = Registry::new(Defaults::rooted_at(tmp.path()));
        let outcome = registry.migrate_legacy();

        assert!(!source.exists());
        let backup = tmp.path().join("paths.bak");
        assert!(backup.is_file());
        assert_eq!(outcome.renamed, vec![backup]);
    }

    #[test]
    fn old_suite_directory_is_scanned() {
        let tmp = tempdir().unwrap();
        let defaults = Defaults::rooted_at(tmp.path());
        let old_suite = tmp.path().join("ProjectManagerSuite");
        fs::create_dir_all(&old_suite).unwrap();
        fs::write(old_suite.join("defaults.txt"), "template_dir=/old/templates\n").unwrap();

        let registry = Registry::new(defaults);
        let outcome = registry.migrate_legacy();
        assert!(outcome
            .migrated
            .iter()
            .any(|m| m.key == "TEMPLATES_DIR" && m.value == "/old/templates"));
    }

    #[test]
    fn second_run_is_a_noop() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join("paths.conf"), "data_dir=/srv/data\n").unwrap();

        let registry = Registry::new(Defaults::rooted_at(tmp.path()));
        assert!(!registry.migrate_legacy().is_noop());
        assert!(registry.migrate_legacy().is_noop());
    }

    #[test]
    fn legacy_values_do_not_outrank_the_environment() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join("paths.conf"), "data_dir=/from-legacy\n").unwrap();

        let registry = Registry::new(Defaults::rooted_at(tmp.path()));
        registry.put(
            "DATA_DIR",
            Path::new("/from-env"),
            PathKind::Directory,
            Origin::Env,
        );
        registry.migrate_legacy();
        assert_eq!(
            registry.get_all_paths().get("DATA_DIR"),
            Some(&PathBuf::from("/from-env"))
        );
    }
}
