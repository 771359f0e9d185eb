use std::path::Path;

use crate::entry::{Origin, PathKind};
use crate::registry::Registry;

/// Any `PROJSUITE_PATH_<KEY>` variable sets `<KEY>` directly.
pub const PATH_PREFIX: &str = "PROJSUITE_PATH_";

/// Operator shortcuts for the most load-bearing paths; no internal key
/// names required.
const SPECIAL_VARS: &[(&str, &str)] = &[
    ("PROJSUITE_DASHBOARD_FILE", "DASHBOARD_FILE"),
    ("PROJSUITE_DASHBOARD_DATA_DIR", "EXPORTS_DIR"),
    ("PROJSUITE_DB_PATH", "DB_PATH"),
    ("PROJSUITE_DATA_DIR", "DATA_DIR"),
];

/// Overlay the process environment onto the registry. Runs once at boot,
/// after the file layers, so the operator always wins.
pub fn apply(registry: &Registry) -> usize {
    apply_from(registry, std::env::vars())
}

/// Overlay an explicit variable set. The boot path feeds `std::env::vars`;
/// tests feed their own pairs.
pub fn apply_from(
    registry: &Registry,
    vars: impl IntoIterator<Item = (String, String)>,
) -> usize {
    let mut applied = 0;
    for (name, value) in vars {
        if value.is_empty() {
            continue;
        }
        let key = match name.strip_prefix(PATH_PREFIX) {
            Some(suffix) if !suffix.is_empty() => Some(suffix.to_uppercase()),
            _ => SPECIAL_VARS
                .iter()
                .find(|(var, _)| *var == name)
                .map(|(_, key)| (*key).to_string()),
        };
        let Some(key) = key else { continue };
        if registry.put(&key, Path::new(&value), PathKind::infer(&key), Origin::Env) {
            applied += 1;
        }
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::Defaults;
    use tempfile::tempdir;

    #[test]
    fn prefixed_vars_become_keys() {
        let tmp = tempdir().unwrap();
        let registry = Registry::new(Defaults::rooted_at(tmp.path()));
        let applied = apply_from(
            &registry,
            vec![
                ("PROJSUITE_PATH_ARCHIVE_DIR".to_string(), "/srv/archive".to_string()),
                ("UNRELATED".to_string(), "/elsewhere".to_string()),
                ("PROJSUITE_PATH_".to_string(), "/empty-suffix".to_string()),
            ],
        );
        assert_eq!(applied, 1);
        assert_eq!(
            registry.get_all_paths().get("ARCHIVE_DIR"),
            Some(&std::path::PathBuf::from("/srv/archive"))
        );
    }

    #[test]
    fn special_vars_map_to_internal_keys() {
        let tmp = tempdir().unwrap();
        let registry = Registry::new(Defaults::rooted_at(tmp.path()));
        apply_from(
            &registry,
            vec![(
                "PROJSUITE_DASHBOARD_DATA_DIR".to_string(),
                "/srv/exports".to_string(),
            )],
        );
        assert_eq!(
            registry.get_all_paths().get("EXPORTS_DIR"),
            Some(&std::path::PathBuf::from("/srv/exports"))
        );
    }

    #[test]
    fn environment_outranks_config_values() {
        let tmp = tempdir().unwrap();
        let registry = Registry::new(Defaults::rooted_at(tmp.path()));
        registry.put(
            "DB_PATH",
            Path::new("/from-config/projects.db"),
            PathKind::File,
            Origin::Config,
        );
        apply_from(
            &registry,
            vec![("PROJSUITE_DB_PATH".to_string(), "/from-env/projects.db".to_string())],
        );
        assert_eq!(
            registry.get_all_paths().get("DB_PATH"),
            Some(&std::path::PathBuf::from("/from-env/projects.db"))
        );
    }
}
