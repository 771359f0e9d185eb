use std::path::{Path, PathBuf};

use crate::entry::PathKind;

/// Environment variable that pins the install root.
pub const ROOT_ENV: &str = "PROJSUITE_ROOT";

/// Marker file that identifies a suite install directory.
const ROOT_MARKER: &str = "ProjectSuite.toml";

const SUITE_DIR_NAME: &str = "ProjectSuite";

/// Computed fallback locations: where everything lives when no override
/// says otherwise. One instance is built at boot and carried by the
/// registry; tests build their own against a temp directory.
#[derive(Clone, Debug)]
pub struct Defaults {
    pub install_root: PathBuf,
    pub user_data_dir: PathBuf,
}

impl Defaults {
    /// Locate the install root and the per-user data tree.
    pub fn detect() -> Defaults {
        let install_root = match std::env::var_os(ROOT_ENV) {
            Some(root) => PathBuf::from(root),
            None => find_install_root(),
        };
        let user_data_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Documents")
            .join(SUITE_DIR_NAME);
        Defaults {
            install_root,
            user_data_dir,
        }
    }

    /// Both trees under one root. Used by tests and relocatable installs.
    pub fn rooted_at(root: &Path) -> Defaults {
        Defaults {
            install_root: root.to_path_buf(),
            user_data_dir: root.join(SUITE_DIR_NAME),
        }
    }

    /// The entries seeded into a fresh registry, lowest precedence layer.
    pub fn seeded_entries(&self) -> Vec<(&'static str, PathBuf, PathKind)> {
        let data = self.user_data_dir.join("data");
        vec![
            ("ROOT", self.install_root.clone(), PathKind::Directory),
            ("USER_DATA_DIR", self.user_data_dir.clone(), PathKind::Directory),
            ("DATA_DIR", data.clone(), PathKind::Directory),
            ("LOGS_DIR", self.user_data_dir.join("logs"), PathKind::Directory),
            ("EXPORTS_DIR", data.join("exports"), PathKind::Directory),
            ("TEMPLATES_DIR", data.join("templates"), PathKind::Directory),
            ("PROJECTS_DIR", data.join("projects"), PathKind::Directory),
            ("MASTER_DIR", data.join("master"), PathKind::Directory),
            ("TEMP_DIR", data.join("temp"), PathKind::Directory),
            ("BACKUP_DIR", data.join("backup"), PathKind::Directory),
            ("DB_PATH", data.join("projects.db"), PathKind::File),
            (
                "DASHBOARD_FILE",
                data.join("exports").join("dashboard.csv"),
                PathKind::File,
            ),
            (
                "PROJECTS_FILE",
                data.join("exports").join("projects.csv"),
                PathKind::File,
            ),
        ]
    }

    /// Roots scanned by the alternative locator, most specific first.
    pub fn fallback_roots(&self) -> Vec<PathBuf> {
        let mut candidates = vec![self.install_root.clone(), self.install_root.join("data")];
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join(SUITE_DIR_NAME));
            candidates.push(home.join("Documents").join(SUITE_DIR_NAME));
        }
        candidates.push(self.user_data_dir.clone());

        let mut roots: Vec<PathBuf> = Vec::new();
        for candidate in candidates {
            if !roots.contains(&candidate) {
                roots.push(candidate);
            }
        }
        roots
    }

    /// Settings document shared with the suite GUIs (paths/defaults/app).
    pub fn settings_file(&self) -> PathBuf {
        self.user_data_dir.join("config.json")
    }

    /// Default location of the exported registry snapshot.
    pub fn snapshot_file(&self) -> PathBuf {
        self.user_data_dir.join("path_registry.json")
    }

    /// Marker written after the first successful tree setup.
    pub fn init_marker(&self) -> PathBuf {
        self.user_data_dir.join(".init_complete")
    }
}

/// Walk up from the executable looking for a suite install; fall back to
/// the working directory so a developer checkout still resolves.
fn find_install_root() -> PathBuf {
    let start = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .or_else(|| std::env::current_dir().ok());
    let start = match start {
        Some(dir) => dir,
        None => return PathBuf::from("."),
    };

    let mut dir = start.clone();
    for _ in 0..5 {
        let named_suite = dir
            .file_name()
            .map(|name| name == SUITE_DIR_NAME)
            .unwrap_or(false);
        if dir.join(ROOT_MARKER).exists()
            || dir.join("data").join("templates").exists()
            || named_suite
        {
            return dir;
        }
        match dir.parent() {
            Some(parent) => dir = parent.to_path_buf(),
            None => break,
        }
    }
    std::env::current_dir().unwrap_or(start)
}
