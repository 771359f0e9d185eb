use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;

use serde::Serialize;

use crate::clock;
use crate::entry::PathKind;
use crate::registry::Registry;

/// Keys the suite cannot run without; their problems are always high
/// severity, and their absence from the store is itself an issue.
pub const ESSENTIAL_KEYS: &[&str] = &["DATA_DIR", "DB_PATH", "PROJECTS_DIR", "EXPORTS_DIR"];

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MissingDirectory,
    MissingFile,
    NotADirectory,
    PermissionDenied,
    MissingKey,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            IssueKind::MissingDirectory => "missing directory",
            IssueKind::MissingFile => "missing file",
            IssueKind::NotADirectory => "type mismatch",
            IssueKind::PermissionDenied => "permission denied",
            IssueKind::MissingKey => "missing key",
        };
        write!(f, "{label}")
    }
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Issue {
    pub key: String,
    pub path: String,
    pub kind: IssueKind,
    pub severity: Severity,
    pub fixable: bool,
    pub suggested_fix: String,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub total: usize,
    pub missing: usize,
    pub type_mismatches: usize,
    pub permission_issues: usize,
    pub missing_keys: usize,
}

#[derive(Serialize, Clone, Debug)]
pub struct Report {
    pub timestamp: String,
    pub status: String,
    pub stats: Stats,
    pub issues: Vec<Issue>,
}

impl Report {
    pub fn is_healthy(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }
}

impl Registry {
    /// Classify every entry: missing targets, type mismatches, write
    /// failures, and essential keys absent from the store. The registry is
    /// never mutated; two consecutive runs see the same issues.
    pub fn diagnose(&self) -> Report {
        let entries = self.entries();
        let mut stats = Stats {
            total: entries.len(),
            ..Stats::default()
        };
        let mut issues = Vec::new();

        for entry in &entries {
            let severity = if ESSENTIAL_KEYS.contains(&entry.key.as_str()) {
                Severity::High
            } else {
                Severity::Medium
            };
            let path = &entry.path;

            if !path.exists() {
                stats.missing += 1;
                issues.push(match entry.kind {
                    PathKind::Directory => Issue {
                        key: entry.key.clone(),
                        path: path.display().to_string(),
                        kind: IssueKind::MissingDirectory,
                        severity,
                        fixable: true,
                        suggested_fix: format!("mkdir -p \"{}\"", path.display()),
                    },
                    PathKind::File => Issue {
                        key: entry.key.clone(),
                        path: path.display().to_string(),
                        kind: IssueKind::MissingFile,
                        severity,
                        fixable: true,
                        suggested_fix: parent_fix(path),
                    },
                    PathKind::Opaque => Issue {
                        key: entry.key.clone(),
                        path: path.display().to_string(),
                        kind: IssueKind::MissingFile,
                        severity,
                        fixable: false,
                        suggested_fix: "verify the configured path".to_string(),
                    },
                });
                continue;
            }

            let mismatch = match entry.kind {
                PathKind::Directory => !path.is_dir(),
                PathKind::File => path.is_dir(),
                PathKind::Opaque => false,
            };
            if mismatch {
                stats.type_mismatches += 1;
                issues.push(Issue {
                    key: entry.key.clone(),
                    path: path.display().to_string(),
                    kind: IssueKind::NotADirectory,
                    severity: Severity::High,
                    fixable: false,
                    suggested_fix: format!(
                        "remove or rename whatever occupies \"{}\"",
                        path.display()
                    ),
                });
                continue;
            }

            if let Some(reason) = probe_access(path) {
                stats.permission_issues += 1;
                issues.push(Issue {
                    key: entry.key.clone(),
                    path: path.display().to_string(),
                    kind: IssueKind::PermissionDenied,
                    severity: Severity::High,
                    fixable: false,
                    suggested_fix: format!("{reason}; chmod +rw \"{}\"", path.display()),
                });
            }
        }

        for key in ESSENTIAL_KEYS {
            if !self.contains_key(key) {
                stats.missing_keys += 1;
                issues.push(Issue {
                    key: (*key).to_string(),
                    path: String::new(),
                    kind: IssueKind::MissingKey,
                    severity: Severity::High,
                    fixable: false,
                    suggested_fix: format!("register {key} or re-run the suite bootstrap"),
                });
            }
        }

        let status = if issues.is_empty() {
            "healthy"
        } else {
            "issues_found"
        };
        Report {
            timestamp: clock::now_iso(),
            status: status.to_string(),
            stats,
            issues,
        }
    }
}

fn parent_fix(path: &Path) -> String {
    match path.parent() {
        Some(parent) => format!("mkdir -p \"{}\"", parent.display()),
        None => "verify the configured path".to_string(),
    }
}

/// Existing directories get a create-and-delete sentinel probe; existing
/// files a one-byte read. Transient sentinel aside, the target is left as
/// found.
fn probe_access(path: &Path) -> Option<String> {
    if path.is_dir() {
        let probe = path.join(format!(".wayfinder_probe_{}", std::process::id()));
        match fs::File::create(&probe) {
            Ok(_) => {
                let _ = fs::remove_file(&probe);
                None
            }
            Err(e) => Some(format!("directory is not writable: {e}")),
        }
    } else if path.is_file() {
        match fs::File::open(path) {
            Ok(mut file) => {
                let mut buf = [0u8; 1];
                match file.read(&mut buf) {
                    Ok(_) => None,
                    Err(e) => Some(format!("file is not readable: {e}")),
                }
            }
            Err(e) => Some(format!("file is not readable: {e}")),
        }
    } else {
        None
    }
}
