use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::diagnose::{Issue, IssueKind};
use crate::registry::Registry;

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Repaired {
    pub key: String,
    pub action: String,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Failed {
    pub key: String,
    pub reason: String,
}

#[derive(Serialize, Clone, Debug, Default)]
pub struct RepairOutcome {
    pub repaired: Vec<Repaired>,
    pub failed: Vec<Failed>,
}

impl Registry {
    /// Apply the safe subset of fixes: directory creation only. Anything
    /// that needs human judgment comes back in `failed` with a reason,
    /// never silently dropped.
    pub fn auto_repair(&self, issues: Option<&[Issue]>) -> RepairOutcome {
        let diagnosed;
        let issues = match issues {
            Some(given) => given,
            None => {
                diagnosed = self.diagnose().issues;
                &diagnosed
            }
        };

        let mut outcome = RepairOutcome::default();
        for issue in issues {
            if !issue.fixable {
                outcome.failed.push(Failed {
                    key: issue.key.clone(),
                    reason: manual_reason(issue.kind),
                });
                continue;
            }
            let path = Path::new(&issue.path);
            let result = match issue.kind {
                IssueKind::MissingDirectory => fs::create_dir_all(path)
                    .map(|()| "created directory".to_string()),
                IssueKind::MissingFile => match path.parent() {
                    Some(parent) => fs::create_dir_all(parent)
                        .map(|()| "created parent directory".to_string()),
                    None => {
                        outcome.failed.push(Failed {
                            key: issue.key.clone(),
                            reason: "path has no parent directory".to_string(),
                        });
                        continue;
                    }
                },
                _ => {
                    outcome.failed.push(Failed {
                        key: issue.key.clone(),
                        reason: "unsupported issue type".to_string(),
                    });
                    continue;
                }
            };
            match result {
                Ok(action) => outcome.repaired.push(Repaired {
                    key: issue.key.clone(),
                    action,
                }),
                Err(e) => outcome.failed.push(Failed {
                    key: issue.key.clone(),
                    reason: e.to_string(),
                }),
            }
        }
        outcome
    }
}

fn manual_reason(kind: IssueKind) -> String {
    match kind {
        IssueKind::PermissionDenied => "permission problems need a manual fix".to_string(),
        IssueKind::NotADirectory => "type mismatch needs a manual fix".to_string(),
        IssueKind::MissingKey => "missing keys must be registered manually".to_string(),
        _ => "not automatically fixable".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::Defaults;
    use crate::diagnose::Severity;
    use tempfile::tempdir;

    #[test]
    fn missing_directories_all_get_created() {
        let tmp = tempdir().unwrap();
        let registry = Registry::new(Defaults::rooted_at(tmp.path()));
        registry.register_path("ALPHA_DIR", tmp.path().join("alpha"));
        registry.register_path("BETA_DIR", tmp.path().join("nested").join("beta"));

        let issues: Vec<Issue> = registry
            .diagnose()
            .issues
            .into_iter()
            .filter(|i| i.kind == IssueKind::MissingDirectory)
            .collect();
        let outcome = registry.auto_repair(Some(&issues));

        assert!(outcome.failed.is_empty(), "failures: {:?}", outcome.failed);
        assert_eq!(outcome.repaired.len(), 2);
        assert!(tmp.path().join("alpha").is_dir());
        assert!(tmp.path().join("nested").join("beta").is_dir());
    }

    #[test]
    fn file_issues_get_their_parent_only() {
        let tmp = tempdir().unwrap();
        let registry = Registry::new(Defaults::rooted_at(tmp.path()));
        let db = tmp.path().join("data").join("projects.db");
        registry.register_path("DB_PATH", &db);

        let outcome = registry.auto_repair(None);
        assert!(db.parent().unwrap().is_dir());
        assert!(!db.exists());
        assert!(outcome
            .repaired
            .iter()
            .any(|r| r.key == "DB_PATH" && r.action == "created parent directory"));
    }

    #[test]
    fn unfixable_issues_come_back_as_failed() {
        let tmp = tempdir().unwrap();
        let registry = Registry::new(Defaults::rooted_at(tmp.path()));
        let issues = vec![Issue {
            key: "DB_PATH".to_string(),
            path: "/somewhere/projects.db".to_string(),
            kind: IssueKind::PermissionDenied,
            severity: Severity::High,
            fixable: false,
            suggested_fix: String::new(),
        }];

        let outcome = registry.auto_repair(Some(&issues));
        assert!(outcome.repaired.is_empty());
        assert_eq!(outcome.failed.len(), 1);
        assert!(outcome.failed[0].reason.contains("manual"));
    }

    #[test]
    fn runs_its_own_diagnosis_when_none_supplied() {
        let tmp = tempdir().unwrap();
        let registry = Registry::new(Defaults::rooted_at(tmp.path()));
        registry.register_path("GAMMA_DIR", tmp.path().join("gamma"));

        let outcome = registry.auto_repair(None);
        assert!(outcome.repaired.iter().any(|r| r.key == "GAMMA_DIR"));
        assert!(tmp.path().join("gamma").is_dir());
    }
}
