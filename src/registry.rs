use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::config;
use crate::defaults::Defaults;
use crate::entry::{self, Origin, PathEntry, PathKind};
use crate::heal;
use crate::locate;

/// Declared key equivalences, resolved at lookup time. The right-hand name
/// is the canonical key; nothing is ever stored under the left-hand one, so
/// the two can never diverge.
const ALIASES: &[(&str, &str)] = &[
    ("OUTPUT_BASE_DIR", "PROJECTS_DIR"),
    ("EXPORT_DIR", "EXPORTS_DIR"),
    ("LOG_DIR", "LOGS_DIR"),
    ("DATABASE_PATH", "DB_PATH"),
];

fn canonical_key(key: &str) -> String {
    for (alias, target) in ALIASES {
        if key == *alias {
            return (*target).to_string();
        }
    }
    key.to_string()
}

/// The shared name to location resolver.
///
/// One registry is constructed at process entry (usually through
/// [`Registry::bootstrap`]) and passed by reference to every collaborator.
/// The map is mutex-guarded: UI threads read while background work repairs.
pub struct Registry {
    defaults: Defaults,
    paths: Mutex<HashMap<String, PathEntry>>,
}

impl Registry {
    /// An empty registry. Callers that want the layered boot sequence
    /// should use [`Registry::bootstrap`] instead.
    pub fn new(defaults: Defaults) -> Registry {
        Registry {
            defaults,
            paths: Mutex::new(HashMap::new()),
        }
    }

    /// Layered boot: computed defaults, then persisted config, then legacy
    /// flat-file values, then the environment overlay. Highest layer wins.
    pub fn bootstrap(defaults: Defaults) -> Registry {
        Registry::bootstrap_with_notes(defaults).0
    }

    /// Same as [`Registry::bootstrap`], also returning the non-fatal
    /// warnings collected while loading persisted sources.
    pub fn bootstrap_with_notes(defaults: Defaults) -> (Registry, Vec<String>) {
        let registry = Registry::new(defaults);
        registry.seed_defaults();
        let notes = config::load_layers(&registry);
        crate::env::apply(&registry);
        (registry, notes)
    }

    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    pub(crate) fn seed_defaults(&self) {
        for (key, path, kind) in self.defaults.seeded_entries() {
            self.put(key, &path, kind, Origin::Default);
        }
    }

    /// Precedence-respecting write. Returns false when an existing entry
    /// outranks the writer or the path is empty.
    pub(crate) fn put(&self, key: &str, path: &Path, kind: PathKind, origin: Origin) -> bool {
        let key = canonical_key(&entry::normalize_key(key));
        if key.is_empty() || path.as_os_str().is_empty() {
            return false;
        }
        let path = entry::absolutize(path);
        let mut map = self.paths.lock();
        if let Some(existing) = map.get(&key) {
            if origin < existing.origin {
                return false;
            }
        }
        map.insert(
            key.clone(),
            PathEntry {
                key,
                path,
                kind,
                origin,
            },
        );
        true
    }

    /// Unconditional write; import uses this so loaded values always win.
    pub(crate) fn put_forced(&self, key: &str, path: &Path, origin: Origin) {
        let key = canonical_key(&entry::normalize_key(key));
        if key.is_empty() || path.as_os_str().is_empty() {
            return;
        }
        let kind = PathKind::infer(&key);
        let path = entry::absolutize(path);
        let mut map = self.paths.lock();
        map.insert(
            key.clone(),
            PathEntry {
                key,
                path,
                kind,
                origin,
            },
        );
    }

    /// Register a path under `key` (uppercased). Registration is a pure
    /// data operation: nothing is created on disk until a lookup heals or
    /// `ensure_directory` is called.
    pub fn register_path(&self, key: &str, path: impl AsRef<Path>) {
        let kind = PathKind::infer(&entry::normalize_key(key));
        self.put(key, path.as_ref(), kind, Origin::UserRegistered);
    }

    /// Register with an explicit kind instead of the suffix default.
    pub fn register_path_with_kind(&self, key: &str, path: impl AsRef<Path>, kind: PathKind) {
        self.put(key, path.as_ref(), kind, Origin::UserRegistered);
    }

    pub(crate) fn entry(&self, key: &str) -> Option<PathEntry> {
        let key = canonical_key(&entry::normalize_key(key));
        self.paths.lock().get(&key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        let key = canonical_key(&entry::normalize_key(key));
        self.paths.lock().contains_key(&key)
    }

    /// Resolve a key. Targets missing from disk are relocated or healed
    /// before returning; an unknown key resolves to `None`.
    pub fn get_path(&self, key: &str) -> Option<PathBuf> {
        let key = canonical_key(&entry::normalize_key(key));
        let found = self.entry(&key).or_else(|| {
            if key != "PROJECTS_DIR" {
                return None;
            }
            // Deferred custom location for the projects tree, kept in the
            // suite settings document rather than the registry itself.
            let custom = config::custom_projects_dir(&self.defaults)?;
            self.put(&key, &custom, PathKind::Directory, Origin::Config);
            self.entry(&key)
        });
        found.map(|e| self.resolve_entry(e))
    }

    /// Resolve a key, falling back to a caller-supplied location. The
    /// fallback gets the same healing treatment as a stored entry.
    pub fn get_path_or(&self, key: &str, default: impl AsRef<Path>) -> PathBuf {
        match self.get_path(key) {
            Some(path) => path,
            None => {
                let key = canonical_key(&entry::normalize_key(key));
                let fallback = PathEntry {
                    kind: PathKind::infer(&key),
                    key,
                    path: entry::absolutize(default.as_ref()),
                    origin: Origin::Default,
                };
                self.resolve_entry(fallback)
            }
        }
    }

    /// Missing targets: try the alternative locator first so relocated data
    /// is found before an empty directory is manufactured in its place. A
    /// located match is written back under the key for the rest of the
    /// process; healing is best-effort and never fails the lookup.
    fn resolve_entry(&self, entry: PathEntry) -> PathBuf {
        if entry.path.exists() {
            return entry.path;
        }
        if let Some(found) = locate::find_alternative(&self.defaults, &entry.path) {
            let mut map = self.paths.lock();
            map.insert(
                entry.key.clone(),
                PathEntry {
                    key: entry.key,
                    path: found.clone(),
                    kind: entry.kind,
                    origin: entry.origin,
                },
            );
            return found;
        }
        heal::heal_missing(entry.kind, &entry.path);
        entry.path
    }

    /// Snapshot of every key and its current location.
    pub fn get_all_paths(&self) -> BTreeMap<String, PathBuf> {
        self.paths
            .lock()
            .values()
            .map(|e| (e.key.clone(), e.path.clone()))
            .collect()
    }

    /// Every entry, sorted by key. Listing order is stable for UIs and
    /// reports.
    pub fn entries(&self) -> Vec<PathEntry> {
        let mut entries: Vec<PathEntry> = self.paths.lock().values().cloned().collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        entries
    }

    /// Create the directory tree for `key` (or the parent tree for
    /// file-kind keys). Idempotent; false when the key is unknown or the
    /// filesystem refuses.
    pub fn ensure_directory(&self, key: &str) -> bool {
        match self.entry(key) {
            Some(entry) => heal::ensure(&entry),
            None => false,
        }
    }
}
