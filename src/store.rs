//! Template store: deterministic lookup of fragments by logical key.
//!
//! The corpus lives under `data/source/<category>/<role>[-<variant>].{c,h}`
//! where `<category>` may contain further subdirectories. The relative
//! directory is the category, the file stem is `role[-variant]`. Stems are
//! unique within a category; source and header fragments of the same role
//! live in sibling categories (`runtime_structure.c` / `runtime_structure.h`).

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use log::debug;
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Identity of one fragment. `variant` is joined onto the role with `-`
/// to form the on-disk stem.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FragmentKey {
    pub category: String,
    pub role: String,
    pub variant: Option<String>,
}

impl FragmentKey {
    pub fn new(category: &str, role: &str) -> Self {
        FragmentKey {
            category: category.to_string(),
            role: role.to_string(),
            variant: None,
        }
    }

    pub fn with_variant(category: &str, role: &str, variant: &str) -> Self {
        FragmentKey {
            category: category.to_string(),
            role: role.to_string(),
            variant: Some(variant.to_string()),
        }
    }

    /// File stem inside the category directory.
    pub fn stem(&self) -> String {
        match &self.variant {
            Some(variant) => format!("{}-{}", self.role, variant),
            None => self.role.clone(),
        }
    }
}

impl fmt::Display for FragmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.stem())
    }
}

/// One loaded template fragment. Immutable; identity is the path.
#[derive(Debug)]
pub struct Fragment {
    pub key: FragmentKey,
    pub path: PathBuf,
    pub text: Arc<String>,
}

/// Read-only after construction; fragment bodies are loaded on first use
/// and cached, so sharing across compositions is safe.
pub struct TemplateStore {
    root: PathBuf,
    /// category -> stem -> file path. BTreeMap keeps `list` order stable.
    index: BTreeMap<String, BTreeMap<String, PathBuf>>,
    cache: RwLock<BTreeMap<String, Arc<String>>>,
}

impl TemplateStore {
    /// Index the corpus below `root`. Only `.c` and `.h` files participate.
    pub fn open(root: &Path) -> Result<Self> {
        let mut index: BTreeMap<String, BTreeMap<String, PathBuf>> = BTreeMap::new();
        let mut count = 0usize;

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                match e.into_io_error() {
                    Some(io) => Error::io(path, io),
                    None => Error::Internal(format!("walk loop below {}", path.display())),
                }
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let is_template = path
                .extension()
                .is_some_and(|ext| ext == "c" || ext == "h");
            if !is_template {
                continue;
            }
            let relative = path
                .parent()
                .and_then(|parent| parent.strip_prefix(root).ok())
                .ok_or_else(|| {
                    Error::Internal(format!("template outside root: {}", path.display()))
                })?;
            let category = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let stem = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            index
                .entry(category)
                .or_default()
                .insert(stem, path.to_path_buf());
            count += 1;
        }

        debug!("indexed {} fragments below {}", count, root.display());
        Ok(TemplateStore {
            root: root.to_path_buf(),
            index,
            cache: RwLock::new(BTreeMap::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Look up one fragment, loading and caching its body.
    pub fn get(&self, key: &FragmentKey) -> Result<Fragment> {
        let path = self
            .index
            .get(&key.category)
            .and_then(|stems| stems.get(&key.stem()))
            .ok_or_else(|| Error::TemplateMissing {
                key: key.to_string(),
            })?;

        let cache_key = key.to_string();
        if let Ok(cache) = self.cache.read() {
            if let Some(text) = cache.get(&cache_key) {
                return Ok(Fragment {
                    key: key.clone(),
                    path: path.clone(),
                    text: Arc::clone(text),
                });
            }
        }

        let text = Arc::new(fs::read_to_string(path).map_err(|e| Error::io(path, e))?);
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(cache_key, Arc::clone(&text));
        }
        Ok(Fragment {
            key: key.clone(),
            path: path.clone(),
            text,
        })
    }

    /// Stems available in a category, alphabetical.
    pub fn list(&self, category: &str) -> Vec<String> {
        self.index
            .get(category)
            .map(|stems| stems.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, key: &FragmentKey) -> bool {
        self.index
            .get(&key.category)
            .is_some_and(|stems| stems.contains_key(&key.stem()))
    }

    /// A `-start` stem signals a split fragment whose middle is filled with
    /// per-member content; the matching `-end` must exist.
    pub fn check_split(&self, key: &FragmentKey) -> Result<()> {
        let stem = key.stem();
        let Some(role) = stem.strip_suffix("-start") else {
            return Ok(());
        };
        let end = FragmentKey::new(&key.category, &format!("{role}-end"));
        if self.contains(&end) {
            Ok(())
        } else {
            Err(Error::TemplateMissing {
                key: end.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn corpus() -> (tempfile::TempDir, TemplateStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let category = dir.path().join("runtime_structure.c");
        fs::create_dir_all(&category).expect("mkdir");
        fs::write(category.join("free.c"), "/* ${library_name} */\n").expect("write");
        fs::write(category.join("read_data-start.c"), "start\n").expect("write");
        fs::write(category.join("read_data-end.c"), "end\n").expect("write");
        fs::write(category.join("notes.txt"), "ignored\n").expect("write");
        let store = TemplateStore::open(dir.path()).expect("open");
        (dir, store)
    }

    #[test]
    fn lookup_by_role_and_variant() {
        let (_dir, store) = corpus();
        let fragment = store
            .get(&FragmentKey::new("runtime_structure.c", "free"))
            .expect("free fragment");
        assert_eq!(fragment.text.as_str(), "/* ${library_name} */\n");

        let split = store
            .get(&FragmentKey::with_variant(
                "runtime_structure.c",
                "read_data",
                "start",
            ))
            .expect("split start");
        assert_eq!(split.text.as_str(), "start\n");
    }

    #[test]
    fn missing_fragment_is_reported() {
        let (_dir, store) = corpus();
        let error = store
            .get(&FragmentKey::new("runtime_structure.c", "initialize"))
            .unwrap_err();
        assert_eq!(error.exit_code(), 2);
        assert!(
            error
                .to_string()
                .contains("runtime_structure.c/initialize")
        );
    }

    #[test]
    fn list_is_alphabetical_and_skips_non_templates() {
        let (_dir, store) = corpus();
        assert_eq!(
            store.list("runtime_structure.c"),
            vec!["free", "read_data-end", "read_data-start"]
        );
    }

    #[test]
    fn split_pairing_is_enforced() {
        let (dir, store) = corpus();
        store
            .check_split(&FragmentKey::with_variant(
                "runtime_structure.c",
                "read_data",
                "start",
            ))
            .expect("paired");

        fs::remove_file(dir.path().join("runtime_structure.c/read_data-end.c"))
            .expect("remove");
        let store = TemplateStore::open(dir.path()).expect("reopen");
        assert!(
            store
                .check_split(&FragmentKey::with_variant(
                    "runtime_structure.c",
                    "read_data",
                    "start",
                ))
                .is_err()
        );
    }
}
