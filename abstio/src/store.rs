use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Somewhere to put JSON documents by key.
pub trait BlobStore {
    fn put(&mut self, key: &str, bytes: Vec<u8>) -> Result<()>;
    fn get(&self, key: &str) -> Result<Vec<u8>>;
    fn exists(&self, key: &str) -> bool;
    /// All keys starting with a prefix, sorted.
    fn list(&self, prefix: &str) -> Vec<String>;
}

pub fn write_json<T: Serialize>(store: &mut dyn BlobStore, key: &str, obj: &T) -> Result<()> {
    let raw = abstutil::to_json_terse(obj)?;
    store.put(key, raw.into_bytes())?;
    info!("Wrote {}", key);
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(store: &dyn BlobStore, key: &str) -> Result<T> {
    let raw = store.get(key)?;
    abstutil::from_json(&raw).with_context(|| format!("reading {}", key))
}

/// Blobs as files under a root directory; keys become relative paths.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> FileStore {
        FileStore { root: root.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl BlobStore for FileStore {
    fn put(&mut self, key: &str, bytes: Vec<u8>) -> Result<()> {
        let path = self.path(key);
        if let Some(parent) = path.parent() {
            fs_err::create_dir_all(parent)?;
        }
        fs_err::write(&path, bytes)?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>> {
        let bytes = fs_err::read(self.path(key)).with_context(|| format!("no blob {}", key))?;
        Ok(bytes)
    }

    fn exists(&self, key: &str) -> bool {
        self.path(key).exists()
    }

    fn list(&self, prefix: &str) -> Vec<String> {
        let mut results = Vec::new();
        let mut queue = vec![self.root.clone()];
        while let Some(dir) = queue.pop() {
            let entries = match fs_err::read_dir(&dir) {
                Ok(entries) => entries,
                Err(err) => {
                    debug!("Can't list {}: {}", dir.display(), err);
                    continue;
                }
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    queue.push(path);
                } else if let Ok(rel) = path.strip_prefix(&self.root) {
                    let key = rel.to_string_lossy().replace('\\', "/");
                    if key.starts_with(prefix) {
                        results.push(key);
                    }
                }
            }
        }
        results.sort();
        results
    }
}

/// Keeps everything in memory. Used by tests and single-process batch runs.
#[derive(Default)]
pub struct MemoryStore {
    blobs: BTreeMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }
}

impl BlobStore for MemoryStore {
    fn put(&mut self, key: &str, bytes: Vec<u8>) -> Result<()> {
        self.blobs.insert(key.to_string(), bytes);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.blobs
            .get(key)
            .cloned()
            .with_context(|| format!("no blob {}", key))
    }

    fn exists(&self, key: &str) -> bool {
        self.blobs.contains_key(key)
    }

    fn list(&self, prefix: &str) -> Vec<String> {
        self.blobs
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use serde::Deserialize;

    use super::*;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Doc {
        names: BTreeSet<String>,
    }

    fn exercise(store: &mut dyn BlobStore) {
        let doc = Doc {
            names: vec!["B".to_string(), "A".to_string()].into_iter().collect(),
        };
        write_json(store, "USA/CA/Test/A-x-B.json", &doc).unwrap();
        assert!(store.exists("USA/CA/Test/A-x-B.json"));
        assert!(!store.exists("USA/CA/Test/A-x-C.json"));
        let back: Doc = read_json(store, "USA/CA/Test/A-x-B.json").unwrap();
        assert_eq!(doc, back);
        assert_eq!(store.list("USA/CA"), vec!["USA/CA/Test/A-x-B.json".to_string()]);
        assert!(read_json::<Doc>(store, "missing.json").is_err());
    }

    #[test]
    fn memory_store() {
        exercise(&mut MemoryStore::new());
    }

    #[test]
    fn file_store() {
        let root = std::env::temp_dir().join(format!("abstio_test_{}", std::process::id()));
        exercise(&mut FileStore::new(&root));
        fs_err::remove_dir_all(&root).unwrap();
    }
}
