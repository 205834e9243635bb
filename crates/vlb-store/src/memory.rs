use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use sha2::{Digest, Sha256};

use crate::{DirEntry, Document, DocumentStore, EntryKind, StoreError};

/// In-process store with the same conditional-write semantics as the
/// contents API. Versions are the SHA-256 of the content.
///
/// Cloning shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    docs: Arc<Mutex<BTreeMap<String, String>>>,
}

fn version_of(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

fn normalize(path: &str) -> &str {
    path.trim_matches('/')
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        // A poisoned map is still consistent: every mutation is a single insert/remove.
        match self.docs.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Unconditional write, bypassing version checks. For seeding fixtures.
    pub fn insert(&self, path: &str, content: impl Into<String>) -> String {
        let content = content.into();
        let v = version_of(&content);
        self.lock().insert(normalize(path).to_string(), content);
        v
    }

    pub fn remove(&self, path: &str) -> bool {
        self.lock().remove(normalize(path)).is_some()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.lock().contains_key(normalize(path))
    }

    pub fn content(&self, path: &str) -> Option<String> {
        self.lock().get(normalize(path)).cloned()
    }

    pub fn paths(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Paths directly under `dir`.
    pub fn files_in(&self, dir: &str) -> Vec<String> {
        let prefix = format!("{}/", normalize(dir));
        self.lock()
            .keys()
            .filter(|p| p.starts_with(&prefix) && !p[prefix.len()..].contains('/'))
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    fn store_name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, path: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.lock().get(normalize(path)).map(|content| Document {
            content: content.clone(),
            version: version_of(content),
        }))
    }

    async fn put(
        &self,
        path: &str,
        content: &str,
        expected_version: Option<&str>,
        _message: &str,
    ) -> Result<String, StoreError> {
        let key = normalize(path).to_string();
        let mut docs = self.lock();
        let current = docs.get(&key).map(|c| version_of(c));
        match (current.as_deref(), expected_version) {
            (None, None) => {}
            (Some(cur), Some(exp)) if cur == exp => {}
            _ => return Err(StoreError::Conflict { path: key }),
        }
        let v = version_of(content);
        docs.insert(key, content.to_string());
        Ok(v)
    }

    async fn list_dir(&self, path: &str) -> Result<Option<Vec<DirEntry>>, StoreError> {
        let dir = normalize(path);
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{dir}/")
        };
        let docs = self.lock();
        let mut files = Vec::new();
        let mut subdirs = BTreeSet::new();
        for key in docs.keys().filter(|k| k.starts_with(&prefix)) {
            let rest = &key[prefix.len()..];
            match rest.split_once('/') {
                Some((sub, _)) => {
                    subdirs.insert(sub.to_string());
                }
                None => files.push(DirEntry {
                    name: rest.to_string(),
                    path: key.clone(),
                    kind: EntryKind::File,
                }),
            }
        }
        if files.is_empty() && subdirs.is_empty() {
            return Ok(None);
        }
        let mut out: Vec<DirEntry> = subdirs
            .into_iter()
            .map(|name| DirEntry {
                path: format!("{prefix}{name}"),
                name,
                kind: EntryKind::Dir,
            })
            .collect();
        out.extend(files);
        Ok(Some(out))
    }
}
