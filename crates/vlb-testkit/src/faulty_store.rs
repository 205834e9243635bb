use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

use vlb_store::{DirEntry, Document, DocumentStore, MemoryStore, StoreError};

/// [`MemoryStore`] with fault injection.
///
/// - `crash_after_puts(n)`: after `n` more successful writes every write
///   fails with a transport error, as if the process lost its connection.
/// - `fail_put_on(path, err)`: writes to `path` fail with `err`.
/// - `concurrent_write_on(path, content)`: the next write to `path` is
///   preceded by another writer replacing it, so a versioned write conflicts.
/// - `fail_next_get(err)`: the next read fails with `err`.
///
/// Clones share the store and the fault table.
#[derive(Debug, Clone, Default)]
pub struct FaultyStore {
    inner: MemoryStore,
    faults: Arc<Mutex<Faults>>,
}

#[derive(Debug, Default)]
struct Faults {
    puts_before_crash: Option<usize>,
    fail_put_paths: BTreeMap<String, StoreError>,
    concurrent_writes: BTreeMap<String, String>,
    get_failures: VecDeque<StoreError>,
    put_log: Vec<String>,
}

impl FaultyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            faults: Arc::default(),
        }
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    fn faults(&self) -> std::sync::MutexGuard<'_, Faults> {
        match self.faults.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn crash_after_puts(&self, n: usize) {
        self.faults().puts_before_crash = Some(n);
    }

    pub fn fail_put_on(&self, path: &str, err: StoreError) {
        self.faults().fail_put_paths.insert(path.to_string(), err);
    }

    pub fn concurrent_write_on(&self, path: &str, content: &str) {
        self.faults()
            .concurrent_writes
            .insert(path.to_string(), content.to_string());
    }

    pub fn fail_next_get(&self, err: StoreError) {
        self.faults().get_failures.push_back(err);
    }

    pub fn clear_faults(&self) {
        let mut f = self.faults();
        f.puts_before_crash = None;
        f.fail_put_paths.clear();
        f.concurrent_writes.clear();
        f.get_failures.clear();
    }

    /// Paths of successful writes, in order.
    pub fn put_log(&self) -> Vec<String> {
        self.faults().put_log.clone()
    }
}

#[async_trait::async_trait]
impl DocumentStore for FaultyStore {
    fn store_name(&self) -> &'static str {
        "faulty-memory"
    }

    async fn get(&self, path: &str) -> Result<Option<Document>, StoreError> {
        let injected = self.faults().get_failures.pop_front();
        if let Some(err) = injected {
            return Err(err);
        }
        self.inner.get(path).await
    }

    async fn put(
        &self,
        path: &str,
        content: &str,
        expected_version: Option<&str>,
        message: &str,
    ) -> Result<String, StoreError> {
        {
            let mut f = self.faults();
            if let Some(err) = f.fail_put_paths.get(path) {
                return Err(err.clone());
            }
            match f.puts_before_crash.as_mut() {
                Some(0) => return Err(StoreError::Transport("simulated crash".to_string())),
                Some(n) => *n -= 1,
                None => {}
            }
            if let Some(theirs) = f.concurrent_writes.remove(path) {
                self.inner.insert(path, theirs);
            }
        }
        let version = self.inner.put(path, content, expected_version, message).await?;
        self.faults().put_log.push(path.to_string());
        Ok(version)
    }

    async fn list_dir(&self, path: &str) -> Result<Option<Vec<DirEntry>>, StoreError> {
        self.inner.list_dir(path).await
    }
}
