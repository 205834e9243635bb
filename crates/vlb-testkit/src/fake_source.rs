use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde_json::Value;
use vlb_schemas::{MatchBatch, RawMatch};
use vlb_source::{MatchListRequest, MatchSource, SourceError};

/// Scripted match source. Returns the configured payloads (newest first,
/// truncated to the requested size) unless a failure is queued.
#[derive(Debug, Default)]
pub struct FakeMatchSource {
    matches: Mutex<Vec<Value>>,
    failures: Mutex<VecDeque<SourceError>>,
    calls: AtomicUsize,
    last_request: Mutex<Option<MatchListRequest>>,
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match m.lock() {
        Ok(g) => g,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl FakeMatchSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_matches(matches: Vec<Value>) -> Self {
        let s = Self::new();
        s.set_matches(matches);
        s
    }

    pub fn set_matches(&self, matches: Vec<Value>) {
        *lock(&self.matches) = matches;
    }

    /// Queue one failure; each fetch consumes at most one.
    pub fn fail_next(&self, err: SourceError) {
        lock(&self.failures).push_back(err);
    }

    pub fn fetch_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<MatchListRequest> {
        lock(&self.last_request).clone()
    }
}

#[async_trait::async_trait]
impl MatchSource for FakeMatchSource {
    fn source_name(&self) -> &'static str {
        "fake"
    }

    async fn fetch_match_list(&self, req: &MatchListRequest) -> Result<MatchBatch, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last_request) = Some(req.clone());
        if let Some(err) = lock(&self.failures).pop_front() {
            return Err(err);
        }
        let matches = lock(&self.matches)
            .iter()
            .take(req.size as usize)
            .cloned()
            .map(RawMatch::from_value)
            .collect();
        Ok(MatchBatch { matches })
    }
}
