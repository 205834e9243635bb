use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};
use vlb_config::{RetryConfig, StoreConfig};
use vlb_schemas::MatchRecord;
use vlb_store::{json_files, parse_json, DocumentStore, StoreError};

use crate::retry::with_retry;

/// The stored corpus plus the paths that could not be parsed.
#[derive(Debug, Clone, Default)]
pub struct CorpusLoad {
    pub records: Vec<MatchRecord>,
    pub skipped: Vec<String>,
}

/// Read every match record under `match_dir`.
///
/// Reads are sequential and paced by `read_pacing_ms`. A file that vanished
/// between listing and read is skipped silently; a file that does not parse
/// is skipped with a warning. Transport and auth failures abort.
pub async fn load_corpus(
    store: &dyn DocumentStore,
    cfg: &StoreConfig,
    retry: &RetryConfig,
) -> Result<CorpusLoad, StoreError> {
    let dir = cfg.match_dir.as_str();
    let Some(entries) = with_retry(retry, "list match directory", move || store.list_dir(dir)).await?
    else {
        debug!(dir, "match directory absent, corpus is empty");
        return Ok(CorpusLoad::default());
    };

    let pacing = Duration::from_millis(cfg.read_pacing_ms);
    let mut out = CorpusLoad::default();
    for (i, entry) in json_files(&entries).into_iter().enumerate() {
        if i > 0 && !pacing.is_zero() {
            sleep(pacing).await;
        }
        let path = entry.path.as_str();
        let Some(doc) = with_retry(retry, "read match record", move || store.get(path)).await? else {
            debug!(path, "match record listed but not readable yet");
            continue;
        };
        match parse_json::<MatchRecord>(path, &doc.content) {
            Ok(record) => out.records.push(record),
            Err(e) => {
                warn!(path, error = %e, "skipping malformed match record");
                out.skipped.push(entry.path.clone());
            }
        }
    }
    info!(records = out.records.len(), skipped = out.skipped.len(), "corpus loaded");
    Ok(out)
}
