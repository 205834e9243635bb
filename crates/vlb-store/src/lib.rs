//! vlb-store
//!
//! Path-addressed, versioned document store.
//!
//! Contract:
//! - `get` returns the content and its version, or `None` when absent.
//! - `put` is conditional. Creating a path passes no version; replacing one
//!   passes the version from the immediately preceding read. A mismatch
//!   (including "no version but the path exists") is [`StoreError::Conflict`].
//! - `list_dir` returns direct children, or `None` when the directory is absent.
//!
//! There are no multi-document transactions. Ordering between documents is
//! the caller's responsibility.

mod error;
mod github;
mod memory;

pub use error::StoreError;
pub use github::{GitHubContentsStore, RateLimit, RepoProbe};
pub use memory::MemoryStore;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A stored document and the version it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub content: String,
    pub version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Other,
}

impl EntryKind {
    pub fn parse(s: &str) -> Self {
        match s {
            "file" => EntryKind::File,
            "dir" => EntryKind::Dir,
            _ => EntryKind::Other,
        }
    }
}

/// One child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    /// Full path from the store root.
    pub path: String,
    pub kind: EntryKind,
}

#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    fn store_name(&self) -> &'static str;

    async fn get(&self, path: &str) -> Result<Option<Document>, StoreError>;

    /// Returns the new version.
    async fn put(
        &self,
        path: &str,
        content: &str,
        expected_version: Option<&str>,
        message: &str,
    ) -> Result<String, StoreError>;

    async fn list_dir(&self, path: &str) -> Result<Option<Vec<DirEntry>>, StoreError>;
}

// ---------------------------------------------------------------------------
// JSON helpers
// ---------------------------------------------------------------------------

/// A parsed JSON document plus the version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub value: T,
    pub version: String,
}

/// Pretty-printed with 4-space indentation, the stored document convention.
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, StoreError> {
    let mut buf = Vec::new();
    let fmt = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, fmt);
    value
        .serialize(&mut ser)
        .map_err(|e| StoreError::Decode(format!("json encode failed: {e}")))?;
    String::from_utf8(buf).map_err(|e| StoreError::Decode(format!("json encode produced non-utf8: {e}")))
}

/// Parse a document body. Blank bodies are a decode error.
pub fn parse_json<T: DeserializeOwned>(path: &str, content: &str) -> Result<T, StoreError> {
    if content.trim().is_empty() {
        return Err(StoreError::Decode(format!("'{path}' has an empty body")));
    }
    serde_json::from_str(content)
        .map_err(|e| StoreError::Decode(format!("'{path}' is not valid json: {e}")))
}

/// `get` + [`parse_json`].
pub async fn read_json<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    path: &str,
) -> Result<Option<Versioned<T>>, StoreError> {
    match store.get(path).await? {
        None => Ok(None),
        Some(doc) => Ok(Some(Versioned {
            value: parse_json(path, &doc.content)?,
            version: doc.version,
        })),
    }
}

/// [`to_pretty_json`] + conditional `put`.
pub async fn write_json<T: Serialize>(
    store: &dyn DocumentStore,
    path: &str,
    value: &T,
    expected_version: Option<&str>,
    message: &str,
) -> Result<String, StoreError> {
    let body = to_pretty_json(value)?;
    store.put(path, &body, expected_version, message).await
}

pub const DIR_MARKER_NAME: &str = "README.md";

/// Make `dir` exist by writing a marker file when the listing is absent.
/// Returns `true` when the marker was written.
pub async fn ensure_dir(store: &dyn DocumentStore, dir: &str) -> Result<bool, StoreError> {
    if store.list_dir(dir).await?.is_some() {
        return Ok(false);
    }
    let marker = format!("{}/{}", dir.trim_end_matches('/'), DIR_MARKER_NAME);
    match store
        .put(
            &marker,
            "Stored match records, one JSON file per match.\n",
            None,
            "Create match directory",
        )
        .await
    {
        Ok(_) => Ok(true),
        // Somebody else created it between the listing and the write.
        Err(StoreError::Conflict { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Match record files of a listing: `.json` files, marker excluded.
pub fn json_files(entries: &[DirEntry]) -> Vec<&DirEntry> {
    entries
        .iter()
        .filter(|e| e.kind == EntryKind::File)
        .filter(|e| e.name != DIR_MARKER_NAME && e.name.ends_with(".json"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pretty_json_uses_four_spaces() {
        let s = to_pretty_json(&json!({ "players": [] , "newestMatchID": null })).unwrap();
        assert!(s.contains("\n    \"newestMatchID\": null"));
        assert!(!s.ends_with('\n'));
    }

    #[test]
    fn empty_body_is_decode_error() {
        let err = parse_json::<serde_json::Value>("src/user.json", "  \n").unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
        assert!(err.to_string().contains("empty body"));
    }

    #[test]
    fn json_files_skip_marker_and_dirs() {
        let entries = vec![
            DirEntry { name: "a.json".into(), path: "m/a.json".into(), kind: EntryKind::File },
            DirEntry { name: "README.md".into(), path: "m/README.md".into(), kind: EntryKind::File },
            DirEntry { name: "old".into(), path: "m/old".into(), kind: EntryKind::Dir },
            DirEntry { name: "notes.txt".into(), path: "m/notes.txt".into(), kind: EntryKind::File },
        ];
        let files: Vec<_> = json_files(&entries).into_iter().map(|e| e.name.as_str()).collect();
        assert_eq!(files, vec!["a.json"]);
    }

    #[tokio::test]
    async fn ensure_dir_writes_marker_once() {
        let store = MemoryStore::new();
        assert!(ensure_dir(&store, "src/match").await.unwrap());
        assert!(!ensure_dir(&store, "src/match").await.unwrap());
        assert!(store.contains("src/match/README.md"));
    }

    #[tokio::test]
    async fn read_and_write_json_roundtrip_versions() {
        let store = MemoryStore::new();
        let v1 = write_json(&store, "doc.json", &json!({ "a": 1 }), None, "create")
            .await
            .unwrap();
        let read: Versioned<serde_json::Value> =
            read_json(&store, "doc.json").await.unwrap().unwrap();
        assert_eq!(read.version, v1);
        assert_eq!(read.value, json!({ "a": 1 }));
        assert!(read_json::<serde_json::Value>(&store, "missing.json")
            .await
            .unwrap()
            .is_none());
    }
}
