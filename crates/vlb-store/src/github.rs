use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use vlb_config::StoreConfig;

use crate::{DirEntry, Document, DocumentStore, EntryKind, StoreError};

const USER_AGENT: &str = "vlb-tracker";

/// GitHub contents API as a document store.
///
/// - read:  `GET  /repos/{repo}/contents/{path}?ref={branch}` -> `{content: base64, sha}`
/// - write: `PUT  /repos/{repo}/contents/{path}` with `{message, content, sha?, branch}`
/// - list:  `GET  /repos/{repo}/contents/{dir}?ref={branch}` -> `[{name, path, type}]`
///
/// The blob `sha` is the version. GitHub answers a stale or missing `sha`
/// with 409 or 422; both become [`StoreError::Conflict`].
#[derive(Clone)]
pub struct GitHubContentsStore {
    http: reqwest::Client,
    api_base: String,
    repo: String,
    branch: String,
    token: String,
}

impl std::fmt::Debug for GitHubContentsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubContentsStore")
            .field("api_base", &self.api_base)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("token", &"<REDACTED>")
            .finish()
    }
}

/// `GET /rate_limit` core bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    pub limit: u64,
    pub remaining: u64,
    /// Reset time, UTC epoch seconds.
    pub reset: i64,
}

/// Result of probing repository access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoProbe {
    pub full_name: String,
    pub private: bool,
    pub can_push: bool,
    pub default_branch: String,
}

#[derive(Debug, Deserialize)]
struct ContentFile {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ContentEntry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Serialize)]
struct PutBody<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    content: PutContent,
}

#[derive(Debug, Deserialize)]
struct PutContent {
    sha: String,
}

impl GitHubContentsStore {
    pub fn new(
        repo: String,
        branch: String,
        token: String,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        Self::new_with_base_url(repo, branch, token, "https://api.github.com".to_string(), timeout)
    }

    pub fn new_with_base_url(
        repo: String,
        branch: String,
        token: String,
        api_base: String,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        if token.trim().is_empty() {
            return Err(StoreError::Auth("document store token is empty".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| StoreError::Transport(format!("http client build failed: {e}")))?;
        Ok(Self {
            http,
            api_base,
            repo,
            branch,
            token,
        })
    }

    pub fn from_config(
        cfg: &StoreConfig,
        token: String,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        Self::new_with_base_url(
            cfg.repo.clone(),
            cfg.branch.clone(),
            token,
            cfg.api_base.clone(),
            timeout,
        )
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// `{base}/{segments...}`, each segment percent-encoded.
    fn url<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<reqwest::Url, StoreError> {
        let mut url = reqwest::Url::parse(self.api_base.trim_end_matches('/'))
            .map_err(|e| StoreError::Transport(format!("invalid api base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::Transport("api base url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments.into_iter().filter(|s| !s.is_empty()));
        Ok(url)
    }

    fn contents_url(&self, path: &str) -> Result<reqwest::Url, StoreError> {
        let mut segments = vec!["repos"];
        segments.extend(self.repo.split('/'));
        segments.push("contents");
        segments.extend(path.split('/'));
        self.url(segments)
    }

    fn request(&self, method: reqwest::Method, url: reqwest::Url) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
    }

    /// Send and return `(status, body)`; transport failures are mapped here.
    async fn send(&self, req: reqwest::RequestBuilder) -> Result<(u16, String), StoreError> {
        let resp = req.send().await.map_err(StoreError::from_reqwest)?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(StoreError::from_reqwest)?;
        Ok((status, body))
    }

    /// Map a non-success status. 404 is handled by callers that treat it as absence.
    fn status_error(path: &str, status: u16, body: &str) -> StoreError {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| body.trim().chars().take(200).collect());
        match status {
            401 => StoreError::Auth(message),
            // GitHub signals primary and secondary rate limits with 403 too.
            403 if message.to_ascii_lowercase().contains("rate limit") => StoreError::Api {
                status: 429,
                message,
            },
            403 => StoreError::Auth(message),
            404 => StoreError::NotFound {
                path: path.to_string(),
            },
            409 | 422 => StoreError::Conflict {
                path: path.to_string(),
            },
            _ => StoreError::Api { status, message },
        }
    }

    /// `GET /rate_limit`, core bucket.
    pub async fn rate_limit(&self) -> Result<RateLimit, StoreError> {
        let url = self.url(["rate_limit"])?;
        let (status, body) = self.send(self.request(reqwest::Method::GET, url)).await?;
        if !(200..300).contains(&status) {
            return Err(Self::status_error("rate_limit", status, &body));
        }
        let v: Value = serde_json::from_str(&body)
            .map_err(|e| StoreError::Decode(format!("rate_limit is not json: {e}")))?;
        let core = v
            .pointer("/resources/core")
            .or_else(|| v.get("rate"))
            .ok_or_else(|| StoreError::Decode("rate_limit has no core bucket".to_string()))?;
        serde_json::from_value(core.clone())
            .map_err(|e| StoreError::Decode(format!("rate_limit core bucket: {e}")))
    }

    /// `GET /repos/{repo}`: does the token see the repository, and may it push?
    pub async fn probe_repo(&self) -> Result<RepoProbe, StoreError> {
        let mut segments = vec!["repos"];
        segments.extend(self.repo.split('/'));
        let url = self.url(segments)?;
        let (status, body) = self.send(self.request(reqwest::Method::GET, url)).await?;
        if !(200..300).contains(&status) {
            return Err(Self::status_error(&self.repo, status, &body));
        }
        let v: Value = serde_json::from_str(&body)
            .map_err(|e| StoreError::Decode(format!("repo probe is not json: {e}")))?;
        Ok(RepoProbe {
            full_name: v
                .get("full_name")
                .and_then(Value::as_str)
                .unwrap_or(&self.repo)
                .to_string(),
            private: v.get("private").and_then(Value::as_bool).unwrap_or(false),
            can_push: v
                .pointer("/permissions/push")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            default_branch: v
                .get("default_branch")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }
}

/// Contents are base64 with embedded line breaks.
fn decode_content(path: &str, encoded: &str) -> Result<String, StoreError> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64
        .decode(compact.as_bytes())
        .map_err(|e| StoreError::Decode(format!("'{path}' content is not base64: {e}")))?;
    String::from_utf8(bytes).map_err(|e| StoreError::Decode(format!("'{path}' is not utf-8: {e}")))
}

#[async_trait::async_trait]
impl DocumentStore for GitHubContentsStore {
    fn store_name(&self) -> &'static str {
        "github"
    }

    async fn get(&self, path: &str) -> Result<Option<Document>, StoreError> {
        let url = self.contents_url(path)?;
        let req = self
            .request(reqwest::Method::GET, url)
            .query(&[("ref", self.branch.as_str())]);
        let (status, body) = self.send(req).await?;
        if status == 404 {
            return Ok(None);
        }
        if !(200..300).contains(&status) {
            return Err(Self::status_error(path, status, &body));
        }
        let v: Value = serde_json::from_str(&body)
            .map_err(|e| StoreError::Decode(format!("'{path}' metadata is not json: {e}")))?;
        if v.is_array() {
            return Err(StoreError::Decode(format!("'{path}' is a directory")));
        }
        let file: ContentFile = serde_json::from_value(v)
            .map_err(|e| StoreError::Decode(format!("'{path}' metadata: {e}")))?;
        let content = match (file.content.as_deref(), file.encoding.as_deref()) {
            (Some(c), Some("base64")) | (Some(c), None) => decode_content(path, c)?,
            (_, Some(other)) if other != "base64" => {
                return Err(StoreError::Decode(format!(
                    "'{path}' has unsupported encoding '{other}'"
                )))
            }
            _ => String::new(),
        };
        tracing::trace!(path, version = %file.sha, "document read");
        Ok(Some(Document {
            content,
            version: file.sha,
        }))
    }

    async fn put(
        &self,
        path: &str,
        content: &str,
        expected_version: Option<&str>,
        message: &str,
    ) -> Result<String, StoreError> {
        let url = self.contents_url(path)?;
        let body = PutBody {
            message,
            content: BASE64.encode(content.as_bytes()),
            branch: &self.branch,
            sha: expected_version,
        };
        let req = self.request(reqwest::Method::PUT, url).json(&body);
        let (status, text) = self.send(req).await?;
        if !(200..300).contains(&status) {
            // A versioned write to a path that vanished reports 404; from the
            // writer's side that is the same stale-read situation.
            if status == 404 && expected_version.is_some() {
                return Err(StoreError::Conflict {
                    path: path.to_string(),
                });
            }
            return Err(Self::status_error(path, status, &text));
        }
        let resp: PutResponse = serde_json::from_str(&text)
            .map_err(|e| StoreError::Decode(format!("'{path}' write response: {e}")))?;
        tracing::debug!(path, version = %resp.content.sha, "document written");
        Ok(resp.content.sha)
    }

    async fn list_dir(&self, path: &str) -> Result<Option<Vec<DirEntry>>, StoreError> {
        let url = self.contents_url(path)?;
        let req = self
            .request(reqwest::Method::GET, url)
            .query(&[("ref", self.branch.as_str())]);
        let (status, body) = self.send(req).await?;
        if status == 404 {
            return Ok(None);
        }
        if !(200..300).contains(&status) {
            return Err(Self::status_error(path, status, &body));
        }
        let entries: Vec<ContentEntry> = serde_json::from_str(&body)
            .map_err(|e| StoreError::Decode(format!("'{path}' is not a directory listing: {e}")))?;
        Ok(Some(
            entries
                .into_iter()
                .map(|e| DirEntry {
                    kind: EntryKind::parse(&e.kind),
                    name: e.name,
                    path: e.path,
                })
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(base: &str) -> GitHubContentsStore {
        GitHubContentsStore::new_with_base_url(
            "group/tracker".into(),
            "main".into(),
            "ghp_testtoken".into(),
            base.into(),
            Duration::from_secs(1),
        )
        .unwrap()
    }

    #[test]
    fn contents_url_encodes_each_segment() {
        let s = store("https://api.example.test");
        let url = s.contents_url("src/match/a b.json").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.test/repos/group/tracker/contents/src/match/a%20b.json"
        );
    }

    #[test]
    fn decode_strips_line_breaks() {
        let encoded = "eyJwbGF5\nZXJzIjpbXX0=\n";
        assert_eq!(decode_content("x", encoded).unwrap(), r#"{"players":[]}"#);
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            GitHubContentsStore::status_error("p", 422, r#"{"message":"sha wasn't supplied"}"#),
            StoreError::Conflict { .. }
        ));
        assert!(matches!(
            GitHubContentsStore::status_error("p", 401, r#"{"message":"Bad credentials"}"#),
            StoreError::Auth(_)
        ));
        let limited = GitHubContentsStore::status_error(
            "p",
            403,
            r#"{"message":"API rate limit exceeded for user"}"#,
        );
        assert!(limited.is_transient());
    }

    #[test]
    fn debug_redacts_token() {
        let s = store("https://api.example.test");
        assert!(!format!("{s:?}").contains("ghp_testtoken"));
    }
}
