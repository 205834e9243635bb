use std::time::Duration;

use serde_json::Value;
use vlb_schemas::MatchBatch;

use crate::{batch_from_body, http_client, read_json, MatchListRequest, MatchSource, SourceError};

/// Direct upstream client: `GET {base}/valorant/v3/matches/{region}/{name}/{tag}`.
///
/// The key travels in the `Authorization` header. Do not log it.
#[derive(Clone)]
pub struct HenrikMatchSource {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
}

impl std::fmt::Debug for HenrikMatchSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HenrikMatchSource")
            .field("api_key", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl HenrikMatchSource {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, SourceError> {
        Self::new_with_base_url(api_key, "https://api.henrikdev.xyz".to_string(), timeout)
    }

    pub fn new_with_base_url(
        api_key: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        if api_key.trim().is_empty() {
            return Err(SourceError::Config("provider api key is empty".to_string()));
        }
        Ok(Self {
            api_key,
            http: http_client(timeout)?,
            base_url,
        })
    }

    /// Path segments are percent-encoded, so names with spaces or `#` are safe.
    fn build_matches_url(&self, req: &MatchListRequest) -> Result<reqwest::Url, SourceError> {
        let mut url = reqwest::Url::parse(self.base_url.trim_end_matches('/'))
            .map_err(|e| SourceError::Config(format!("invalid upstream base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| SourceError::Config("upstream base url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend([
                "valorant",
                "v3",
                "matches",
                req.region.as_str(),
                req.name.as_str(),
                req.tag.as_str(),
            ]);
        Ok(url)
    }

    /// Upstream body as-is. Used by the proxy endpoint to pass the payload through.
    pub async fn fetch_raw(&self, req: &MatchListRequest) -> Result<Value, SourceError> {
        req.validate()?;
        let url = self.build_matches_url(req)?;
        let size = req.size.to_string();
        let resp = self
            .http
            .get(url)
            .header(reqwest::header::AUTHORIZATION, self.api_key.as_str())
            .query(&[("mode", req.mode.as_str()), ("size", size.as_str())])
            .send()
            .await
            .map_err(SourceError::from_reqwest)?;
        read_json(resp).await
    }
}

#[async_trait::async_trait]
impl MatchSource for HenrikMatchSource {
    fn source_name(&self) -> &'static str {
        "henrik"
    }

    async fn fetch_match_list(&self, req: &MatchListRequest) -> Result<MatchBatch, SourceError> {
        let body = self.fetch_raw(req).await?;
        let batch = batch_from_body(&body)?;
        tracing::debug!(source = "henrik", matches = batch.len(), "match list fetched");
        Ok(batch)
    }
}
