use std::time::Duration;

use vlb_schemas::MatchBatch;

use crate::{batch_from_body, http_client, read_json, MatchListRequest, MatchSource, SourceError};

/// Queries the indirection endpoint: `GET <url>?name&tag&region&mode&size`.
///
/// The endpoint injects the provider key, so this transport carries none.
#[derive(Debug, Clone)]
pub struct ProxyMatchSource {
    http: reqwest::Client,
    url: String,
}

impl ProxyMatchSource {
    pub fn new(url: String, timeout: Duration) -> Result<Self, SourceError> {
        if url.trim().is_empty() {
            return Err(SourceError::Config("proxy url is empty".to_string()));
        }
        Ok(Self {
            http: http_client(timeout)?,
            url,
        })
    }
}

#[async_trait::async_trait]
impl MatchSource for ProxyMatchSource {
    fn source_name(&self) -> &'static str {
        "proxy"
    }

    async fn fetch_match_list(&self, req: &MatchListRequest) -> Result<MatchBatch, SourceError> {
        req.validate()?;
        let size = req.size.to_string();
        let resp = self
            .http
            .get(&self.url)
            .query(&[
                ("name", req.name.as_str()),
                ("tag", req.tag.as_str()),
                ("region", req.region.as_str()),
                ("mode", req.mode.as_str()),
                ("size", size.as_str()),
            ])
            .send()
            .await
            .map_err(SourceError::from_reqwest)?;

        let body = read_json(resp).await?;
        let batch = batch_from_body(&body)?;
        tracing::debug!(source = "proxy", matches = batch.len(), "match list fetched");
        Ok(batch)
    }
}
