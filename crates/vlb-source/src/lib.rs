//! vlb-source
//!
//! Remote match source: recent matches for one identity, newest first.
//!
//! Two transports share the [`MatchSource`] contract:
//! - [`ProxyMatchSource`] queries the server-side indirection endpoint and
//!   never holds the provider key.
//! - [`HenrikMatchSource`] calls the upstream provider directly, injecting
//!   the key. The daemon's proxy endpoint is built on it.
//!
//! Every call has a bounded timeout. This crate does no retrying; callers
//! decide via [`SourceError::is_transient`].

mod error;
mod henrik;
mod proxy;

pub use error::SourceError;
pub use henrik::HenrikMatchSource;
pub use proxy::ProxyMatchSource;

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use vlb_config::secrets::ResolvedSecrets;
use vlb_config::{SourceConfig, SourceTransport, TrackerConfig};
use vlb_schemas::MatchBatch;

/// Which identity's history to scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchListRequest {
    pub name: String,
    pub tag: String,
    pub region: String,
    pub mode: String,
    pub size: u32,
}

impl MatchListRequest {
    pub fn from_config(cfg: &SourceConfig) -> Self {
        Self {
            name: cfg.name.clone(),
            tag: cfg.tag.clone(),
            region: cfg.region.clone(),
            mode: cfg.mode.clone(),
            size: cfg.size,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), SourceError> {
        if self.name.trim().is_empty() || self.tag.trim().is_empty() {
            return Err(SourceError::Config(
                "identity name and tag are required".to_string(),
            ));
        }
        if self.region.trim().is_empty() {
            return Err(SourceError::Config("region is required".to_string()));
        }
        Ok(())
    }
}

/// Remote match source contract.
#[async_trait::async_trait]
pub trait MatchSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    /// Latest batch for `req`, newest first. A response without a `data`
    /// array is a [`SourceError::Decode`]; malformed entries inside it are
    /// kept and default to empty at the view layer.
    async fn fetch_match_list(&self, req: &MatchListRequest) -> Result<MatchBatch, SourceError>;
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, SourceError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| SourceError::Config(format!("http client build failed: {e}")))
}

/// Read a success body as JSON or map the status to a typed error.
pub(crate) async fn read_json(resp: reqwest::Response) -> Result<Value, SourceError> {
    let status = resp.status();
    let text = resp.text().await.map_err(SourceError::from_reqwest)?;
    if !status.is_success() {
        return Err(SourceError::from_status(status.as_u16(), &text));
    }
    serde_json::from_str(&text)
        .map_err(|e| SourceError::Decode(format!("response is not json: {e}")))
}

pub(crate) fn batch_from_body(body: &Value) -> Result<MatchBatch, SourceError> {
    MatchBatch::from_response(body)
        .ok_or_else(|| SourceError::Decode("response has no `data` array".to_string()))
}

/// Build the configured transport.
pub fn build_match_source(
    cfg: &TrackerConfig,
    secrets: &ResolvedSecrets,
) -> Result<Arc<dyn MatchSource>, SourceError> {
    let timeout = Duration::from_millis(cfg.engine.request_timeout_ms);
    match cfg.source.transport {
        SourceTransport::Proxy => Ok(Arc::new(ProxyMatchSource::new(
            cfg.source.proxy_url.clone(),
            timeout,
        )?)),
        SourceTransport::Direct => {
            let key = secrets.source_api_key.clone().ok_or_else(|| {
                SourceError::Config(format!(
                    "direct transport needs env var '{}'",
                    cfg.source.api_key_env
                ))
            })?;
            Ok(Arc::new(HenrikMatchSource::new_with_base_url(
                key,
                cfg.source.upstream_base.clone(),
                timeout,
            )?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req() -> MatchListRequest {
        MatchListRequest::from_config(&SourceConfig {
            name: "SuperLulino".into(),
            tag: "4088".into(),
            ..Default::default()
        })
    }

    #[test]
    fn request_takes_config_defaults() {
        let r = req();
        assert_eq!(r.region, "eu");
        assert_eq!(r.mode, "custom");
        assert_eq!(r.size, 20);
        assert!(r.validate().is_ok());
    }

    #[test]
    fn blank_identity_is_config_error() {
        let mut r = req();
        r.tag = " ".into();
        assert!(matches!(r.validate(), Err(SourceError::Config(_))));
    }

    #[test]
    fn direct_transport_without_key_fails() {
        let mut cfg = TrackerConfig::default();
        cfg.source.transport = SourceTransport::Direct;
        let err = build_match_source(&cfg, &ResolvedSecrets::default())
            .err()
            .unwrap();
        assert!(err.to_string().contains("VLB_HENRIK_API_KEY"));
    }

    #[test]
    fn proxy_transport_needs_no_key() {
        let cfg = TrackerConfig::default();
        let src = build_match_source(&cfg, &ResolvedSecrets::default()).unwrap();
        assert_eq!(src.source_name(), "proxy");
    }

    #[test]
    fn missing_data_array_is_decode_error() {
        let err = batch_from_body(&serde_json::json!({ "status": 200 })).unwrap_err();
        assert!(matches!(err, SourceError::Decode(_)));
    }
}
