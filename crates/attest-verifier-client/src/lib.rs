//! # attest-verifier-client -- Typed client for attestation verifier APIs
//!
//! Fetches agent status from one or more verifiers and normalizes it into
//! [`attest_core::AgentRecord`] values.
//!
//! ## API Path Convention
//!
//! `{verifier_url}/{api_version}/agents` and
//! `{verifier_url}/{api_version}/agents/{agent_id}`, with `api_version`
//! defaulting to `v2.1`. A verifier URL given without a scheme gets
//! `http://`, or `https://` when mTLS is configured.
//!
//! ## Failure Policy
//!
//! - Every request has a bounded timeout (default 5s).
//! - Transport failures are retried (default 2 retries, 100ms doubling
//!   backoff). HTTP error statuses are never retried; they surface at once
//!   as [`VerifierError::Http`] with the status and a body excerpt.
//! - Multi-verifier fetches ([`VerifierClient::fetch_fleet`]) never fail as
//!   a whole: each verifier that errors or misses the deadline becomes a
//!   [`VerifierFailure`] next to whatever records the others returned.

pub mod agents;
pub mod config;
pub mod error;
pub mod fleet;
pub(crate) mod retry;
pub mod wire;

pub use config::{ConfigError, TlsConfig, VerifierConfig};
pub use error::VerifierError;
pub use fleet::{FleetFetch, VerifierFailure};

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::retry::RetryPolicy;

/// Client for verifier REST APIs.
///
/// Cheap to clone: the underlying connection pool and configuration are
/// shared.
#[derive(Debug, Clone)]
pub struct VerifierClient {
    http: reqwest::Client,
    config: Arc<VerifierConfig>,
}

impl VerifierClient {
    /// Create a client from configuration.
    pub fn new(config: VerifierConfig) -> Result<Self, VerifierError> {
        config.check()?;

        let mut builder = reqwest::Client::builder().timeout(config.timeout());
        if let Some(tls) = &config.tls {
            let mut pem = read_pem(&tls.client_cert)?;
            pem.extend(read_pem(&tls.client_key)?);
            let identity = reqwest::Identity::from_pem(&pem).map_err(|e| ConfigError::Tls {
                path: tls.client_cert.display().to_string(),
                reason: e.to_string(),
            })?;
            builder = builder.identity(identity);
            if let Some(ca_path) = &tls.ca_cert {
                let ca = reqwest::Certificate::from_pem(&read_pem(ca_path)?).map_err(|e| {
                    ConfigError::Tls {
                        path: ca_path.display().to_string(),
                        reason: e.to_string(),
                    }
                })?;
                builder = builder.add_root_certificate(ca);
            }
        }

        let http = builder.build().map_err(|e| VerifierError::Transport {
            endpoint: "client_init".into(),
            source: e,
        })?;

        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    pub(crate) fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.config.max_retries,
            base_delay: Duration::from_millis(self.config.retry_base_delay_ms),
        }
    }

    /// Resolve a verifier base URL, adding a scheme when missing.
    pub fn base_url(&self, verifier_url: &str) -> Result<Url, VerifierError> {
        let trimmed = verifier_url.trim();
        let with_scheme = if trimmed.contains("://") {
            trimmed.to_string()
        } else if self.config.tls.is_some() {
            format!("https://{trimmed}")
        } else {
            format!("http://{trimmed}")
        };
        let url = Url::parse(&with_scheme).map_err(|e| VerifierError::InvalidUrl {
            url: verifier_url.to_string(),
            reason: e.to_string(),
        })?;
        if url.cannot_be_a_base() {
            return Err(VerifierError::InvalidUrl {
                url: verifier_url.to_string(),
                reason: "URL cannot be used as a base".into(),
            });
        }
        Ok(url)
    }

    /// Build `{base}/{api_version}/{segments...}`. Segments are
    /// percent-encoded, so agent identifiers cannot alter the path.
    pub(crate) fn endpoint(&self, base: &Url, segments: &[&str]) -> Result<Url, VerifierError> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| VerifierError::InvalidUrl {
                url: base.to_string(),
                reason: "URL cannot be used as a base".into(),
            })?
            .pop_if_empty()
            .push(&self.config.api_version)
            .extend(segments);
        Ok(url)
    }
}

/// Display form of a base URL as stored in records: no trailing slash.
pub(crate) fn display_base(base: &Url) -> String {
    base.as_str().trim_end_matches('/').to_string()
}

fn read_pem(path: &std::path::Path) -> Result<Vec<u8>, ConfigError> {
    std::fs::read(path).map_err(|e| ConfigError::Tls {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> VerifierClient {
        VerifierClient::new(VerifierConfig::default()).unwrap()
    }

    #[test]
    fn endpoint_appends_version_and_segments() {
        let c = client();
        let base = c.base_url("http://localhost:8881").unwrap();
        assert_eq!(
            c.endpoint(&base, &["agents", "agent-123"]).unwrap().as_str(),
            "http://localhost:8881/v2.1/agents/agent-123"
        );
        assert_eq!(
            c.endpoint(&base, &["agents"]).unwrap().as_str(),
            "http://localhost:8881/v2.1/agents"
        );
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let c = client();
        let base = c.base_url("https://gw.example/keylime/").unwrap();
        assert_eq!(
            c.endpoint(&base, &["agents"]).unwrap().as_str(),
            "https://gw.example/keylime/v2.1/agents"
        );
    }

    #[test]
    fn agent_id_is_percent_encoded() {
        let c = client();
        let base = c.base_url("http://localhost:8881").unwrap();
        let url = c.endpoint(&base, &["agents", "../admin"]).unwrap();
        assert_eq!(url.path(), "/v2.1/agents/..%2Fadmin");
    }

    #[test]
    fn scheme_is_added_when_missing() {
        let c = client();
        assert_eq!(
            display_base(&c.base_url("verifier.local:8881").unwrap()),
            "http://verifier.local:8881"
        );
    }

    #[test]
    fn unusable_urls_are_rejected() {
        let c = client();
        assert!(matches!(
            c.base_url("http://"),
            Err(VerifierError::InvalidUrl { .. })
        ));
        assert!(matches!(
            c.base_url("http://[::1"),
            Err(VerifierError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn missing_tls_material_fails_construction() {
        let cfg = VerifierConfig {
            tls: Some(TlsConfig {
                client_cert: "/nonexistent/client.crt".into(),
                client_key: "/nonexistent/client.key".into(),
                ca_cert: None,
            }),
            ..VerifierConfig::default()
        };
        assert!(matches!(
            VerifierClient::new(cfg),
            Err(VerifierError::Config(ConfigError::Tls { .. }))
        ));
    }
}
