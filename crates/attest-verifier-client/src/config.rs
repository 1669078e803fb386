//! Verifier client configuration.
//!
//! Defaults target a single local verifier. Override via environment
//! variables, a YAML file, or explicit construction for tests.

use std::path::{Path, PathBuf};
use std::time::Duration;

use attest_core::{DEFAULT_API_VERSION, DEFAULT_VERIFIER_URL};
use serde::Deserialize;

/// Client certificate material for mTLS verifiers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TlsConfig {
    /// PEM client certificate.
    pub client_cert: PathBuf,
    /// PEM private key for `client_cert`.
    pub client_key: PathBuf,
    /// Extra PEM root CA to trust, if the verifier uses a private CA.
    #[serde(default)]
    pub ca_cert: Option<PathBuf>,
}

/// Configuration for talking to one or more verifiers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Verifier base URLs queried by fleet operations.
    pub verifier_urls: Vec<String>,
    /// REST API version path segment.
    pub api_version: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Retries after the first attempt, transport failures only.
    pub max_retries: u32,
    /// First retry delay in milliseconds; doubles per attempt.
    pub retry_base_delay_ms: u64,
    /// Overall deadline for multi-verifier fetches. Defaults to
    /// `timeout_secs`.
    pub fleet_deadline_secs: Option<u64>,
    /// Agent detail requests in flight at once per verifier listing.
    pub max_concurrent_details: usize,
    /// mTLS material. Plain HTTP when absent.
    pub tls: Option<TlsConfig>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            verifier_urls: vec![DEFAULT_VERIFIER_URL.to_string()],
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout_secs: 5,
            max_retries: 2,
            retry_base_delay_ms: 100,
            fleet_deadline_secs: None,
            max_concurrent_details: 16,
            tls: None,
        }
    }
}

/// Environment variable names read by [`VerifierConfig::from_env`].
pub mod env {
    /// Comma-separated verifier base URLs.
    pub const VERIFIER_URL: &str = "KEYLIME_VERIFIER_URL";
    /// API version path segment.
    pub const API_VERSION: &str = "KEYLIME_API_VERSION";
    /// Per-request timeout in seconds.
    pub const TIMEOUT_SECS: &str = "KEYLIME_TIMEOUT_SECS";
    /// Transport retries.
    pub const MAX_RETRIES: &str = "KEYLIME_MAX_RETRIES";
    /// First retry delay in milliseconds.
    pub const RETRY_DELAY_MS: &str = "KEYLIME_RETRY_DELAY_MS";
    /// Multi-verifier deadline in seconds.
    pub const FLEET_DEADLINE_SECS: &str = "KEYLIME_FLEET_DEADLINE_SECS";
    /// Concurrent agent detail requests per verifier.
    pub const MAX_CONCURRENT_DETAILS: &str = "KEYLIME_MAX_CONCURRENT_DETAILS";
    /// Client certificate path.
    pub const CLIENT_CERT: &str = "KEYLIME_CLIENT_CERT";
    /// Client key path.
    pub const CLIENT_KEY: &str = "KEYLIME_CLIENT_KEY";
    /// Extra CA certificate path.
    pub const CA_CERT: &str = "KEYLIME_CA_CERT";
}

impl VerifierConfig {
    /// Defaults with a single verifier URL.
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            verifier_urls: vec![url.into()],
            ..Self::default()
        }
    }

    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    ///
    /// Variables are listed in [`env`]. `KEYLIME_VERIFIER_URL` may hold a
    /// comma-separated list. TLS is enabled only when both
    /// `KEYLIME_CLIENT_CERT` and `KEYLIME_CLIENT_KEY` are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let verifier_urls = match std::env::var(env::VERIFIER_URL) {
            Ok(raw) => split_urls(&raw),
            Err(_) => defaults.verifier_urls,
        };

        let tls = match (
            std::env::var(env::CLIENT_CERT),
            std::env::var(env::CLIENT_KEY),
        ) {
            (Ok(cert), Ok(key)) => Some(TlsConfig {
                client_cert: cert.into(),
                client_key: key.into(),
                ca_cert: std::env::var(env::CA_CERT).ok().map(PathBuf::from),
            }),
            _ => None,
        };

        let config = Self {
            verifier_urls,
            api_version: std::env::var(env::API_VERSION).unwrap_or(defaults.api_version),
            timeout_secs: env_number(env::TIMEOUT_SECS)?.unwrap_or(defaults.timeout_secs),
            max_retries: env_number(env::MAX_RETRIES)?.unwrap_or(defaults.max_retries),
            retry_base_delay_ms: env_number(env::RETRY_DELAY_MS)?
                .unwrap_or(defaults.retry_base_delay_ms),
            fleet_deadline_secs: env_number(env::FLEET_DEADLINE_SECS)?,
            max_concurrent_details: env_number(env::MAX_CONCURRENT_DETAILS)?
                .unwrap_or(defaults.max_concurrent_details),
            tls,
        };
        config.check()?;
        Ok(config)
    }

    /// Load configuration from a YAML file. Missing keys take defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        config.check()?;
        Ok(config)
    }

    /// Reject configurations no request could succeed with.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.verifier_urls.is_empty() {
            return Err(ConfigError::Invalid("at least one verifier URL is required".into()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".into()));
        }
        if self.max_concurrent_details == 0 {
            return Err(ConfigError::Invalid(
                "max_concurrent_details must be positive".into(),
            ));
        }
        if self.api_version.trim().is_empty() {
            return Err(ConfigError::Invalid("api_version must be non-empty".into()));
        }
        Ok(())
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Overall multi-verifier deadline.
    pub fn fleet_deadline(&self) -> Duration {
        Duration::from_secs(self.fleet_deadline_secs.unwrap_or(self.timeout_secs))
    }

    /// The first configured verifier, used when a caller names none.
    pub fn primary_url(&self) -> &str {
        self.verifier_urls
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_VERIFIER_URL)
    }
}

fn split_urls(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn env_number<T: std::str::FromStr>(var: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber(var.to_string(), raw)),
        Err(_) => Ok(None),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be a non-negative integer, got \"{1}\"")]
    InvalidNumber(String, String),
    #[error("cannot read config file {path}: {reason}")]
    Read { path: String, reason: String },
    #[error("cannot parse config file {path}: {reason}")]
    Parse { path: String, reason: String },
    #[error("cannot load TLS material from {path}: {reason}")]
    Tls { path: String, reason: String },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
