//! Configuration structures for the extraction pipeline.

use std::path::PathBuf;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Environment variable holding the service base URL.
pub const ENDPOINT_VAR: &str = "AZURE_ENDPOINT";
/// Environment variable holding the service key.
pub const KEY_VAR: &str = "AZURE_KEY";

/// Main configuration for a scan run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Document analysis service settings.
    pub service: ServiceConfig,

    /// Concurrency settings.
    pub batch: BatchConfig,

    /// Totals validation settings.
    pub validation: ValidationConfig,

    /// Vendor fallback settings.
    pub vendor: VendorConfig,

    /// Output locations.
    pub output: OutputConfig,
}

/// Document analysis service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Prebuilt model to run.
    pub model_id: String,

    /// REST API version.
    pub api_version: String,

    /// Delay between polls of the analyze operation.
    pub poll_interval_ms: u64,

    /// Maximum number of polls before giving up with a timeout.
    pub max_polls: u32,

    /// Per-request HTTP timeout.
    pub request_timeout_secs: u64,

    /// Extra attempts for transient failures.
    pub max_retries: u32,

    /// First backoff delay; doubles with every retry.
    pub retry_base_delay_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            model_id: "prebuilt-receipt".to_string(),
            api_version: "2024-11-30".to_string(),
            poll_interval_ms: 1000,
            max_polls: 60,
            request_timeout_secs: 120,
            max_retries: 3,
            retry_base_delay_ms: 1000,
        }
    }
}

/// Concurrency settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of files analyzed concurrently.
    pub workers: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { workers: 5 }
    }
}

/// Totals validation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Absolute tolerance in currency units.
    #[serde(with = "rust_decimal::serde::float")]
    pub tolerance: Decimal,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            tolerance: Decimal::new(2, 2),
        }
    }
}

/// Vendor fallback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VendorConfig {
    /// Guess a vendor from the raw lines when the service returns none.
    pub enable_fallback: bool,

    /// Non-empty head lines inspected by the leading-line heuristic.
    pub head_lines: usize,
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self {
            enable_fallback: true,
            head_lines: 5,
        }
    }
}

/// Output locations. Every run overwrites these files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub json_path: PathBuf,
    pub csv_path: PathBuf,
    /// Optional one-row-per-item export.
    pub items_csv_path: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json_path: PathBuf::from("extraction_log.json"),
            csv_path: PathBuf::from("extraction_log.csv"),
            items_csv_path: None,
        }
    }
}

impl ScanConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }
}

/// Service credentials, read once at startup and shared read-only.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    endpoint: String,
    key: String,
}

impl Credentials {
    /// Build credentials, rejecting blank values and non-HTTP endpoints.
    pub fn new(endpoint: impl Into<String>, key: impl Into<String>) -> Result<Self, ScanError> {
        let endpoint = endpoint.into().trim().trim_end_matches('/').to_string();
        let key = key.into().trim().to_string();

        if endpoint.is_empty() {
            return Err(ScanError::Config(format!("{} is not set", ENDPOINT_VAR)));
        }
        if key.is_empty() {
            return Err(ScanError::Config(format!("{} is not set", KEY_VAR)));
        }
        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            return Err(ScanError::Config(format!(
                "{} must be an http(s) URL, got '{}'",
                ENDPOINT_VAR, endpoint
            )));
        }

        Ok(Self { endpoint, key })
    }

    /// Read `AZURE_ENDPOINT` and `AZURE_KEY` from the process environment.
    pub fn from_env() -> Result<Self, ScanError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ScanError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = lookup(ENDPOINT_VAR).unwrap_or_default();
        let key = lookup(KEY_VAR).unwrap_or_default();
        Self::new(endpoint, key)
    }

    /// Base URL without a trailing slash.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("endpoint", &self.endpoint)
            .field("key", &redact(&self.key))
            .finish()
    }
}

fn redact(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}

/// Parse a tolerance given on the command line.
pub fn parse_tolerance(s: &str) -> Result<Decimal, ScanError> {
    let value = Decimal::from_str(s.trim())
        .map_err(|e| ScanError::Config(format!("invalid tolerance '{}': {}", s, e)))?;
    if value.is_sign_negative() {
        return Err(ScanError::Config(format!("tolerance must not be negative: {}", s)));
    }
    Ok(value)
}
