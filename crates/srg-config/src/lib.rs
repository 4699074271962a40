// SPDX-License-Identifier: MIT OR Apache-2.0
//! Configuration loading, validation, and merging for success-rate-graph.
//!
//! Two files feed a run:
//!
//! * the connection-info JSON file ([`ConnectionInfo`]) naming the reporting
//!   server and the login credentials;
//! * an optional TOML run-settings file ([`RunConfig`]) tuning paging,
//!   output and debug sources, with environment overrides applied on top.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration loading or validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested configuration file was not found.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: String,
    },

    /// The file could not be parsed.
    #[error("failed to parse config {path}: {reason}")]
    ParseError {
        /// Path that was read.
        path: String,
        /// Human-readable parse error detail.
        reason: String,
    },

    /// Semantic validation failed (one or more problems).
    #[error("config validation failed: {reasons:?}")]
    ValidationError {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Advisory-level issues that do not prevent operation but deserve attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// TLS certificates of the reporting server are not verified.
    InsecureTls,
    /// A page size far above what the server usually serves.
    LargePageSize {
        /// Configured page size.
        size: u32,
    },
    /// Anomalous pages never abort the run; an undecodable one ends collection.
    UnboundedAnomalies,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::InsecureTls => {
                f.write_str("TLS certificate verification is disabled")
            }
            ConfigWarning::LargePageSize { size } => {
                write!(f, "page size {size} is unusually large")
            }
            ConfigWarning::UnboundedAnomalies => {
                f.write_str(
                    "max_consecutive_anomalies is 0; failing pages never abort the run, \
                     and an undecodable one ends collection",
                )
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Connection info
// ---------------------------------------------------------------------------

/// Login credentials for the reporting server.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct Credentials {
    /// Account name.
    pub username: String,
    /// Account password.
    pub password: String,
    /// Authentication domain.
    pub space: String,
}

/// Contents of the connection-info file.
///
/// ```json
/// {"credentials": {"username": "u", "password": "p", "space": "DOMAIN"},
///  "master": "MASTERSERVER"}
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct ConnectionInfo {
    /// Login credentials.
    pub credentials: Credentials,
    /// Host name of the master server.
    pub master: String,
    /// Full API root, overriding the one derived from `master`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl ConnectionInfo {
    /// API root ending in `/`: `base_url` if given, else
    /// `https://<master>/HDID/v1.0.0/`.
    #[must_use]
    pub fn api_root(&self) -> String {
        let mut root = match &self.base_url {
            Some(url) => url.clone(),
            None => format!("https://{}/HDID/v1.0.0/", self.master),
        };
        if !root.ends_with('/') {
            root.push('/');
        }
        root
    }
}

/// Read the connection-info JSON file.
pub fn load_connection(path: &Path) -> Result<ConnectionInfo, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.display().to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Run settings
// ---------------------------------------------------------------------------

/// Records requested per page when nothing else is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 500;

/// Consecutive anomalous pages tolerated before a run aborts.
pub const DEFAULT_MAX_CONSECUTIVE_ANOMALIES: u32 = 3;

/// Chart file written when nothing else is configured.
pub const DEFAULT_OUTPUT: &str = "success_rates.html";

/// Environment variable holding the raw debug level spec.
pub const DEFAULT_DEBUG_ENV_VAR: &str = "SUCCESS_RATE_GRAPH_DEBUG";

/// Per-request timeout when nothing else is configured.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Largest page the server is asked for.
const MAX_PAGE_SIZE: u32 = 10_000;

/// Page size above which a warning is produced.
const LARGE_PAGE_SIZE_THRESHOLD: u32 = 2_000;

/// Tunables for one run. Every field is optional so files can be overlaid.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct RunConfig {
    /// Records requested per page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,

    /// Consecutive anomalous pages tolerated (0 = never abort).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_consecutive_anomalies: Option<u32>,

    /// Chart output path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Environment variable holding the debug level spec.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_env_var: Option<String>,

    /// JSON debug-definition file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_definitions: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    /// Skip TLS certificate verification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept_invalid_certs: Option<bool>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            page_size: Some(DEFAULT_PAGE_SIZE),
            max_consecutive_anomalies: Some(DEFAULT_MAX_CONSECUTIVE_ANOMALIES),
            output: Some(DEFAULT_OUTPUT.into()),
            debug_env_var: Some(DEFAULT_DEBUG_ENV_VAR.into()),
            debug_definitions: None,
            request_timeout_secs: Some(DEFAULT_REQUEST_TIMEOUT_SECS),
            accept_invalid_certs: Some(true),
        }
    }
}

impl RunConfig {
    /// An all-`None` overlay.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            page_size: None,
            max_consecutive_anomalies: None,
            output: None,
            debug_env_var: None,
            debug_definitions: None,
            request_timeout_secs: None,
            accept_invalid_certs: None,
        }
    }

    /// Effective page size.
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Effective anomaly limit.
    #[must_use]
    pub fn max_consecutive_anomalies(&self) -> u32 {
        self.max_consecutive_anomalies
            .unwrap_or(DEFAULT_MAX_CONSECUTIVE_ANOMALIES)
    }

    /// Effective output path.
    #[must_use]
    pub fn output(&self) -> &str {
        self.output.as_deref().unwrap_or(DEFAULT_OUTPUT)
    }

    /// Effective debug environment variable.
    #[must_use]
    pub fn debug_env_var(&self) -> &str {
        self.debug_env_var.as_deref().unwrap_or(DEFAULT_DEBUG_ENV_VAR)
    }

    /// Effective request timeout.
    #[must_use]
    pub fn request_timeout_secs(&self) -> u64 {
        self.request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
    }

    /// Effective certificate policy.
    #[must_use]
    pub fn accept_invalid_certs(&self) -> bool {
        self.accept_invalid_certs.unwrap_or(true)
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load a [`RunConfig`] from an optional TOML file path.
///
/// * If `path` is `Some`, reads the file and overlays it on the defaults.
/// * If `path` is `None`, returns [`RunConfig::default()`].
///
/// Environment variable overrides are applied on top in both cases.
pub fn load_config(path: Option<&Path>) -> Result<RunConfig, ConfigError> {
    let mut config = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p).map_err(|_| ConfigError::FileNotFound {
                path: p.display().to_string(),
            })?;
            let file = parse_toml(&content).map_err(|e| match e {
                ConfigError::ParseError { reason, .. } => ConfigError::ParseError {
                    path: p.display().to_string(),
                    reason,
                },
                other => other,
            })?;
            merge_configs(RunConfig::default(), file)
        }
        None => RunConfig::default(),
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Parse a TOML string into a [`RunConfig`] overlay (absent keys stay `None`).
pub fn parse_toml(content: &str) -> Result<RunConfig, ConfigError> {
    toml::from_str::<RunConfig>(content).map_err(|e| ConfigError::ParseError {
        path: "<inline>".into(),
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Env overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides.
///
/// Recognised variables:
/// - `SRG_PAGE_SIZE`
/// - `SRG_OUTPUT`
/// - `SRG_DEBUG_DEFINITIONS`
pub fn apply_env_overrides(config: &mut RunConfig) {
    if let Ok(val) = std::env::var("SRG_PAGE_SIZE") {
        match val.trim().parse() {
            Ok(n) => config.page_size = Some(n),
            Err(_) => warn!(target: "srg.config", value = %val, "ignoring non-numeric SRG_PAGE_SIZE"),
        }
    }
    if let Ok(val) = std::env::var("SRG_OUTPUT") {
        config.output = Some(val);
    }
    if let Ok(val) = std::env::var("SRG_DEBUG_DEFINITIONS") {
        config.debug_definitions = Some(val);
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a configuration, returning advisory warnings.
///
/// Hard errors (zero or oversized page, zero timeout, empty output path)
/// are returned as a [`ConfigError::ValidationError`]; soft issues come back
/// as warnings.
pub fn validate_config(config: &RunConfig) -> Result<Vec<ConfigWarning>, ConfigError> {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<ConfigWarning> = Vec::new();

    let page = config.page_size();
    if page == 0 || page > MAX_PAGE_SIZE {
        errors.push(format!("page_size {page} out of range (1..={MAX_PAGE_SIZE})"));
    } else if page > LARGE_PAGE_SIZE_THRESHOLD {
        warnings.push(ConfigWarning::LargePageSize { size: page });
    }

    if config.request_timeout_secs() == 0 {
        errors.push("request_timeout_secs must be at least 1".into());
    }

    if config.output().trim().is_empty() {
        errors.push("output path must not be empty".into());
    }

    if config.debug_env_var().trim().is_empty() {
        errors.push("debug_env_var must not be empty".into());
    }

    if config.accept_invalid_certs() {
        warnings.push(ConfigWarning::InsecureTls);
    }
    if config.max_consecutive_anomalies() == 0 {
        warnings.push(ConfigWarning::UnboundedAnomalies);
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(ConfigError::ValidationError { reasons: errors })
    }
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

/// Merge two configurations.  Values in `overlay` take precedence over `base`.
pub fn merge_configs(base: RunConfig, overlay: RunConfig) -> RunConfig {
    RunConfig {
        page_size: overlay.page_size.or(base.page_size),
        max_consecutive_anomalies: overlay
            .max_consecutive_anomalies
            .or(base.max_consecutive_anomalies),
        output: overlay.output.or(base.output),
        debug_env_var: overlay.debug_env_var.or(base.debug_env_var),
        debug_definitions: overlay.debug_definitions.or(base.debug_definitions),
        request_timeout_secs: overlay.request_timeout_secs.or(base.request_timeout_secs),
        accept_invalid_certs: overlay.accept_invalid_certs.or(base.accept_invalid_certs),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
