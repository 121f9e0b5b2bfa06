//! Operator configuration.
//!
//! Settings are merged from programmatic defaults, an optional YAML file and
//! `ISSUE_OPERATOR_`-prefixed environment variables, in that order. Nested
//! keys use `__` as the separator, so `ISSUE_OPERATOR_TRACKER__BASE_URL`
//! overrides `tracker.base_url`.

use crate::issue::{
    domain::LabelKeys,
    services::{DEFAULT_FINALIZER, ReconcilerSettings},
};
use crate::runtime::RunnerSettings;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};
use thiserror::Error;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "ISSUE_OPERATOR_";

const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Accepts a bare level or comma-separated `target=level` directives.
fn is_level_filter(filter: &str) -> bool {
    let is_level = |level: &str| LOG_LEVELS.contains(&level.trim().to_lowercase().as_str());
    filter.split(',').all(|directive| {
        directive.rsplit_once('=').map_or_else(
            || is_level(directive),
            |(target, level)| !target.trim().is_empty() && is_level(level),
        )
    })
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The merged sources could not be deserialized.
    #[error("could not extract configuration: {0}")]
    Extract(#[source] Box<figment::Error>),

    /// A required name is empty.
    #[error("{0} must not be empty")]
    Empty(&'static str),

    /// The tracker base URL is not an HTTP(S) URL.
    #[error("tracker.base_url must start with http:// or https://, got '{0}'")]
    InvalidBaseUrl(String),

    /// The concurrency limit is zero.
    #[error("controller.max_concurrent_reconciles must be at least 1")]
    InvalidConcurrency,

    /// The backoff bounds are inverted or zero.
    #[error(
        "invalid backoff: initial_backoff_ms ({0}) must be positive and not exceed max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    /// The log level is neither a level nor a list of `target=level`
    /// directives.
    #[error(
        "invalid log level '{0}', expected a level (trace, debug, info, warn, error, off) or target=level directives"
    )]
    InvalidLogLevel(String),
}

/// Where and how to reach the issue tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    /// API root.
    pub base_url: String,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl TrackerSettings {
    /// Returns the request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.github.com".to_owned(),
            user_agent: concat!("github-issue-operator/", env!("CARGO_PKG_VERSION")).to_owned(),
            timeout_secs: 30,
        }
    }
}

/// Naming of the per-resource credential secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialSettings {
    /// Suffix appended to the resource name.
    pub secret_name_suffix: String,
    /// Secret entry holding the token.
    pub token_key: String,
}

impl Default for CredentialSettings {
    fn default() -> Self {
        Self {
            secret_name_suffix: "github-auth".to_owned(),
            token_key: "token".to_owned(),
        }
    }
}

/// Scheduling knobs for the controller loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    /// Upper bound on concurrently running reconciles.
    pub max_concurrent_reconciles: usize,
    /// Delay before revisiting a resource whose secret was just created.
    pub secret_created_requeue_secs: u64,
    /// Retry cadence while credentials are rejected or missing.
    pub bad_credentials_retry_secs: u64,
    /// First backoff delay after a failure.
    pub initial_backoff_ms: u64,
    /// Backoff ceiling.
    pub max_backoff_ms: u64,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            max_concurrent_reconciles: 4,
            secret_created_requeue_secs: 5,
            bad_credentials_retry_secs: 300,
            initial_backoff_ms: 500,
            max_backoff_ms: 300_000,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter used when `RUST_LOG` is unset: a bare level or
    /// `target=level` directives.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::default(),
        }
    }
}

/// Complete operator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorConfig {
    /// Finalizer token guarding remote cleanup.
    pub finalizer: String,
    /// Canonical label keys.
    pub labels: LabelKeys,
    /// Credential secret naming.
    pub credentials: CredentialSettings,
    /// Tracker endpoint.
    pub tracker: TrackerSettings,
    /// Controller scheduling.
    pub controller: ControllerSettings,
    /// Logging.
    pub logging: LoggingSettings,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            finalizer: DEFAULT_FINALIZER.to_owned(),
            labels: LabelKeys::default(),
            credentials: CredentialSettings::default(),
            tracker: TrackerSettings::default(),
            controller: ControllerSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl OperatorConfig {
    /// Loads and validates configuration.
    ///
    /// `path` names an optional YAML file; a missing file is skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when extraction or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|err| ConfigError::Extract(Box::new(err)))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("finalizer", &self.finalizer),
            ("labels.repo", &self.labels.repo),
            ("labels.title", &self.labels.title),
            ("credentials.secret_name_suffix", &self.credentials.secret_name_suffix),
            ("credentials.token_key", &self.credentials.token_key),
        ];
        if let Some((name, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ConfigError::Empty(*name));
        }

        let base_url = &self.tracker.base_url;
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(base_url.clone()));
        }

        let controller = &self.controller;
        if controller.max_concurrent_reconciles == 0 {
            return Err(ConfigError::InvalidConcurrency);
        }
        if controller.initial_backoff_ms == 0
            || controller.initial_backoff_ms > controller.max_backoff_ms
        {
            return Err(ConfigError::InvalidBackoff(
                controller.initial_backoff_ms,
                controller.max_backoff_ms,
            ));
        }

        if !is_level_filter(&self.logging.level) {
            return Err(ConfigError::InvalidLogLevel(self.logging.level.clone()));
        }
        Ok(())
    }

    /// Returns the reconciler's view of the configuration.
    #[must_use]
    pub fn reconciler_settings(&self) -> ReconcilerSettings {
        ReconcilerSettings {
            finalizer: self.finalizer.clone(),
            label_keys: self.labels.clone(),
            secret_name_suffix: self.credentials.secret_name_suffix.clone(),
            token_key: self.credentials.token_key.clone(),
            secret_created_requeue: Duration::from_secs(self.controller.secret_created_requeue_secs),
        }
    }

    /// Returns the runtime's view of the configuration.
    #[must_use]
    pub const fn runner_settings(&self) -> RunnerSettings {
        RunnerSettings {
            max_concurrent_reconciles: self.controller.max_concurrent_reconciles,
            initial_backoff: Duration::from_millis(self.controller.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.controller.max_backoff_ms),
            user_action_retry: Duration::from_secs(self.controller.bad_credentials_retry_secs),
        }
    }
}
