//! Runtime configuration.

use std::str::FromStr;

use clap::ValueEnum;
use face_verify_auth::DEFAULT_NEXT_PAGE;
use face_verify_upload::{DEFAULT_VERIFY_ENDPOINT, validate_verify_endpoint};

use crate::AppError;

/// Overrides the verification endpoint.
pub const ENDPOINT_ENV: &str = "FACE_VERIFY_ENDPOINT";
/// Overrides the page reached after the form gate.
pub const NEXT_PAGE_ENV: &str = "FACE_VERIFY_NEXT_PAGE";
/// Selects `text` or `json` log output.
pub const LOG_FORMAT_ENV: &str = "FACE_VERIFY_LOG_FORMAT";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(AppError::Config(format!("unknown log format '{other}'"))),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Verification endpoint URL.
    pub verify_endpoint: String,
    /// Location reached after a passing form gate.
    pub next_page: String,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            verify_endpoint: DEFAULT_VERIFY_ENDPOINT.to_string(),
            next_page: DEFAULT_NEXT_PAGE.to_string(),
            log_format: LogFormat::default(),
        }
    }
}

/// Values supplied on the command line; each one replaces its environment
/// variable entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Replaces `FACE_VERIFY_ENDPOINT`.
    pub verify_endpoint: Option<String>,
    /// Replaces `FACE_VERIFY_LOG_FORMAT`.
    pub log_format: Option<LogFormat>,
}

impl AppConfig {
    /// Loads configuration from process environment variables.
    ///
    /// # Errors
    /// See [`AppConfig::from_lookup`].
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_env_with(&ConfigOverrides::default())
    }

    /// Loads configuration from the environment with command-line overrides.
    ///
    /// # Errors
    /// See [`AppConfig::from_lookup_with`].
    pub fn from_env_with(overrides: &ConfigOverrides) -> Result<Self, AppError> {
        Self::from_lookup_with(|key| std::env::var(key).ok(), overrides)
    }

    /// Loads configuration from an arbitrary key lookup.
    ///
    /// Unset or blank values fall back to defaults.
    ///
    /// # Errors
    /// Returns [`AppError::Config`] for an unknown log format or an invalid
    /// endpoint.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        Self::from_lookup_with(lookup, &ConfigOverrides::default())
    }

    /// Loads configuration from a key lookup, letting `overrides` win.
    ///
    /// An overridden variable is never read, so a malformed environment value
    /// cannot fail a run that supplies a valid flag. Validation runs once, on
    /// the merged result.
    ///
    /// # Errors
    /// Returns [`AppError::Config`] for an unknown log format or an invalid
    /// endpoint.
    pub fn from_lookup_with(
        lookup: impl Fn(&str) -> Option<String>,
        overrides: &ConfigOverrides,
    ) -> Result<Self, AppError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        match &overrides.verify_endpoint {
            Some(endpoint) => config.verify_endpoint = endpoint.clone(),
            None => {
                if let Some(endpoint) = read(ENDPOINT_ENV) {
                    config.verify_endpoint = endpoint;
                }
            }
        }
        if let Some(next_page) = read(NEXT_PAGE_ENV) {
            config.next_page = next_page;
        }
        match overrides.log_format {
            Some(format) => config.log_format = format,
            None => {
                if let Some(format) = read(LOG_FORMAT_ENV) {
                    config.log_format = format.parse()?;
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field invariants.
    ///
    /// # Errors
    /// Returns [`AppError::Config`] when the endpoint is invalid or the next
    /// page is blank.
    pub fn validate(&self) -> Result<(), AppError> {
        validate_verify_endpoint(&self.verify_endpoint)
            .map_err(|error| AppError::Config(error.to_string()))?;

        if self.next_page.trim().is_empty() {
            return Err(AppError::Config("next page must not be empty".to_string()));
        }

        Ok(())
    }
}
