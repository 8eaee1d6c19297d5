//! Configuration management
//!
//! Layered lowest to highest: built-in defaults, `secretquery.toml` (or an
//! explicit file), `SECRETQUERY_*` environment variables. Command line flags
//! are applied on top by the binary.

use secretquery_secrets::{FetcherConfig, DEFAULT_REGION};
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// Region the Secrets Manager client is bound to
    #[serde(default = "default_region")]
    pub region: String,

    /// Secret holding the query credentials
    #[serde(default = "default_secret_name")]
    pub secret_name: String,

    /// Endpoint override, for local emulators
    #[serde(default)]
    pub endpoint_url: Option<String>,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            region: default_region(),
            secret_name: default_secret_name(),
            endpoint_url: None,
            log_level: default_log_level(),
        }
    }
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_secret_name() -> String {
    "example_secret".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    /// Load configuration from file and environment
    ///
    /// With no `path`, `secretquery.{toml,json,yaml,...}` in the working
    /// directory is used if present.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("secretquery").required(false),
        };

        let config = config::Config::builder()
            .add_source(file)
            .add_source(config::Environment::with_prefix("SECRETQUERY"))
            .build()?;

        config.try_deserialize::<Settings>()
    }

    /// Apply command line overrides; set fields win over every other layer
    #[must_use]
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(region) = overrides.region {
            self.region = region;
        }
        if let Some(secret_name) = overrides.secret_name {
            self.secret_name = secret_name;
        }
        if let Some(endpoint_url) = overrides.endpoint_url {
            self.endpoint_url = Some(endpoint_url);
        }
        if let Some(log_level) = overrides.log_level {
            self.log_level = log_level;
        }
        self
    }

    /// Connection settings for the secret fetcher
    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            region: self.region.clone(),
            endpoint_url: self
                .endpoint_url
                .clone()
                .filter(|endpoint| !endpoint.is_empty()),
        }
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub region: Option<String>,
    pub secret_name: Option<String>,
    pub endpoint_url: Option<String>,
    pub log_level: Option<String>,
}
