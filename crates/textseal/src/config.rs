//! Configuration loading and validation.
//!
//! All values are read from `TEXTSEAL_*` environment variables at startup.
//! Every variable is optional; the process exits with a clear error message
//! if one is present but invalid.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::keys::NonceMode;

/// Largest plaintext limit that may be configured (1 MiB).
const MAX_PLAINTEXT_CEILING: usize = 1024 * 1024;

/// How the menu prints results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per result.
    Json,
}

/// Validated textseal configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Tracing log level (e.g. `"warn"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Longest accepted plaintext, in bytes.
    #[serde(default = "default_max_plaintext_len")]
    pub max_plaintext_len: usize,

    /// How nonces are generated for each key.
    #[serde(default)]
    pub nonce_mode: NonceMode,

    /// Context label authenticated with every blob.
    #[serde(default = "default_associated_data")]
    pub associated_data: String,

    #[serde(default)]
    pub output_format: OutputFormat,
}

fn default_log_level() -> String {
    "warn".into()
}
fn default_max_plaintext_len() -> usize {
    1024
}
fn default_associated_data() -> String {
    "textseal.v1".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::with_prefix("TEXTSEAL"))
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        if self.max_plaintext_len == 0 || self.max_plaintext_len > MAX_PLAINTEXT_CEILING {
            anyhow::bail!(
                "TEXTSEAL_MAX_PLAINTEXT_LEN must be between 1 and {MAX_PLAINTEXT_CEILING}"
            );
        }
        if self.associated_data.trim().is_empty() {
            anyhow::bail!("TEXTSEAL_ASSOCIATED_DATA must not be empty");
        }
        if self.log_level.trim().is_empty() {
            anyhow::bail!("TEXTSEAL_LOG_LEVEL must not be empty");
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            max_plaintext_len: default_max_plaintext_len(),
            nonce_mode: NonceMode::default(),
            associated_data: default_associated_data(),
            output_format: OutputFormat::default(),
        }
    }
}
