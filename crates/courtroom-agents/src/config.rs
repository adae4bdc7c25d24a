//! Runtime configuration for the courtroom runner.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags (tier, rounds, forced-binary)
//! 2. Environment variable overrides (`COURTROOM_*`)
//! 3. Built-in defaults (OpenAI endpoint, gpt-4o-mini / gpt-4o tiers)

use std::env;

use serde::{Deserialize, Serialize};

/// Default OpenAI-compatible base URL.
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// Default fast-tier model.
const DEFAULT_FAST_MODEL: &str = "gpt-4o-mini";
/// Default quality-tier model.
const DEFAULT_QUALITY_MODEL: &str = "gpt-4o";
/// Default per-request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Environment-variable names for configuration overrides.
const ENV_BASE_URL: &str = "COURTROOM_BASE_URL";
const ENV_API_KEY: &str = "OPENAI_API_KEY";
const ENV_FAST_MODEL: &str = "COURTROOM_FAST_MODEL";
const ENV_QUALITY_MODEL: &str = "COURTROOM_QUALITY_MODEL";

/// Cost/quality tier for model selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Cheaper, faster model.
    Fast,
    /// Stronger, more expensive model.
    Quality,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fast => write!(f, "fast"),
            Self::Quality => write!(f, "quality"),
        }
    }
}

/// Top-level configuration consumed by the runner and client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourtConfig {
    /// Base URL for the OpenAI-compatible API.
    pub base_url: String,
    /// API key (any non-empty value for most local servers).
    pub api_key: String,
    /// Model used at the fast tier.
    pub fast_model: String,
    /// Model used at the quality tier.
    pub quality_model: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Sampling temperature for deliberation turns.
    pub temperature: f64,
    /// Max tokens per completion.
    pub max_tokens: u32,
    /// Deliberation rounds before the Jury Foreman closes.
    pub deliberation_rounds: u32,
    /// Force a binary verdict when the jury returns ambiguous.
    pub force_binary: bool,
}

impl Default for CourtConfig {
    fn default() -> Self {
        Self {
            base_url: env::var(ENV_BASE_URL).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            api_key: env::var(ENV_API_KEY).unwrap_or_default(),
            fast_model: env::var(ENV_FAST_MODEL)
                .unwrap_or_else(|_| DEFAULT_FAST_MODEL.to_string()),
            quality_model: env::var(ENV_QUALITY_MODEL)
                .unwrap_or_else(|_| DEFAULT_QUALITY_MODEL.to_string()),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            temperature: 0.3,
            max_tokens: 2048,
            deliberation_rounds: 1,
            force_binary: false,
        }
    }
}

impl CourtConfig {
    /// Build from environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self::default()
    }

    /// The model name for a tier.
    pub fn model_for(&self, tier: Tier) -> &str {
        match tier {
            Tier::Fast => &self.fast_model,
            Tier::Quality => &self.quality_model,
        }
    }

    /// Validate the config; return an error string if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.api_key.is_empty() && !self.is_local_endpoint() {
            return Err(format!(
                "no API key: set {ENV_API_KEY} (or point {ENV_BASE_URL} at a local server)"
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!(
                "temperature must be in [0, 2], got {}",
                self.temperature
            ));
        }
        if self.max_tokens == 0 {
            return Err("max_tokens must be > 0".to_string());
        }
        if self.deliberation_rounds == 0 {
            return Err("deliberation_rounds must be > 0".to_string());
        }
        Ok(())
    }

    /// Local inference servers accept any (or no) key.
    fn is_local_endpoint(&self) -> bool {
        self.base_url.contains("localhost") || self.base_url.contains("127.0.0.1")
    }
}
