//! Provider and generation configuration.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags (applied by the binary)
//! 2. Environment variables (`LLM_API_KEY`, `LLM_MODEL_NAME`, `LLM_BASE_URL`)
//! 3. Values from a TOML file (`--config`)
//! 4. Built-in defaults
//!
//! Core logic never reads the environment: the binary resolves a `ScriptConfig`
//! once and injects it into the model client and the generator.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default OpenAI-compatible endpoint.
const DEFAULT_BASE_URL: &str = "https://api.longcat.chat/openai";
/// Default model alias served by the default endpoint.
const DEFAULT_MODEL: &str = "LongCat-Flash-Chat";
const DEFAULT_TEMPERATURE: f64 = 0.7;
/// Floor on the step cap; large budgets raise it through `min_step_words`.
const DEFAULT_MAX_ITERATIONS: u32 = 64;
const DEFAULT_MIN_STEP_WORDS: u32 = 25;
const DEFAULT_MAX_STALLED_STEPS: u32 = 3;

pub const ENV_API_KEY: &str = "LLM_API_KEY";
pub const ENV_MODEL: &str = "LLM_MODEL_NAME";
pub const ENV_BASE_URL: &str = "LLM_BASE_URL";

/// What to do when a continuation is longer than the words remaining.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OverrunPolicy {
    /// Keep the first `words_remaining` words and finish the script.
    #[default]
    Truncate,
    /// Abort the run with `BudgetOverrun`.
    Fail,
}

impl std::fmt::Display for OverrunPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Truncate => write!(f, "truncate"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

/// OpenAI-compatible endpoint the continuation step talks to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    /// Required to build the production client.
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f64,
    /// Per-request completion token cap; provider default when unset.
    pub max_tokens: Option<u64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
        }
    }
}

/// Loop guards and termination policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Minimum cap on continuation steps per run.
    pub max_iterations: u32,
    /// Smallest step size the cap allows for: a run may take up to
    /// `ceil(max_words / min_step_words)` steps when that exceeds
    /// `max_iterations`. `0` disables scaling.
    pub min_step_words: u32,
    /// Abort after this many consecutive steps that add no words. `0` disables.
    pub max_stalled_steps: u32,
    /// Stop once `words_remaining` drops to this value or below, whatever the
    /// model's `completed` flag says. Must be below the requested budget.
    pub completion_threshold: u32,
    pub overrun_policy: OverrunPolicy,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            min_step_words: DEFAULT_MIN_STEP_WORDS,
            max_stalled_steps: DEFAULT_MAX_STALLED_STEPS,
            completion_threshold: 0,
            overrun_policy: OverrunPolicy::default(),
        }
    }
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_iterations == 0 {
            return Err("max_iterations must be > 0".to_string());
        }
        Ok(())
    }

    /// Step cap for a run with this budget.
    pub fn iteration_limit(&self, max_words: u32) -> u32 {
        if self.min_step_words == 0 {
            return self.max_iterations;
        }
        self.max_iterations
            .max(max_words.div_ceil(self.min_step_words))
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    pub provider: ProviderConfig,
    pub generation: GenerationConfig,
}

impl ScriptConfig {
    /// Load from a TOML file. Missing sections and keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?;
        let config: ScriptConfig =
            toml::from_str(&content).context("Failed to parse script config TOML")?;
        Ok(config)
    }

    /// File (if any) or defaults, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// `load` with an explicit variable lookup in place of the process environment.
    pub fn load_with(
        path: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        Ok(config.with_overrides_from(lookup))
    }

    /// Apply `LLM_*` environment variables on top of this config.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup. Empty values are ignored.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(ENV_API_KEY) {
            self.provider.api_key = Some(key);
        }
        if let Some(model) = get(ENV_MODEL) {
            self.provider.model = model;
        }
        if let Some(url) = get(ENV_BASE_URL) {
            self.provider.base_url = url;
        }
        self
    }

    /// Validate all sub-configs.
    pub fn validate(&self) -> Result<(), String> {
        self.generation.validate()?;
        if !(0.0..=2.0).contains(&self.provider.temperature) {
            return Err(format!(
                "temperature must be in [0, 2], got {}",
                self.provider.temperature
            ));
        }
        if self.provider.base_url.trim().is_empty() {
            return Err("base_url must not be empty".to_string());
        }
        if self.provider.model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }
        if self.provider.max_tokens == Some(0) {
            return Err("max_tokens must be > 0 when set".to_string());
        }
        Ok(())
    }
}
