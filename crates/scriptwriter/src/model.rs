//! The external model seam.
//!
//! `ScriptModel` is the loop's only outbound dependency: one request in, raw
//! response text out. `RigScriptModel` implements it against any
//! OpenAI-compatible chat-completions endpoint; tests substitute scripted or
//! mocked models.

use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::openai;

use crate::config::ProviderConfig;
use crate::errors::GenerationError;

/// A fully rendered two-message request for one continuation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuationRequest {
    /// System message: role, output schema, word-budget rules.
    pub preamble: String,
    /// User message: topic, counts, and the rolling summary.
    pub prompt: String,
    /// The ceiling communicated in `prompt`.
    pub words_remaining: i64,
}

/// Anything that can answer a continuation request with raw text.
#[async_trait]
pub trait ScriptModel: Send + Sync {
    /// Issue exactly one call. Transport or provider failures map to
    /// `GenerationError::ExternalCall`.
    async fn complete(&self, request: &ContinuationRequest) -> Result<String, GenerationError>;
}

#[async_trait]
impl<M: ScriptModel + ?Sized> ScriptModel for &M {
    async fn complete(&self, request: &ContinuationRequest) -> Result<String, GenerationError> {
        (**self).complete(request).await
    }
}

/// `ScriptModel` backed by a rig OpenAI-compatible completions client.
pub struct RigScriptModel {
    client: openai::CompletionsClient,
    model: String,
    temperature: f64,
    max_tokens: Option<u64>,
}

impl RigScriptModel {
    /// Build the client from an explicit provider config.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, GenerationError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                GenerationError::Configuration(format!(
                    "no API key configured (set {})",
                    crate::config::ENV_API_KEY
                ))
            })?;

        let client = openai::CompletionsClient::builder()
            .api_key(api_key)
            .base_url(&config.base_url)
            .build()
            .map_err(|e| {
                GenerationError::Configuration(format!(
                    "failed to build client for {}: {e}",
                    config.base_url
                ))
            })?;

        Ok(Self {
            client,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ScriptModel for RigScriptModel {
    async fn complete(&self, request: &ContinuationRequest) -> Result<String, GenerationError> {
        let mut builder = self
            .client
            .agent(&self.model)
            .preamble(&request.preamble)
            .temperature(self.temperature);
        if let Some(max_tokens) = self.max_tokens {
            builder = builder.max_tokens(max_tokens);
        }
        let agent = builder.build();

        agent
            .prompt(request.prompt.as_str())
            .await
            .map_err(|e| GenerationError::ExternalCall(e.to_string()))
    }
}
