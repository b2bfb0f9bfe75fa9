//! Ollama LLM Provider
//!
//! Implementation of `LlmProvider` for local Ollama inference.

use agent_core::{
    error::{AgentError, Result},
    message::{Message, Role},
    provider::{
        Completion, CompletionStream, GenerationOptions, LlmProvider, ModelInfo, StreamChunk,
        TokenUsage,
    },
};
use async_trait::async_trait;
use futures::StreamExt;
use ollama_rs::{
    Ollama,
    generation::chat::{
        ChatMessage, ChatMessageFinalResponseData, MessageRole, request::ChatMessageRequest,
    },
    models::ModelOptions,
};

/// Ollama provider configuration
#[derive(Clone, Debug)]
pub struct OllamaConfig {
    /// Ollama host URL
    pub host: String,

    /// Ollama port
    pub port: u16,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost".into(),
            port: 11434,
        }
    }
}

impl OllamaConfig {
    /// Read `OLLAMA_HOST` and `OLLAMA_PORT`, falling back to localhost defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let host = std::env::var("OLLAMA_HOST").unwrap_or(defaults.host);
        let port = std::env::var("OLLAMA_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);

        Self { host, port }
    }
}

/// Ollama LLM provider
pub struct OllamaProvider {
    client: Ollama,
}

impl OllamaProvider {
    /// Create from configuration
    pub fn from_config(config: &OllamaConfig) -> Self {
        Self {
            client: Ollama::new(config.host.clone(), config.port),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::from_config(&OllamaConfig::from_env())
    }

    /// Convert agent messages to Ollama format
    fn convert_messages(messages: &[Message]) -> Vec<ChatMessage> {
        messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::System => MessageRole::System,
                    Role::User => MessageRole::User,
                    Role::Assistant => MessageRole::Assistant,
                };
                ChatMessage::new(role, m.content.clone())
            })
            .collect()
    }

    fn build_request(messages: &[Message], opts: &GenerationOptions) -> ChatMessageRequest {
        let mut options = ModelOptions::default()
            .temperature(opts.temperature)
            .top_p(opts.top_p)
            .num_predict(i32::try_from(opts.max_tokens).unwrap_or(i32::MAX));
        if let Some(seed) = opts.seed {
            options = options.seed(seed);
        }
        if !opts.stop_sequences.is_empty() {
            options = options.stop(opts.stop_sequences.clone());
        }

        ChatMessageRequest::new(opts.model.clone(), Self::convert_messages(messages)).options(options)
    }
}

/// Token counts reported with the last response of a chat
fn usage_from(data: &ChatMessageFinalResponseData) -> TokenUsage {
    let prompt_tokens = u32::try_from(data.prompt_eval_count).unwrap_or(u32::MAX);
    let completion_tokens = u32::try_from(data.eval_count).unwrap_or(u32::MAX);
    TokenUsage {
        prompt_tokens,
        completion_tokens,
        total_tokens: prompt_tokens.saturating_add(completion_tokens),
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn health_check(&self) -> Result<bool> {
        match self.client.list_local_models().await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!("Ollama health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn complete(&self, messages: &[Message], options: &GenerationOptions) -> Result<Completion> {
        let response = self
            .client
            .send_chat_messages(Self::build_request(messages, options))
            .await
            .map_err(|e| AgentError::Provider(e.to_string()))?;

        Ok(Completion {
            usage: response.final_data.as_ref().map(usage_from),
            content: response.message.content,
            model: options.model.clone(),
        })
    }

    async fn complete_stream(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<CompletionStream> {
        let stream = self
            .client
            .send_chat_messages_stream(Self::build_request(messages, options))
            .await
            .map_err(|e| AgentError::Provider(e.to_string()))?;

        let mapped = stream.map(|result| {
            result
                .map(|chunk| StreamChunk {
                    done: chunk.done,
                    usage: chunk.final_data.as_ref().map(usage_from),
                    delta: chunk.message.content,
                })
                .map_err(|_| AgentError::Provider("Ollama stream interrupted".into()))
        });

        Ok(Box::pin(mapped))
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let models = self
            .client
            .list_local_models()
            .await
            .map_err(|e| AgentError::ProviderUnavailable(e.to_string()))?;

        Ok(models
            .into_iter()
            .map(|m| ModelInfo {
                id: m.name.clone(),
                name: m.name,
            })
            .collect())
    }

    fn estimate_tokens(&self, text: &str) -> u32 {
        // Llama-family tokenizers average roughly 4 chars per token
        u32::try_from(text.chars().count().div_ceil(4)).unwrap_or(u32::MAX)
    }
}
