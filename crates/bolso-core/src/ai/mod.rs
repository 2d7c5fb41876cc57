//! Pluggable completion service abstraction
//!
//! The pipeline treats the language model as an untrusted, best-effort
//! collaborator: it sends one prompt, gets free text back, and validates
//! whatever JSON it can find. Backends only move text; prompt rendering and
//! task routing live in [`TaskRunner`].
//!
//! # Architecture
//!
//! - `AIBackend` trait: single completion call plus health/identity
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OllamaBackend`, `OpenAICompatibleBackend`, `MockBackend`
//! - `TaskRunner`: prompt library + model router in front of an `AIClient`
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (ollama, openai_compatible, mock). Default: ollama
//! - `OLLAMA_HOST`: Ollama server URL (required for ollama backend)
//! - `OLLAMA_MODEL`: Default model name (default: llama3.2)
//! - `OPENAI_COMPATIBLE_HOST`: Server URL (required for openai_compatible backend)
//! - `OPENAI_COMPATIBLE_MODEL`: Model name (default: gpt-3.5-turbo)
//! - `OPENAI_COMPATIBLE_API_KEY`: API key if required (optional)

mod mock;
mod ollama;
mod openai_compatible;
pub mod parsing;
mod tasks;
pub mod types;

pub use mock::{MockBackend, MOCK_NARRATIVE_REPLY};
pub use ollama::OllamaBackend;
pub use openai_compatible::OpenAICompatibleBackend;
pub use tasks::TaskRunner;
pub use types::*;

use async_trait::async_trait;

use crate::error::Result;

/// Trait defining the interface for all completion backends
///
/// Backends should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Run one completion and return the raw generated text
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Get the default model name
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    /// Ollama backend (HTTP API)
    Ollama(OllamaBackend),
    /// OpenAI-compatible backend (OpenAI, vLLM, LocalAI, llama-server, etc.)
    OpenAICompatible(OpenAICompatibleBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Create an AI client from environment variables
    ///
    /// Checks `AI_BACKEND` to determine which backend to use:
    /// - `ollama` (default): Uses OLLAMA_HOST and OLLAMA_MODEL
    /// - `openai_compatible`: Uses OPENAI_COMPATIBLE_HOST, OPENAI_COMPATIBLE_MODEL
    ///   and OPENAI_COMPATIBLE_API_KEY
    /// - `mock`: Creates a mock backend for testing
    ///
    /// Returns None if the required environment variables are not set.
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("AI_BACKEND").unwrap_or_else(|_| "ollama".to_string());

        match backend.to_lowercase().as_str() {
            "ollama" => OllamaBackend::from_env().map(AIClient::Ollama),
            "openai_compatible" | "openai" | "vllm" | "localai" | "llamacpp" => {
                OpenAICompatibleBackend::from_env().map(AIClient::OpenAICompatible)
            }
            "mock" => Some(AIClient::Mock(MockBackend::new())),
            _ => {
                tracing::warn!(backend = %backend, "Unknown AI_BACKEND, falling back to ollama");
                OllamaBackend::from_env().map(AIClient::Ollama)
            }
        }
    }

    /// Create an Ollama backend directly
    pub fn ollama(host: &str, model: &str) -> Self {
        AIClient::Ollama(OllamaBackend::new(host, model))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    /// Create a new client with a different default model
    pub fn with_model(&self, model: &str) -> Self {
        match self {
            AIClient::Ollama(b) => AIClient::Ollama(b.with_model(model)),
            AIClient::OpenAICompatible(b) => AIClient::OpenAICompatible(b.with_model(model)),
            AIClient::Mock(b) => AIClient::Mock(b.clone()),
        }
    }

    fn backend(&self) -> &dyn AIBackend {
        match self {
            AIClient::Ollama(b) => b,
            AIClient::OpenAICompatible(b) => b,
            AIClient::Mock(b) => b,
        }
    }

    pub async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.backend().complete(request).await
    }

    pub async fn health_check(&self) -> bool {
        self.backend().health_check().await
    }

    pub fn model(&self) -> &str {
        self.backend().model()
    }

    pub fn host(&self) -> &str {
        self.backend().host()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ai_client_mock() {
        let client = AIClient::mock();
        assert_eq!(client.model(), "mock");
        assert_eq!(client.host(), "mock://localhost");
        assert!(client.health_check().await);

        let reply = client
            .complete(&CompletionRequest::new("Diga oi"))
            .await
            .unwrap();
        assert!(!reply.is_empty());
    }

    #[tokio::test]
    async fn test_ai_client_with_model() {
        let client = AIClient::ollama("http://localhost:11434/", "llama3.2");
        let other = client.with_model("gemma3");
        assert_eq!(client.model(), "llama3.2");
        assert_eq!(other.model(), "gemma3");
        assert_eq!(other.host(), "http://localhost:11434");
    }
}
