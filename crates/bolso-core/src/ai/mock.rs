//! Mock backend for testing
//!
//! Answers classification and extraction prompts with JSON built from the
//! rule-based classifier and extractor, and everything else with a fixed
//! reply. Can be pinned to a single reply or made to fail.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Local;

use crate::error::{Error, Result};
use crate::expense::ExpenseTextExtractor;
use crate::intent::KeywordFallbackClassifier;

use super::types::CompletionRequest;
use super::AIBackend;

/// Reply used for free-text prompts
pub const MOCK_NARRATIVE_REPLY: &str = "Claro! Dei uma olhada nos seus números. 😊";

/// Mock AI backend for testing
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    /// Fixed reply for every request
    reply: Option<String>,
    /// Every completion fails
    failing: bool,
    /// Requests seen so far
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            ..Default::default()
        }
    }

    /// Create an unhealthy mock backend whose completions fail
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            failing: true,
            ..Default::default()
        }
    }

    /// Return `reply` verbatim for every request
    pub fn with_reply(reply: &str) -> Self {
        Self {
            healthy: true,
            reply: Some(reply.to_string()),
            ..Default::default()
        }
    }

    /// Requests received, oldest first
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn scripted(&self, prompt: &str) -> String {
        let today = Local::now().date_naive();
        let message = quoted_message(prompt).unwrap_or(prompt);

        if prompt.contains("Classifique a mensagem") {
            let analysis = KeywordFallbackClassifier::new().classify(message);
            serde_json::to_string(&analysis).unwrap_or_default()
        } else if prompt.contains("Extraia a despesa") {
            let parsed = ExpenseTextExtractor::new().extract(message, today);
            serde_json::to_string(&parsed).unwrap_or_default()
        } else {
            MOCK_NARRATIVE_REPLY.to_string()
        }
    }
}

/// Pull the text out of a `Mensagem: "..."` line
fn quoted_message(prompt: &str) -> Option<&str> {
    let line = prompt
        .lines()
        .find(|l| l.trim_start().starts_with("Mensagem: \""))?;
    let start = line.find('"')? + 1;
    let end = line.rfind('"')?;
    (start <= end).then(|| &line[start..end])
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        if let Ok(mut seen) = self.requests.lock() {
            seen.push(request.clone());
        }

        if self.failing {
            return Err(Error::Completion("mock backend is failing".into()));
        }

        Ok(self
            .reply
            .clone()
            .unwrap_or_else(|| self.scripted(&request.prompt)))
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_message() {
        let prompt = "Classifique a mensagem\n\nMensagem: \"gastei 50 no \"mercado\"\"\nfim";
        assert_eq!(quoted_message(prompt), Some("gastei 50 no \"mercado\""));
        assert_eq!(quoted_message("sem mensagem"), None);
    }

    #[tokio::test]
    async fn test_mock_classifies_with_keywords() {
        let backend = MockBackend::new();
        let reply = backend
            .complete(&CompletionRequest::new(
                "Classifique a mensagem do usuário.\nMensagem: \"gastei 50 no mercado\"",
            ))
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(json["type"], "expense");
        assert_eq!(backend.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_mock_extracts_expense() {
        let backend = MockBackend::new();
        let reply = backend
            .complete(&CompletionRequest::new(
                "Extraia a despesa da mensagem abaixo.\nMensagem: \"uber 23,50\"",
            ))
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(json["amount"], 23.5);
        assert_eq!(json["category"], "Transporte");
        assert_eq!(json["isValid"], true);
    }

    #[tokio::test]
    async fn test_mock_fixed_and_failing() {
        let fixed = MockBackend::with_reply("não é json");
        assert_eq!(
            fixed.complete(&CompletionRequest::new("x")).await.unwrap(),
            "não é json"
        );

        let failing = MockBackend::unhealthy();
        assert!(!failing.health_check().await);
        assert!(failing.complete(&CompletionRequest::new("x")).await.is_err());
        assert_eq!(failing.requests().len(), 1);
    }
}
