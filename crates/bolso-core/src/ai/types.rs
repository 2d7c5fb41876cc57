//! AI backend request types
//!
//! These types are backend-agnostic and used across all AI implementations.

use serde::Serialize;

/// A single completion call
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    /// Model to run; backends fall back to their default when empty
    pub model: String,
    /// Instruction text sent ahead of the prompt
    pub system: Option<String>,
    /// The task prompt
    pub prompt: String,
    /// Upper bound on generated tokens
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            model: String::new(),
            system: None,
            prompt: prompt.into(),
            max_tokens: 300,
            temperature: 0.1,
        }
    }
}

/// Router configuration information for display
#[derive(Debug, Clone)]
pub struct RouterInfo {
    /// Default model for all tasks
    pub default_model: String,
    /// Task-specific model overrides (only non-default)
    pub task_models: Vec<(String, String)>,
}
