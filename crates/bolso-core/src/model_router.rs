//! Model Router for task-based model selection
//!
//! Each pipeline task (intent classification, expense extraction, reply
//! generation) gets its own model, output budget and sampling temperature.
//! Classification and extraction run near temperature zero to stay
//! deterministic; reply generation runs warmer.
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/bolso/config/models.toml)
//! 2. Fall back to embedded defaults (compiled into binary)

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::ai::RouterInfo;
use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/models.toml");

/// Task types for model routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskType {
    /// Message → intent JSON
    IntentClassification,
    /// Message → expense JSON
    ExpenseExtraction,
    /// Lead-in for answers to spending questions
    QuestionReply,
    /// Financial health analysis text
    FinancialAnalysis,
    /// Small talk
    Conversation,
}

impl TaskType {
    /// Get the config key for this task type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IntentClassification => "intent_classification",
            Self::ExpenseExtraction => "expense_extraction",
            Self::QuestionReply => "question_reply",
            Self::FinancialAnalysis => "financial_analysis",
            Self::Conversation => "conversation",
        }
    }

    /// Get all task types
    pub fn all() -> &'static [TaskType] {
        &[
            Self::IntentClassification,
            Self::ExpenseExtraction,
            Self::QuestionReply,
            Self::FinancialAnalysis,
            Self::Conversation,
        ]
    }

    /// Built-in limits used when the config file does not mention the task
    pub fn default_config(&self) -> TaskConfig {
        let (max_tokens, temperature) = match self {
            Self::IntentClassification => (300, 0.1),
            Self::ExpenseExtraction => (200, 0.1),
            Self::QuestionReply => (150, 0.7),
            Self::FinancialAnalysis => (500, 0.7),
            Self::Conversation => (300, 0.8),
        };
        TaskConfig {
            model: None,
            max_tokens,
            temperature,
        }
    }
}

impl std::str::FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown task type: {}", s))
    }
}

/// Configuration for a specific task type
#[derive(Debug, Clone, PartialEq)]
pub struct TaskConfig {
    /// Model override; None uses the router default or the backend's model
    pub model: Option<String>,
    /// Upper bound on generated tokens
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

/// Router configuration
#[derive(Debug, Clone, Default)]
pub struct RouterConfig {
    /// Default model for all task types
    pub default_model: Option<String>,
    /// Per-task configurations
    pub tasks: HashMap<TaskType, TaskConfig>,
}

/// Model Router for task-based model selection
#[derive(Debug, Clone)]
pub struct ModelRouter {
    config: RouterConfig,
}

impl ModelRouter {
    /// Create a new model router with default configuration
    pub fn new() -> Result<Self> {
        Ok(Self {
            config: load_config()?,
        })
    }

    /// Create with an explicit configuration (for testing)
    pub fn with_config(config: RouterConfig) -> Self {
        Self { config }
    }

    /// Get the full task configuration
    pub fn config_for_task(&self, task: TaskType) -> TaskConfig {
        self.config
            .tasks
            .get(&task)
            .cloned()
            .unwrap_or_else(|| task.default_config())
    }

    /// Model for a task: task override, then router default, then `backend_default`
    pub fn model_for_task(&self, task: TaskType, backend_default: &str) -> String {
        self.config
            .tasks
            .get(&task)
            .and_then(|c| c.model.clone())
            .or_else(|| self.config.default_model.clone())
            .unwrap_or_else(|| backend_default.to_string())
    }

    /// Summarize routing for display
    pub fn info(&self, backend_default: &str) -> RouterInfo {
        let default_model = self
            .config
            .default_model
            .clone()
            .unwrap_or_else(|| backend_default.to_string());
        let task_models = TaskType::all()
            .iter()
            .filter_map(|task| {
                self.config
                    .tasks
                    .get(task)
                    .and_then(|c| c.model.clone())
                    .filter(|m| *m != default_model)
                    .map(|m| (task.as_str().to_string(), m))
            })
            .collect();
        RouterInfo {
            default_model,
            task_models,
        }
    }
}

impl Default for ModelRouter {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self::with_config(RouterConfig::default()))
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("bolso").join("config").join("models.toml"))
}

/// Load configuration (override file first, then the embedded default)
fn load_config() -> Result<RouterConfig> {
    let content = match default_config_path() {
        Some(path) if path.exists() => fs::read_to_string(&path)
            .map_err(|e| Error::InvalidData(format!("Failed to read config: {}", e)))?,
        _ => DEFAULT_CONFIG.to_string(),
    };

    parse_config(&content)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    defaults: Option<RawDefaults>,
    models: Option<HashMap<String, RawTaskConfig>>,
}

#[derive(Debug, Deserialize)]
struct RawDefaults {
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTaskConfig {
    model: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

/// Parse config from TOML content
fn parse_config(content: &str) -> Result<RouterConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::InvalidData(format!("Invalid config TOML: {}", e)))?;

    let mut config = RouterConfig {
        default_model: raw.defaults.and_then(|d| d.model),
        ..Default::default()
    };

    if let Some(models) = raw.models {
        for (task_name, task_config) in models {
            let Ok(task) = task_name.parse::<TaskType>() else {
                continue; // Skip unknown task types
            };
            let defaults = task.default_config();

            config.tasks.insert(
                task,
                TaskConfig {
                    model: task_config.model,
                    max_tokens: task_config.max_tokens.unwrap_or(defaults.max_tokens),
                    temperature: task_config.temperature.unwrap_or(defaults.temperature),
                },
            );
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_config() {
        let config = parse_config(DEFAULT_CONFIG).unwrap();
        assert!(config.default_model.is_none());
        assert_eq!(config.tasks.len(), TaskType::all().len());
        let intent = &config.tasks[&TaskType::IntentClassification];
        assert_eq!(intent.max_tokens, 300);
        assert!(intent.temperature <= 0.1);
    }

    #[test]
    fn test_task_type_as_str() {
        assert_eq!(
            TaskType::IntentClassification.as_str(),
            "intent_classification"
        );
        assert_eq!(
            "expense_extraction".parse::<TaskType>().unwrap(),
            TaskType::ExpenseExtraction
        );
        assert!("vision".parse::<TaskType>().is_err());
    }

    #[test]
    fn test_router_model_selection() {
        let mut tasks = HashMap::new();
        tasks.insert(
            TaskType::IntentClassification,
            TaskConfig {
                model: Some("gpt-4o".to_string()),
                max_tokens: 300,
                temperature: 0.1,
            },
        );

        let router = ModelRouter::with_config(RouterConfig {
            default_model: None,
            tasks,
        });

        assert_eq!(
            router.model_for_task(TaskType::IntentClassification, "llama3.2"),
            "gpt-4o"
        );
        assert_eq!(
            router.model_for_task(TaskType::ExpenseExtraction, "llama3.2"),
            "llama3.2"
        );

        let info = router.info("llama3.2");
        assert_eq!(info.default_model, "llama3.2");
        assert_eq!(
            info.task_models,
            vec![("intent_classification".to_string(), "gpt-4o".to_string())]
        );
    }

    #[test]
    fn test_router_default_model_wins_over_backend() {
        let router = ModelRouter::with_config(RouterConfig {
            default_model: Some("gemma3".to_string()),
            tasks: HashMap::new(),
        });
        assert_eq!(
            router.model_for_task(TaskType::Conversation, "llama3.2"),
            "gemma3"
        );
    }

    #[test]
    fn test_missing_task_uses_builtin_limits() {
        let router = ModelRouter::with_config(RouterConfig::default());
        let config = router.config_for_task(TaskType::ExpenseExtraction);
        assert_eq!(config.max_tokens, 200);
        assert!((config.temperature - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn test_partial_task_config_keeps_defaults() {
        let config = parse_config(
            r#"
            [defaults]
            model = "qwen2.5"

            [models.conversation]
            temperature = 0.5

            [models.unknown_task]
            model = "ignored"
            "#,
        )
        .unwrap();
        assert_eq!(config.default_model.as_deref(), Some("qwen2.5"));
        let conversation = &config.tasks[&TaskType::Conversation];
        assert_eq!(conversation.max_tokens, 300);
        assert!((conversation.temperature - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.tasks.len(), 1);
    }
}
