//! Bolso Core Library
//!
//! Shared functionality for the MeuBolso expense chat assistant:
//! - Record store (users, categories, expenses) on encrypted SQLite
//! - Intent classification with a keyword fallback
//! - Expense extraction from free text, with or without a model
//! - Period and category query resolution
//! - Financial reports, summaries and insight rules
//! - Message routing from inbound text to reply texts
//! - Pluggable completion backends (Ollama, OpenAI-compatible, mock)
//! - Model router and prompt library

pub mod ai;
pub mod dates;
pub mod db;
pub mod error;
pub mod expense;
pub mod intent;
pub mod model_router;
pub mod models;
pub mod prompts;
pub mod query;
pub mod report;
pub mod router;
pub mod store;

/// Test utilities including a mock completion server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{
    AIBackend, AIClient, CompletionRequest, MockBackend, OllamaBackend, OpenAICompatibleBackend,
    TaskRunner,
};
pub use db::Database;
pub use error::{Error, Result};
pub use expense::{split_expenses, ExpenseParser, ExpenseTextExtractor};
pub use intent::{ClassificationSource, IntentClassifier, IntentTaxonomy, KeywordFallbackClassifier};
pub use model_router::{ModelRouter, RouterConfig, TaskConfig, TaskType};
pub use models::{
    AnalysisType, Category, CategoryVocabulary, Expense, IntentAnalysis, IntentParameters,
    IntentType, NewExpense, ParsedExpense, Period, Report, User,
};
pub use prompts::{Prompt, PromptId, PromptInfo, PromptLibrary};
pub use query::{ExpenseQueryEngine, QueryFilter, QueryParameterResolver};
pub use report::{ReportGenerator, ReportOptions};
pub use router::{IntentRouter, RouterResponse};
pub use store::RecordStore;
