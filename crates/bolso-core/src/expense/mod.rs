//! Expense extraction from chat messages
//!
//! `ExpenseParser` asks the completion service first and falls back to
//! `ExpenseTextExtractor` on any failure. The date is always the day the
//! message is handled.

mod extractor;
mod split;

pub use extractor::{CategoryRule, ExpenseTextExtractor};
pub use split::split_expenses;

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::ai::parsing::parse_parsed_expense;
use crate::ai::TaskRunner;
use crate::error::{Error, Result};
use crate::models::{CategoryVocabulary, ParsedExpense};
use crate::prompts::PromptId;

/// Multiplier applied to amounts stated in US dollars
pub const USD_TO_BRL: f64 = 5.2;

/// Turns a message naming one expense into a `ParsedExpense`
#[derive(Clone)]
pub struct ExpenseParser {
    runner: Option<TaskRunner>,
    extractor: ExpenseTextExtractor,
    vocabulary: CategoryVocabulary,
    usd_rate: f64,
}

impl ExpenseParser {
    /// `runner: None` means only the regex extractor runs
    pub fn new(runner: Option<TaskRunner>) -> Self {
        Self {
            runner,
            extractor: ExpenseTextExtractor::new(),
            vocabulary: CategoryVocabulary::default(),
            usd_rate: USD_TO_BRL,
        }
    }

    pub fn with_vocabulary(mut self, vocabulary: CategoryVocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    pub fn with_extractor(mut self, extractor: ExpenseTextExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_usd_rate(mut self, rate: f64) -> Self {
        self.usd_rate = rate;
        self
    }

    pub fn vocabulary(&self) -> &CategoryVocabulary {
        &self.vocabulary
    }

    /// Ask the completion service only; errors are returned, not replaced
    pub async fn try_parse(&self, message: &str, today: NaiveDate) -> Result<ParsedExpense> {
        let runner = self
            .runner
            .as_ref()
            .ok_or_else(|| Error::Completion("No completion backend configured".into()))?;

        let today_str = today.format("%Y-%m-%d").to_string();
        let usd_rate = self.usd_rate.to_string();
        let categories = self.vocabulary.names().join(", ");

        let mut vars = HashMap::new();
        vars.insert("message", message);
        vars.insert("today", today_str.as_str());
        vars.insert("usd_rate", usd_rate.as_str());
        vars.insert("categories", categories.as_str());

        let reply = runner.run(PromptId::ParseExpense, &vars).await?;
        parse_parsed_expense(&reply, today, &self.vocabulary)
    }

    /// Parse one expense, never failing outward
    pub async fn parse(&self, message: &str, today: NaiveDate) -> ParsedExpense {
        match self.try_parse(message, today).await {
            Ok(parsed) => {
                debug!(amount = parsed.amount, category = %parsed.category, "Model extraction");
                parsed
            }
            Err(e) => {
                if self.runner.is_some() {
                    warn!(error = %e, "Expense extraction failed, using regex extractor");
                }
                let mut parsed = self.extractor.extract(message, today);
                parsed.category = self.vocabulary.normalize(&parsed.category);
                parsed
            }
        }
    }

    /// Parse every expense named in the message, in order
    pub async fn parse_all(&self, message: &str, today: NaiveDate) -> Vec<ParsedExpense> {
        let mut parsed = Vec::new();
        for part in split_expenses(message) {
            parsed.push(self.parse(&part, today).await);
        }
        parsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AIClient, MockBackend};
    use crate::model_router::{ModelRouter, RouterConfig};
    use crate::prompts::PromptLibrary;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()
    }

    fn parser(backend: MockBackend) -> ExpenseParser {
        ExpenseParser::new(Some(TaskRunner::with_parts(
            AIClient::Mock(backend),
            ModelRouter::with_config(RouterConfig::default()),
            PromptLibrary::embedded_only(),
        )))
    }

    #[tokio::test]
    async fn test_model_extraction() {
        let backend = MockBackend::with_reply(
            r#"{"amount": 52.0, "category": "Lazer", "description": "ingresso show", "date": "2023-01-01", "isValid": true}"#,
        );
        let parser = parser(backend.clone());
        let parsed = parser.parse("gastei 10 dólares no show", today()).await;
        assert_eq!(parsed.amount, 52.0);
        assert_eq!(parsed.category, "Lazer");
        assert_eq!(parsed.date, today());

        let prompt = &backend.requests()[0].prompt;
        assert!(prompt.contains("5.2"));
        assert!(prompt.contains("Alimentação, Transporte"));
        assert!(prompt.contains("gastei 10 dólares no show"));
    }

    #[tokio::test]
    async fn test_unparsable_reply_falls_back() {
        let parsed = parser(MockBackend::with_reply("cinquenta reais"))
            .parse("gastei 50 no mercado", today())
            .await;
        assert_eq!(parsed.amount, 50.0);
        assert_eq!(parsed.category, "Alimentação");
        assert!(parsed.is_valid);
    }

    #[tokio::test]
    async fn test_failing_backend_falls_back() {
        let parsed = parser(MockBackend::unhealthy())
            .parse("uber 18,90", today())
            .await;
        assert_eq!(parsed.amount, 18.9);
        assert_eq!(parsed.category, "Transporte");
    }

    #[tokio::test]
    async fn test_no_backend_invalid_expense() {
        let parsed = ExpenseParser::new(None)
            .parse("gastei no mercado", today())
            .await;
        assert!(!parsed.is_valid);
        assert_eq!(parsed.amount, 0.0);
    }

    #[tokio::test]
    async fn test_custom_usd_rate_in_prompt() {
        let backend = MockBackend::with_reply(r#"{"amount": 1}"#);
        let parser = parser(backend.clone()).with_usd_rate(5.75);
        parser.parse("paguei 1 dólar", today()).await;
        assert!(backend.requests()[0].prompt.contains("5.75"));
    }

    #[tokio::test]
    async fn test_parse_all_splits_message() {
        let parsed = ExpenseParser::new(None)
            .parse_all("gastei 30 no uber, gastei 50 no mercado", today())
            .await;
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].category, "Transporte");
        assert_eq!(parsed[1].amount, 50.0);
    }

    #[tokio::test]
    async fn test_fallback_category_follows_vocabulary() {
        let extractor = ExpenseTextExtractor::new()
            .with_rule(CategoryRule::new("Educação", &["curso"]));
        let parsed = ExpenseParser::new(None)
            .with_extractor(extractor)
            .parse("curso 200", today())
            .await;
        // not in the vocabulary, so it collapses to the default
        assert_eq!(parsed.category, "Outros");

        let extractor = ExpenseTextExtractor::new()
            .with_rule(CategoryRule::new("Educação", &["curso"]));
        let parsed = ExpenseParser::new(None)
            .with_extractor(extractor)
            .with_vocabulary(CategoryVocabulary::default().with_category("Educação"))
            .parse("curso 200", today())
            .await;
        assert_eq!(parsed.category, "Educação");
    }
}
