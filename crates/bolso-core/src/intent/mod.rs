//! Intent classification
//!
//! The completion service gets the first try; anything short of a valid
//! intent JSON (no backend, transport error, empty reply, bad structure)
//! is replaced by the keyword classifier. Both paths return the same
//! `IntentAnalysis` shape.

mod fallback;

pub use fallback::KeywordFallbackClassifier;

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::ai::parsing::parse_intent_analysis;
use crate::ai::TaskRunner;
use crate::error::{Error, Result};
use crate::models::{CategoryVocabulary, IntentAnalysis, IntentType};
use crate::prompts::PromptId;

/// Set of intents the pipeline recognizes
///
/// The earliest assistant only knew expenses, reports and help; the full
/// taxonomy adds questions, analysis and conversation. `unknown` is always
/// part of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentTaxonomy {
    enabled: Vec<IntentType>,
}

impl IntentTaxonomy {
    pub fn full() -> Self {
        Self {
            enabled: IntentType::all().to_vec(),
        }
    }

    /// Expense, report and help only
    pub fn basic() -> Self {
        Self {
            enabled: vec![
                IntentType::Expense,
                IntentType::Report,
                IntentType::Help,
                IntentType::Unknown,
            ],
        }
    }

    pub fn allows(&self, kind: IntentType) -> bool {
        kind == IntentType::Unknown || self.enabled.contains(&kind)
    }

    pub fn intents(&self) -> impl Iterator<Item = IntentType> + '_ {
        IntentType::all()
            .iter()
            .copied()
            .filter(|k| self.allows(*k))
    }

    /// Demote an analysis whose type is outside the taxonomy to `unknown`
    pub fn narrow(&self, analysis: IntentAnalysis) -> IntentAnalysis {
        if self.allows(analysis.kind) {
            return analysis;
        }
        IntentAnalysis {
            kind: IntentType::Unknown,
            intent: IntentType::Unknown.label().to_string(),
            ..analysis
        }
    }

    /// One line per intent, for the classification prompt
    pub fn describe(&self) -> String {
        self.intents()
            .map(|kind| format!("- {}: {}", kind.as_str(), intent_hint(kind)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for IntentTaxonomy {
    fn default() -> Self {
        Self::full()
    }
}

fn intent_hint(kind: IntentType) -> &'static str {
    match kind {
        IntentType::Expense => {
            "registrar um gasto (ex: \"gastei 50 no mercado\", \"paguei 120 de luz\")"
        }
        IntentType::Report => "relatório ou total de gastos de um período (ex: \"quanto gastei este mês?\")",
        IntentType::Question => "pergunta específica sobre os gastos (ex: \"qual foi minha maior despesa?\")",
        IntentType::Analysis => "análise da saúde financeira, tendências ou comparações",
        IntentType::Conversation => "cumprimentos e conversa casual (ex: \"oi\", \"bom dia\")",
        IntentType::Help => "pedido de ajuda sobre como usar o assistente",
        IntentType::Unknown => "nenhuma das anteriores",
    }
}

/// Which path produced a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationSource {
    Model,
    Fallback,
}

/// Classifies chat messages, never failing outward
#[derive(Clone)]
pub struct IntentClassifier {
    runner: Option<TaskRunner>,
    fallback: KeywordFallbackClassifier,
    taxonomy: IntentTaxonomy,
    vocabulary: CategoryVocabulary,
}

impl IntentClassifier {
    /// `runner: None` means only the keyword rules run
    pub fn new(runner: Option<TaskRunner>) -> Self {
        Self {
            runner,
            fallback: KeywordFallbackClassifier::new(),
            taxonomy: IntentTaxonomy::full(),
            vocabulary: CategoryVocabulary::default(),
        }
    }

    pub fn with_taxonomy(mut self, taxonomy: IntentTaxonomy) -> Self {
        self.fallback = KeywordFallbackClassifier::with_taxonomy(taxonomy.clone());
        self.taxonomy = taxonomy;
        self
    }

    pub fn with_vocabulary(mut self, vocabulary: CategoryVocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    pub fn taxonomy(&self) -> &IntentTaxonomy {
        &self.taxonomy
    }

    /// Ask the completion service only; errors are returned, not replaced
    pub async fn try_classify(&self, message: &str, today: NaiveDate) -> Result<IntentAnalysis> {
        let runner = self
            .runner
            .as_ref()
            .ok_or_else(|| Error::Completion("No completion backend configured".into()))?;

        let today_str = today.format("%Y-%m-%d").to_string();
        let intent_types = self.taxonomy.describe();
        let categories = self.vocabulary.names().join(", ");

        let mut vars = HashMap::new();
        vars.insert("message", message);
        vars.insert("today", today_str.as_str());
        vars.insert("intent_types", intent_types.as_str());
        vars.insert("categories", categories.as_str());

        let reply = runner.run(PromptId::ClassifyIntent, &vars).await?;
        let analysis = parse_intent_analysis(&reply, today)?;
        Ok(self.taxonomy.narrow(analysis))
    }

    /// Classify and report which path answered
    pub async fn classify_with_source(
        &self,
        message: &str,
        today: NaiveDate,
    ) -> (IntentAnalysis, ClassificationSource) {
        match self.try_classify(message, today).await {
            Ok(analysis) => {
                debug!(intent = %analysis.kind, confidence = analysis.confidence, "Model classification");
                (analysis, ClassificationSource::Model)
            }
            Err(e) => {
                if self.runner.is_some() {
                    warn!(error = %e, "Intent classification failed, using keyword rules");
                }
                (self.fallback.classify(message), ClassificationSource::Fallback)
            }
        }
    }

    pub async fn classify(&self, message: &str, today: NaiveDate) -> IntentAnalysis {
        self.classify_with_source(message, today).await.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AIClient, MockBackend};
    use crate::model_router::{ModelRouter, RouterConfig};
    use crate::models::Period;
    use crate::prompts::PromptLibrary;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()
    }

    fn classifier(backend: MockBackend) -> (IntentClassifier, MockBackend) {
        let runner = TaskRunner::with_parts(
            AIClient::Mock(backend.clone()),
            ModelRouter::with_config(RouterConfig::default()),
            PromptLibrary::embedded_only(),
        );
        (IntentClassifier::new(Some(runner)), backend)
    }

    #[tokio::test]
    async fn test_model_reply_is_used() {
        let (classifier, _) = classifier(MockBackend::with_reply(
            r#"{"type": "question", "intent": "maior gasto", "parameters": {}, "confidence": 0.95}"#,
        ));
        let (analysis, source) = classifier
            .classify_with_source("qual foi meu maior gasto?", today())
            .await;
        assert_eq!(source, ClassificationSource::Model);
        assert_eq!(analysis.kind, IntentType::Question);
        assert_eq!(analysis.intent, "maior gasto");
    }

    #[tokio::test]
    async fn test_prompt_embeds_message_and_taxonomy() {
        let (classifier, backend) = classifier(MockBackend::new());
        classifier.classify("gastei 50 no mercado", today()).await;

        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        let prompt = &requests[0].prompt;
        assert!(prompt.contains("gastei 50 no mercado"));
        assert!(prompt.contains("- conversation:"));
        assert!(prompt.contains("2024-05-20"));
        assert!(requests[0].temperature <= 0.1);
        assert_eq!(requests[0].max_tokens, 300);
    }

    #[tokio::test]
    async fn test_malformed_reply_falls_back() {
        let (classifier, _) = classifier(MockBackend::with_reply("Desculpe, não entendi."));
        let (analysis, source) = classifier
            .classify_with_source("Quanto gastei esta semana?", today())
            .await;
        assert_eq!(source, ClassificationSource::Fallback);
        assert_eq!(analysis.kind, IntentType::Report);
        assert_eq!(analysis.parameters.period, Some(Period::Month));
        assert_eq!(analysis.confidence, 0.7);
    }

    #[tokio::test]
    async fn test_wrong_shape_falls_back_with_same_schema() {
        let (classifier, _) = classifier(MockBackend::with_reply(r#"{"intent": 42}"#));
        let analysis = classifier.classify("oi", today()).await;
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["type"], "conversation");
        assert!(json["intent"].is_string());
        assert!(json["parameters"].is_object());
        assert!(json["confidence"].is_number());
    }

    #[tokio::test]
    async fn test_failing_backend_falls_back() {
        let (classifier, _) = classifier(MockBackend::unhealthy());
        let analysis = classifier.classify("paguei 30 reais", today()).await;
        assert_eq!(analysis.kind, IntentType::Expense);
        assert_eq!(analysis.confidence, 0.8);
    }

    #[tokio::test]
    async fn test_no_backend_uses_keywords() {
        let classifier = IntentClassifier::new(None);
        assert!(classifier.try_classify("ajuda", today()).await.is_err());
        assert_eq!(
            classifier.classify("ajuda", today()).await.kind,
            IntentType::Help
        );
    }

    #[tokio::test]
    async fn test_basic_taxonomy_narrows_model_output() {
        let (classifier, backend) = classifier(MockBackend::with_reply(
            r#"{"type": "analysis", "confidence": 0.9}"#,
        ));
        let classifier = classifier.with_taxonomy(IntentTaxonomy::basic());
        let analysis = classifier.classify("analise meus gastos", today()).await;
        assert_eq!(analysis.kind, IntentType::Unknown);
        assert_eq!(analysis.confidence, 0.9);
        assert!(!backend.requests()[0].prompt.contains("- analysis:"));
    }
}
