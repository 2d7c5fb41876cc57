//! Keyword-based intent classification
//!
//! Used whenever the completion service is missing, fails, or answers with
//! something that does not parse. Rules run in a fixed priority order over
//! the lower-cased message and the first match wins, so "quanto gastei 50"
//! is an expense even though it also matches the report keywords.

use tracing::debug;

use crate::models::{AnalysisType, IntentAnalysis, IntentParameters, IntentType, Period};

use super::IntentTaxonomy;

/// Verbs and markers that signal a spend; only count alongside a numeral
const EXPENSE_KEYWORDS: &[&str] = &[
    "gastei", "paguei", "comprei", "gasto", "despesa", "valor", "reais", "r$",
];

const REPORT_KEYWORDS: &[&str] = &[
    "quanto",
    "gastei",
    "relatório",
    "resumo",
    "total",
    "hoje",
    "mês",
    "semana",
];

const ANALYSIS_KEYWORDS: &[&str] = &[
    "analise",
    "análise",
    "saúde financeira",
    "saude financeira",
    "como estou",
    "avaliação",
    "avaliacao",
    "insights",
    "tendências",
    "tendencias",
];

const CONVERSATION_KEYWORDS: &[&str] = &[
    "oi",
    "olá",
    "ola",
    "como você está",
    "como voce esta",
    "conte sobre",
    "me fale",
    "bom dia",
    "boa tarde",
    "boa noite",
];

const HELP_KEYWORDS: &[&str] = &["ajuda", "help"];

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

/// Deterministic, offline intent classifier
#[derive(Debug, Clone, Default)]
pub struct KeywordFallbackClassifier {
    taxonomy: IntentTaxonomy,
}

impl KeywordFallbackClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip rules for intents outside `taxonomy`
    pub fn with_taxonomy(taxonomy: IntentTaxonomy) -> Self {
        Self { taxonomy }
    }

    pub fn classify(&self, message: &str) -> IntentAnalysis {
        let text = message.to_lowercase();
        let has_numeral = text.chars().any(|c| c.is_ascii_digit());

        let rules: [(IntentType, bool); 5] = [
            (
                IntentType::Expense,
                has_numeral && contains_any(&text, EXPENSE_KEYWORDS),
            ),
            (IntentType::Report, contains_any(&text, REPORT_KEYWORDS)),
            (IntentType::Analysis, contains_any(&text, ANALYSIS_KEYWORDS)),
            (
                IntentType::Conversation,
                contains_any(&text, CONVERSATION_KEYWORDS),
            ),
            (IntentType::Help, contains_any(&text, HELP_KEYWORDS)),
        ];

        let kind = rules
            .iter()
            .find(|(kind, matched)| *matched && self.taxonomy.allows(*kind))
            .map(|(kind, _)| *kind)
            .unwrap_or(IntentType::Unknown);

        debug!(intent = %kind, "Keyword classification");
        Self::analysis_for(kind)
    }

    fn analysis_for(kind: IntentType) -> IntentAnalysis {
        match kind {
            IntentType::Expense => IntentAnalysis::new(kind, 0.8),
            IntentType::Report => IntentAnalysis::new(kind, 0.7).with_parameters(IntentParameters {
                period: Some(Period::Month),
                ..Default::default()
            }),
            IntentType::Analysis => {
                IntentAnalysis::new(kind, 0.8).with_parameters(IntentParameters {
                    analysis_type: Some(AnalysisType::Health),
                    ..Default::default()
                })
            }
            IntentType::Conversation | IntentType::Help => IntentAnalysis::new(kind, 0.9),
            IntentType::Question | IntentType::Unknown => {
                IntentAnalysis::new(IntentType::Unknown, 0.1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(message: &str) -> IntentAnalysis {
        KeywordFallbackClassifier::new().classify(message)
    }

    #[test]
    fn test_expense_needs_numeral_and_keyword() {
        for message in [
            "gastei 50 no mercado",
            "Paguei 120 de luz",
            "comprei pão por 8,50",
            "R$ 30 farmácia",
            "despesa 15",
        ] {
            let analysis = classify(message);
            assert_eq!(analysis.kind, IntentType::Expense, "{}", message);
            assert_eq!(analysis.confidence, 0.8);
            assert_eq!(analysis.intent, "registrar despesa");
        }
    }

    #[test]
    fn test_expense_wins_over_report() {
        let analysis = classify("quanto gastei 50 hoje");
        assert_eq!(analysis.kind, IntentType::Expense);
    }

    #[test]
    fn test_report_defaults_to_month() {
        let analysis = classify("Quanto gastei este mês?");
        assert_eq!(analysis.kind, IntentType::Report);
        assert_eq!(analysis.confidence, 0.7);
        assert_eq!(analysis.parameters.period, Some(Period::Month));

        // spend verb without a numeral is a report
        assert_eq!(classify("gastei muito").kind, IntentType::Report);
    }

    #[test]
    fn test_analysis_defaults_to_health() {
        let analysis = classify("Como está minha saúde financeira?");
        assert_eq!(analysis.kind, IntentType::Analysis);
        assert_eq!(analysis.confidence, 0.8);
        assert_eq!(analysis.parameters.analysis_type, Some(AnalysisType::Health));
    }

    #[test]
    fn test_conversation_and_help() {
        let greeting = classify("Bom dia!");
        assert_eq!(greeting.kind, IntentType::Conversation);
        assert_eq!(greeting.confidence, 0.9);

        let help = classify("AJUDA");
        assert_eq!(help.kind, IntentType::Help);
        assert_eq!(help.confidence, 0.9);
    }

    #[test]
    fn test_unknown() {
        let analysis = classify("xyz");
        assert_eq!(analysis.kind, IntentType::Unknown);
        assert_eq!(analysis.confidence, 0.1);
        assert_eq!(analysis.intent, "não identificado");
        assert_eq!(analysis.parameters, IntentParameters::default());
    }

    #[test]
    fn test_basic_taxonomy_skips_disabled_rules() {
        let classifier = KeywordFallbackClassifier::with_taxonomy(IntentTaxonomy::basic());
        assert_eq!(classifier.classify("bom dia").kind, IntentType::Unknown);
        assert_eq!(classifier.classify("análise, ajuda").kind, IntentType::Help);
        assert_eq!(classifier.classify("gastei 10").kind, IntentType::Expense);
    }
}
