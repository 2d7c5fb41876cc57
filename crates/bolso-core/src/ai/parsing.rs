//! JSON parsing helpers for AI backend responses
//!
//! These functions extract JSON from AI model responses, which often include
//! extra text before/after the JSON payload, and validate it against the
//! shapes the pipeline expects. Any deviation is an error so the caller can
//! substitute its rule-based fallback.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use crate::dates::parse_loose_date;
use crate::error::{Error, Result};
use crate::models::{
    clamp_confidence, AnalysisType, CategoryVocabulary, IntentAnalysis, IntentParameters,
    IntentType, ParsedExpense, Period, DEFAULT_CATEGORY, DEFAULT_DESCRIPTION,
};

/// Maximum characters of raw model output quoted in error messages
const RAW_PREVIEW_CHARS: usize = 200;

fn preview(raw: &str) -> String {
    if raw.chars().count() > RAW_PREVIEW_CHARS {
        let cut: String = raw.chars().take(RAW_PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        raw.to_string()
    }
}

/// Slice the JSON object out of a model reply (first `{` to last `}`)
pub fn extract_json(response: &str) -> Result<&str> {
    let response = response.trim();
    let start = response.find('{');
    let end = response.rfind('}');

    match (start, end) {
        (Some(s), Some(e)) if s < e => Ok(&response[s..=e]),
        _ => Err(Error::InvalidData(format!(
            "No JSON found in AI response | Raw: {}",
            preview(response)
        ))),
    }
}

fn parse_object<'a, T: Deserialize<'a>>(json_str: &'a str, what: &str) -> Result<T> {
    serde_json::from_str(json_str).map_err(|e| {
        Error::InvalidData(format!(
            "Invalid {} JSON from AI: {} | Raw: {}",
            what,
            e,
            preview(json_str)
        ))
    })
}

#[derive(Debug, Deserialize)]
struct RawIntent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    intent: Option<String>,
    #[serde(default)]
    parameters: Option<RawParameters>,
    confidence: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawParameters {
    period: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    specific_date: Option<String>,
    category: Option<String>,
    amount: Option<Value>,
    description: Option<String>,
    analysis_type: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Read a number that may arrive as a JSON number or a numeric string ("50,90")
fn number_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

impl RawParameters {
    fn into_parameters(self, today: NaiveDate) -> IntentParameters {
        let date = |s: Option<String>| non_empty(s).and_then(|s| parse_loose_date(&s, today));
        IntentParameters {
            period: non_empty(self.period).and_then(|p| p.parse::<Period>().ok()),
            start_date: date(self.start_date),
            end_date: date(self.end_date),
            specific_date: date(self.specific_date),
            category: non_empty(self.category),
            amount: self.amount.as_ref().and_then(number_value),
            description: non_empty(self.description),
            analysis_type: non_empty(self.analysis_type).and_then(|a| a.parse::<AnalysisType>().ok()),
        }
    }
}

/// Parse an intent classification reply
///
/// `type` and `confidence` are required. An unrecognized type becomes
/// `unknown` rather than an error; unrecognized parameter values are dropped.
pub fn parse_intent_analysis(response: &str, today: NaiveDate) -> Result<IntentAnalysis> {
    let json_str = extract_json(response)?;
    let raw: RawIntent = parse_object(json_str, "intent")?;

    if !raw.confidence.is_finite() {
        return Err(Error::InvalidData("Intent confidence is not a number".into()));
    }

    let kind = raw.kind.parse::<IntentType>().unwrap_or(IntentType::Unknown);
    let intent = non_empty(raw.intent).unwrap_or_else(|| kind.label().to_string());

    Ok(IntentAnalysis {
        kind,
        intent,
        parameters: raw
            .parameters
            .unwrap_or_default()
            .into_parameters(today),
        confidence: clamp_confidence(raw.confidence),
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExpense {
    amount: Value,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    is_valid: Option<bool>,
}

/// Parse an expense extraction reply
///
/// The date is always `today` whatever the model says. Categories outside
/// the vocabulary collapse to "Outros".
pub fn parse_parsed_expense(
    response: &str,
    today: NaiveDate,
    vocabulary: &CategoryVocabulary,
) -> Result<ParsedExpense> {
    let json_str = extract_json(response)?;
    let raw: RawExpense = parse_object(json_str, "expense")?;

    let amount = number_value(&raw.amount)
        .ok_or_else(|| Error::InvalidData(format!("Expense amount is not a number: {}", raw.amount)))?;
    if amount < 0.0 {
        return Err(Error::InvalidData(format!("Negative expense amount: {}", amount)));
    }

    let category = non_empty(raw.category)
        .map(|c| vocabulary.normalize(&c))
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
    let description = non_empty(raw.description).unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());

    Ok(ParsedExpense {
        amount,
        category,
        description,
        date: today,
        is_valid: raw.is_valid.unwrap_or(true) && amount > 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()
    }

    #[test]
    fn test_extract_json_with_surrounding_text() {
        let response = "Claro! Aqui está:\n{\"type\": \"help\", \"confidence\": 0.9}\nAbraço";
        assert_eq!(
            extract_json(response).unwrap(),
            "{\"type\": \"help\", \"confidence\": 0.9}"
        );
        assert!(extract_json("sem json aqui").is_err());
        assert!(extract_json("} ao contrário {").is_err());
    }

    #[test]
    fn test_preview_is_char_safe() {
        let long = "ç".repeat(300);
        let p = preview(&long);
        assert!(p.ends_with("..."));
        assert_eq!(p.chars().count(), RAW_PREVIEW_CHARS + 3);
    }

    #[test]
    fn test_parse_full_intent() {
        let response = r#"{
            "type": "report",
            "intent": "relatório do mês",
            "parameters": {"period": "month", "category": "Alimentação", "specificDate": "2024-05-01"},
            "confidence": 0.92
        }"#;
        let analysis = parse_intent_analysis(response, today()).unwrap();
        assert_eq!(analysis.kind, IntentType::Report);
        assert_eq!(analysis.intent, "relatório do mês");
        assert_eq!(analysis.parameters.period, Some(Period::Month));
        assert_eq!(analysis.parameters.category.as_deref(), Some("Alimentação"));
        assert_eq!(
            analysis.parameters.specific_date,
            NaiveDate::from_ymd_opt(2024, 5, 1)
        );
        assert!((analysis.confidence - 0.92).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_type_maps_to_unknown() {
        let analysis =
            parse_intent_analysis(r#"{"type": "transfer", "confidence": 0.6}"#, today()).unwrap();
        assert_eq!(analysis.kind, IntentType::Unknown);
        assert_eq!(analysis.intent, "não identificado");
    }

    #[test]
    fn test_intent_requires_confidence() {
        assert!(parse_intent_analysis(r#"{"type": "expense"}"#, today()).is_err());
        assert!(parse_intent_analysis(r#"{"confidence": 0.5}"#, today()).is_err());
    }

    #[test]
    fn test_intent_drops_unparseable_parameters() {
        let response = r#"{"type": "report", "confidence": 3,
            "parameters": {"period": "fortnight", "startDate": "semana passada", "amount": "12,50", "analysisType": "vibes"}}"#;
        let analysis = parse_intent_analysis(response, today()).unwrap();
        assert_eq!(analysis.confidence, 1.0);
        assert_eq!(analysis.parameters.period, None);
        assert_eq!(analysis.parameters.start_date, None);
        assert_eq!(analysis.parameters.amount, Some(12.5));
        assert_eq!(analysis.parameters.analysis_type, None);
    }

    #[test]
    fn test_parse_expense_forces_today() {
        let vocab = CategoryVocabulary::default();
        let response = r#"{"amount": 25.5, "category": "transporte", "description": "uber", "date": "2020-01-01", "isValid": true}"#;
        let parsed = parse_parsed_expense(response, today(), &vocab).unwrap();
        assert_eq!(parsed.amount, 25.5);
        assert_eq!(parsed.category, "Transporte");
        assert_eq!(parsed.description, "uber");
        assert_eq!(parsed.date, today());
        assert!(parsed.is_valid);
    }

    #[test]
    fn test_parse_expense_defaults() {
        let vocab = CategoryVocabulary::default();
        let parsed =
            parse_parsed_expense(r#"{"amount": "0", "category": "Pets"}"#, today(), &vocab).unwrap();
        assert_eq!(parsed.category, "Outros");
        assert_eq!(parsed.description, "Despesa");
        assert!(!parsed.is_valid);
    }

    #[test]
    fn test_parse_expense_rejects_bad_amounts() {
        let vocab = CategoryVocabulary::default();
        assert!(parse_parsed_expense(r#"{"amount": -3}"#, today(), &vocab).is_err());
        assert!(parse_parsed_expense(r#"{"amount": "cinquenta"}"#, today(), &vocab).is_err());
        assert!(parse_parsed_expense(r#"{"category": "Lazer"}"#, today(), &vocab).is_err());
    }
}
