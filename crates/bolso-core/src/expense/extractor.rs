//! Regex-based expense extraction
//!
//! Offline substitute for the model: first numeral is the amount, a keyword
//! table picks the category, and whatever text is left over becomes the
//! description.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::models::{ParsedExpense, DEFAULT_CATEGORY, DEFAULT_DESCRIPTION};

/// First number, with an optional two-digit decimal part ("50", "8,50", "12.90")
static AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:[.,]\d{2})?)").expect("valid regex"));

static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

/// Keywords that map a message onto a category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRule {
    pub category: String,
    /// Lower-case substrings
    pub keywords: Vec<String>,
}

impl CategoryRule {
    pub fn new(category: &str, keywords: &[&str]) -> Self {
        Self {
            category: category.to_string(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    fn matches(&self, text: &str) -> bool {
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }
}

fn default_rules() -> Vec<CategoryRule> {
    vec![
        CategoryRule::new("Alimentação", &["mercado", "comida", "alimentação"]),
        CategoryRule::new("Transporte", &["uber", "transporte", "gasolina"]),
        CategoryRule::new("Moradia", &["aluguel", "moradia", "casa"]),
        CategoryRule::new("Lazer", &["lazer", "cinema", "diversão"]),
        CategoryRule::new("Saúde", &["remédio", "saúde", "médico"]),
    ]
}

/// Rule-based expense extractor
#[derive(Debug, Clone)]
pub struct ExpenseTextExtractor {
    rules: Vec<CategoryRule>,
}

impl ExpenseTextExtractor {
    pub fn new() -> Self {
        Self {
            rules: default_rules(),
        }
    }

    /// Append a rule; earlier rules still win on overlap
    pub fn with_rule(mut self, rule: CategoryRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// First numeral in the text, decimal comma read as a point; 0 when absent
    pub fn extract_amount(&self, message: &str) -> f64 {
        AMOUNT_RE
            .captures(message)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().replace(',', ".").parse::<f64>().ok())
            .unwrap_or(0.0)
    }

    /// First rule whose keyword appears in the text, else "Outros"
    pub fn extract_category(&self, message: &str) -> String {
        let text = message.to_lowercase();
        self.rules
            .iter()
            .find(|r| r.matches(&text))
            .map(|r| r.category.clone())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
    }

    /// Message without digits, trimmed; "Despesa" when nothing is left
    pub fn extract_description(&self, message: &str) -> String {
        let stripped = DIGITS_RE.replace_all(message, "");
        let trimmed = stripped.trim();
        if trimmed.is_empty() {
            DEFAULT_DESCRIPTION.to_string()
        } else {
            trimmed.to_string()
        }
    }

    pub fn extract(&self, message: &str, today: NaiveDate) -> ParsedExpense {
        let amount = self.extract_amount(message);
        ParsedExpense {
            amount,
            category: self.extract_category(message),
            description: self.extract_description(message),
            date: today,
            is_valid: amount > 0.0,
        }
    }
}

impl Default for ExpenseTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}
