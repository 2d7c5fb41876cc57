//! Domain models for Bolso

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Category assigned when nothing else matches
pub const DEFAULT_CATEGORY: &str = "Outros";

/// Description used when the message carries nothing but the amount
pub const DEFAULT_DESCRIPTION: &str = "Despesa";

/// Built-in category vocabulary, seeded into the store on init
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Alimentação",
    "Transporte",
    "Moradia",
    "Lazer",
    "Saúde",
    DEFAULT_CATEGORY,
];

/// A chat user, identified by the sender phone
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub phone: String,
    /// Display name used to personalize replies
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An expense category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// A recorded expense, with its category name joined in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub user_id: i64,
    pub description: String,
    pub category_id: Option<i64>,
    pub category_name: String,
    pub amount: f64,
    pub date: NaiveDate,
}

/// Input for recording an expense
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub user_id: i64,
    pub description: String,
    pub category_id: Option<i64>,
    pub amount: f64,
    pub date: NaiveDate,
}

/// Structured expense extracted from a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedExpense {
    /// Amount in BRL, never negative
    pub amount: f64,
    pub category: String,
    pub description: String,
    pub date: NaiveDate,
    /// False when the extraction cannot be recorded (no usable amount)
    pub is_valid: bool,
}

/// Closed category vocabulary used by extraction prompts and fallbacks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryVocabulary {
    names: Vec<String>,
}

impl CategoryVocabulary {
    /// Create a vocabulary from names; the default category is always present
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut vocab = Self { names: Vec::new() };
        for name in names {
            vocab.push(name.into());
        }
        vocab.push(DEFAULT_CATEGORY.to_string());
        vocab
    }

    /// Add a category, ignoring case-insensitive duplicates
    pub fn with_category(mut self, name: &str) -> Self {
        self.push(name.to_string());
        self
    }

    fn push(&mut self, name: String) {
        let name = name.trim().to_string();
        if !name.is_empty() && self.canonical(&name).is_none() {
            self.names.push(name);
        }
    }

    /// Find the vocabulary spelling of a category name (case-insensitive)
    pub fn canonical(&self, name: &str) -> Option<&str> {
        let wanted = name.trim().to_lowercase();
        self.names
            .iter()
            .find(|n| n.to_lowercase() == wanted)
            .map(String::as_str)
    }

    /// Map any name onto the vocabulary, defaulting to "Outros"
    pub fn normalize(&self, name: &str) -> String {
        self.canonical(name).unwrap_or(DEFAULT_CATEGORY).to_string()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl Default for CategoryVocabulary {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORIES.iter().copied())
    }
}

/// What a chat message asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentType {
    /// Record an expense
    Expense,
    /// Spending report for a period
    Report,
    /// Direct question about spending
    Question,
    /// Financial health or trend analysis
    Analysis,
    /// Greeting or small talk
    Conversation,
    Help,
    Unknown,
}

impl IntentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Report => "report",
            Self::Question => "question",
            Self::Analysis => "analysis",
            Self::Conversation => "conversation",
            Self::Help => "help",
            Self::Unknown => "unknown",
        }
    }

    pub fn all() -> &'static [IntentType] {
        &[
            Self::Expense,
            Self::Report,
            Self::Question,
            Self::Analysis,
            Self::Conversation,
            Self::Help,
            Self::Unknown,
        ]
    }

    /// Short Portuguese label used when no intent text is available
    pub fn label(&self) -> &'static str {
        match self {
            Self::Expense => "registrar despesa",
            Self::Report => "consultar gastos",
            Self::Question => "pergunta sobre gastos",
            Self::Analysis => "análise financeira",
            Self::Conversation => "conversa",
            Self::Help => "ajuda",
            Self::Unknown => "não identificado",
        }
    }
}

impl std::str::FromStr for IntentType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "expense" => Ok(Self::Expense),
            "report" => Ok(Self::Report),
            "question" => Ok(Self::Question),
            "analysis" => Ok(Self::Analysis),
            "conversation" => Ok(Self::Conversation),
            "help" => Ok(Self::Help),
            "unknown" => Ok(Self::Unknown),
            _ => Err(format!("Unknown intent type: {}", s)),
        }
    }
}

impl std::fmt::Display for IntentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Time period named in a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Today,
    Week,
    Month,
    Year,
    Custom,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
            Self::Custom => "custom",
        }
    }

    /// Portuguese phrase used in report headers
    pub fn label(&self) -> &'static str {
        match self {
            Self::Today => "hoje",
            Self::Week => "últimos 7 dias",
            Self::Month => "este mês",
            Self::Year => "este ano",
            Self::Custom => "período personalizado",
        }
    }
}

impl std::str::FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "today" | "hoje" => Ok(Self::Today),
            "week" | "semana" => Ok(Self::Week),
            "month" | "mes" | "mês" => Ok(Self::Month),
            "year" | "ano" => Ok(Self::Year),
            "custom" => Ok(Self::Custom),
            _ => Err(format!("Unknown period: {}", s)),
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of analysis requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    Health,
    Trends,
    Categories,
    Comparison,
}

impl AnalysisType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::Trends => "trends",
            Self::Categories => "categories",
            Self::Comparison => "comparison",
        }
    }
}

impl std::str::FromStr for AnalysisType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "health" => Ok(Self::Health),
            "trends" => Ok(Self::Trends),
            "categories" => Ok(Self::Categories),
            "comparison" => Ok(Self::Comparison),
            _ => Err(format!("Unknown analysis type: {}", s)),
        }
    }
}

/// Parameters extracted alongside an intent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specific_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_type: Option<AnalysisType>,
}

/// Classified chat message
///
/// Both the model path and the keyword fallback produce this shape, so
/// nothing downstream can tell which one ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentAnalysis {
    #[serde(rename = "type")]
    pub kind: IntentType,
    /// Free-text description of the intent
    pub intent: String,
    #[serde(default)]
    pub parameters: IntentParameters,
    /// Always within [0, 1]
    pub confidence: f64,
}

impl IntentAnalysis {
    /// Create an analysis with the default label and no parameters
    pub fn new(kind: IntentType, confidence: f64) -> Self {
        Self {
            kind,
            intent: kind.label().to_string(),
            parameters: IntentParameters::default(),
            confidence: clamp_confidence(confidence),
        }
    }

    pub fn with_parameters(mut self, parameters: IntentParameters) -> Self {
        self.parameters = parameters;
        self
    }
}

/// Clamp a confidence score into [0, 1]; NaN becomes 0
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// One line of the per-category breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdownEntry {
    pub category: String,
    pub amount: f64,
    /// Share of the total, 0 when the total is 0
    pub percentage: f64,
}

/// Aggregated view over an expense set
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub total: f64,
    pub count: usize,
    /// Ordered by amount, largest first
    pub by_category: Vec<CategoryBreakdownEntry>,
    /// At most three, largest first
    pub top_expenses: Vec<Expense>,
    pub insights: Vec<String>,
}
