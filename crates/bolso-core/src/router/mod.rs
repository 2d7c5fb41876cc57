//! Message routing
//!
//! `IntentRouter` is the entry point for one inbound chat message: it
//! records multi-expense messages directly, otherwise classifies the
//! message and dispatches to expense recording, reports, answers,
//! analysis, conversation or help. Every path ends in reply text; store
//! failures are logged and turned into generic messages.

pub mod messages;
mod narrative;

pub use narrative::{expense_digest, Narrator};

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::ai::TaskRunner;
use crate::error::Result;
use crate::expense::{split_expenses, ExpenseParser};
use crate::intent::{IntentClassifier, IntentTaxonomy};
use crate::models::{
    AnalysisType, CategoryVocabulary, Expense, IntentAnalysis, IntentType, NewExpense,
    ParsedExpense, User,
};
use crate::query::ExpenseQueryEngine;
use crate::report::ReportGenerator;
use crate::store::RecordStore;

use messages::{
    error_message, expense_confirmation, multi_expense_summary, EXPENSE_FAILURE,
    HELP_MESSAGE, INVALID_EXPENSE, NO_VALID_EXPENSES, QUESTION_FAILURE, REPORT_FAILURE,
};

/// Outcome of handling one message
#[derive(Debug, Clone, Serialize)]
pub struct RouterResponse {
    pub intent: IntentAnalysis,
    /// Texts to send back, in order
    pub replies: Vec<String>,
}

impl RouterResponse {
    fn new(intent: IntentAnalysis, replies: Vec<String>) -> Self {
        Self { intent, replies }
    }
}

/// Dispatches classified messages to the pipeline stages
pub struct IntentRouter {
    store: Arc<dyn RecordStore>,
    classifier: IntentClassifier,
    parser: ExpenseParser,
    engine: ExpenseQueryEngine,
    reports: ReportGenerator,
    narrator: Narrator,
}

impl IntentRouter {
    /// `runner: None` runs the keyword and regex fallbacks only
    pub fn new(store: Arc<dyn RecordStore>, runner: Option<TaskRunner>) -> Self {
        Self {
            classifier: IntentClassifier::new(runner.clone()),
            parser: ExpenseParser::new(runner.clone()),
            engine: ExpenseQueryEngine::new(store.clone()),
            reports: ReportGenerator::new(),
            narrator: Narrator::new(runner),
            store,
        }
    }

    pub fn with_taxonomy(mut self, taxonomy: IntentTaxonomy) -> Self {
        self.classifier = self.classifier.with_taxonomy(taxonomy);
        self
    }

    /// Category vocabulary offered to the classifier and the parser
    pub fn with_vocabulary(mut self, vocabulary: CategoryVocabulary) -> Self {
        self.classifier = self.classifier.with_vocabulary(vocabulary.clone());
        self.parser = self.parser.with_vocabulary(vocabulary);
        self
    }

    pub fn with_parser(mut self, parser: ExpenseParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    pub fn parser(&self) -> &ExpenseParser {
        &self.parser
    }

    pub fn engine(&self) -> &ExpenseQueryEngine {
        &self.engine
    }

    pub fn reports(&self) -> &ReportGenerator {
        &self.reports
    }

    /// Handle one message from `from`, dated `today`
    pub async fn handle(&self, from: &str, text: &str, today: NaiveDate) -> RouterResponse {
        let text = text.trim();
        if text.is_empty() {
            return RouterResponse::new(
                IntentAnalysis::new(IntentType::Unknown, 0.0),
                vec![HELP_MESSAGE.to_string()],
            );
        }

        let parts = split_expenses(text);
        if parts.len() > 1 {
            info!(count = parts.len(), "Multiple expenses detected");
            let intent = IntentAnalysis {
                intent: "registrar várias despesas".to_string(),
                ..IntentAnalysis::new(IntentType::Expense, 0.8)
            };
            let reply = self.record_many(from, &parts, today).await;
            return RouterResponse::new(intent, vec![reply]);
        }

        let intent = self.classifier.classify(text, today).await;
        info!(intent = %intent.kind, confidence = intent.confidence, "Message classified");

        let replies = match intent.kind {
            IntentType::Expense => vec![self.record_one(from, text, today).await],
            IntentType::Report => vec![self.report(from, &intent, today).await],
            IntentType::Question => self.question(from, text, today).await,
            IntentType::Analysis => vec![self.analysis(from, text, &intent, today).await],
            IntentType::Conversation => vec![self.conversation(from, text, today).await],
            IntentType::Help | IntentType::Unknown => vec![HELP_MESSAGE.to_string()],
        };

        RouterResponse::new(intent, replies)
    }

    async fn save(&self, user: &User, parsed: &ParsedExpense) -> Result<Expense> {
        let category = self.store.find_or_create_category(&parsed.category).await?;
        self.store
            .create_expense(&NewExpense {
                user_id: user.id,
                description: parsed.description.clone(),
                category_id: Some(category.id),
                amount: parsed.amount,
                date: parsed.date,
            })
            .await
    }

    async fn record_one(&self, from: &str, text: &str, today: NaiveDate) -> String {
        let parsed = self.parser.parse(text, today).await;
        if !parsed.is_valid {
            return error_message(INVALID_EXPENSE);
        }

        let result = match self.store.find_or_create_user(from).await {
            Ok(user) => self.save(&user, &parsed).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(expense) => {
                info!(id = expense.id, amount = expense.amount, category = %expense.category_name, "Expense recorded");
                expense_confirmation(&expense)
            }
            Err(e) => {
                warn!(error = %e, "Failed to record expense");
                error_message(EXPENSE_FAILURE)
            }
        }
    }

    /// Parse and record each part; invalid or failing parts are skipped
    async fn record_many(&self, from: &str, parts: &[String], today: NaiveDate) -> String {
        let user = match self.store.find_or_create_user(from).await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Failed to load user");
                return error_message(EXPENSE_FAILURE);
            }
        };

        let mut recorded = Vec::new();
        for part in parts {
            let parsed = self.parser.parse(part, today).await;
            if !parsed.is_valid {
                continue;
            }
            match self.save(&user, &parsed).await {
                Ok(expense) => recorded.push(expense),
                Err(e) => warn!(error = %e, part = %part, "Failed to record expense"),
            }
        }

        if recorded.is_empty() {
            error_message(NO_VALID_EXPENSES)
        } else {
            multi_expense_summary(&recorded)
        }
    }

    async fn report(&self, from: &str, intent: &IntentAnalysis, today: NaiveDate) -> String {
        match self.query(from, intent, today).await {
            Ok((user, expenses)) => {
                self.reports
                    .generate(&expenses, &intent.parameters, user.name.as_deref(), today)
            }
            Err(e) => {
                warn!(error = %e, "Report query failed");
                error_message(REPORT_FAILURE)
            }
        }
    }

    /// Generated lead-in followed by the numeric answer over the full history
    async fn question(&self, from: &str, text: &str, today: NaiveDate) -> Vec<String> {
        let (user, expenses) = match self.history(from).await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "Question query failed");
                return vec![error_message(QUESTION_FAILURE)];
            }
        };

        let digest = expense_digest(&self.reports.build(&expenses, today, None));
        let lead = self
            .narrator
            .question_lead(text, user.name.as_deref(), &digest)
            .await;
        vec![lead, self.reports.answer(&expenses, today)]
    }

    async fn analysis(
        &self,
        from: &str,
        text: &str,
        intent: &IntentAnalysis,
        today: NaiveDate,
    ) -> String {
        let (user, expenses) = match self.query(from, intent, today).await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "Analysis query failed");
                return error_message(REPORT_FAILURE);
            }
        };

        let answer = self.reports.answer(&expenses, today);
        if expenses.is_empty() {
            return answer;
        }

        let digest = expense_digest(&self.reports.build(&expenses, today, None));
        let analysis_type = intent
            .parameters
            .analysis_type
            .unwrap_or(AnalysisType::Health);
        self.narrator
            .analysis(text, user.name.as_deref(), analysis_type, &digest)
            .await
            .unwrap_or(answer)
    }

    /// Small talk; the expense digest is context only, so store errors are tolerated
    async fn conversation(&self, from: &str, text: &str, today: NaiveDate) -> String {
        let (name, digest) = match self.history(from).await {
            Ok((user, expenses)) if !expenses.is_empty() => (
                user.name,
                expense_digest(&self.reports.build(&expenses, today, None)),
            ),
            Ok((user, _)) => (user.name, String::new()),
            Err(e) => {
                warn!(error = %e, "Conversation context unavailable");
                (None, String::new())
            }
        };

        self.narrator
            .conversation(text, name.as_deref(), &digest)
            .await
    }

    /// The sender and their expenses matching the intent parameters
    async fn query(
        &self,
        from: &str,
        intent: &IntentAnalysis,
        today: NaiveDate,
    ) -> Result<(User, Vec<Expense>)> {
        let user = self.store.find_or_create_user(from).await?;
        let expenses = self
            .engine
            .fetch(user.id, &intent.parameters, today)
            .await?;
        Ok((user, expenses))
    }

    async fn history(&self, from: &str) -> Result<(User, Vec<Expense>)> {
        let user = self.store.find_or_create_user(from).await?;
        let expenses = self.engine.fetch_all(user.id).await?;
        Ok((user, expenses))
    }
}
