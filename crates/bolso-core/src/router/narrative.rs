//! Generated replies for questions, analysis and small talk

use std::collections::HashMap;
use std::fmt::Write as _;

use tracing::warn;

use crate::ai::TaskRunner;
use crate::dates::format_br;
use crate::error::{Error, Result};
use crate::models::{AnalysisType, Report};
use crate::prompts::PromptId;
use crate::report::format_amount;

use super::messages::{CONVERSATION_FALLBACK, QUESTION_LEAD_FALLBACK};

/// Plain-text digest of a report, embedded in narrative prompts
pub fn expense_digest(report: &Report) -> String {
    if report.count == 0 {
        return "Nenhuma despesa registrada.".to_string();
    }

    let mut out = format!(
        "Total: {} em {} despesa(s)\n",
        format_amount(report.total),
        report.count
    );
    for entry in &report.by_category {
        let _ = writeln!(
            out,
            "- {}: {} ({:.1}%)",
            entry.category,
            format_amount(entry.amount),
            entry.percentage
        );
    }
    if let Some(top) = report.top_expenses.first() {
        let _ = writeln!(
            out,
            "Maior despesa: {} - {} ({})",
            top.description,
            format_amount(top.amount),
            format_br(top.date)
        );
    }
    out.trim_end().to_string()
}

/// Asks the completion service for conversational text
///
/// Every call is one attempt; callers get a fixed fallback (or `None`)
/// when no backend is configured or the call fails.
#[derive(Clone, Default)]
pub struct Narrator {
    runner: Option<TaskRunner>,
}

impl Narrator {
    pub fn new(runner: Option<TaskRunner>) -> Self {
        Self { runner }
    }

    async fn run(&self, id: PromptId, vars: &HashMap<&str, &str>) -> Result<String> {
        let runner = self
            .runner
            .as_ref()
            .ok_or_else(|| Error::Completion("No completion backend configured".into()))?;
        runner.run(id, vars).await
    }

    /// Short introduction sent before the numeric answer
    pub async fn question_lead(&self, message: &str, name: Option<&str>, digest: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("message", message);
        vars.insert("name", name.unwrap_or(""));
        vars.insert("expense_summary", digest);

        match self.run(PromptId::AnswerQuestion, &vars).await {
            Ok(reply) => reply,
            Err(e) => {
                self.log_failure("question_reply", &e);
                QUESTION_LEAD_FALLBACK.to_string()
            }
        }
    }

    /// Written analysis, or `None` so the caller can use the numeric summary
    pub async fn analysis(
        &self,
        message: &str,
        name: Option<&str>,
        analysis_type: AnalysisType,
        digest: &str,
    ) -> Option<String> {
        let mut vars = HashMap::new();
        vars.insert("message", message);
        vars.insert("name", name.unwrap_or(""));
        vars.insert("analysis_type", analysis_type.as_str());
        vars.insert("expense_summary", digest);

        match self.run(PromptId::AnalyzeFinances, &vars).await {
            Ok(reply) => Some(reply),
            Err(e) => {
                self.log_failure("financial_analysis", &e);
                None
            }
        }
    }

    /// Small-talk reply; `digest` may be empty
    pub async fn conversation(&self, message: &str, name: Option<&str>, digest: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("message", message);
        vars.insert("name", name.unwrap_or(""));
        vars.insert("expense_summary", digest);

        match self.run(PromptId::Converse, &vars).await {
            Ok(reply) => reply,
            Err(e) => {
                self.log_failure("conversation", &e);
                CONVERSATION_FALLBACK.to_string()
            }
        }
    }

    fn log_failure(&self, task: &str, error: &Error) {
        if self.runner.is_some() {
            warn!(task, error = %error, "Narrative reply failed, using fallback");
        }
    }
}
