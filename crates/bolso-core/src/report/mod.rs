//! Spending reports and question answers
//!
//! `ReportGenerator` aggregates an expense set into totals, a per-category
//! breakdown, the three largest expenses, and rule-based insights, then
//! renders it as chat text. `answer` is the shorter, impersonal variant
//! used for direct questions.

mod insights;

pub use insights::{default_rules, CategoryShare, InsightContext, InsightRule};

use std::collections::HashMap;
use std::fmt::Write as _;

use chrono::NaiveDate;
use tracing::debug;

use crate::dates::format_br;
use crate::models::{CategoryBreakdownEntry, Expense, IntentParameters, Report};

/// Reply when a report query matches nothing
pub const EMPTY_REPORT_MESSAGE: &str = "📊 Nenhuma despesa encontrada no período especificado.";

/// Reply when a question is asked before anything was recorded
pub const EMPTY_ANSWER_MESSAGE: &str = "📊 Nenhuma despesa registrada ainda.";

/// Divisor for the daily average in answers, whatever the actual period
const DAYS_PER_MONTH: f64 = 30.0;

const TOP_EXPENSES: usize = 3;

/// Emoji shown next to a category name
pub fn category_emoji(category: &str) -> &'static str {
    match category.to_lowercase().as_str() {
        "alimentação" => "🍽️",
        "transporte" => "🚗",
        "moradia" => "🏠",
        "lazer" => "🎉",
        "saúde" => "💊",
        "outros" => "📦",
        _ => "📂",
    }
}

/// Format an amount the way replies show it ("R$ 12.50")
pub fn format_amount(amount: f64) -> String {
    format!("R$ {:.2}", amount)
}

/// Rendering switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    pub include_insights: bool,
    /// Address the user by name when one is known
    pub personalize: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            include_insights: true,
            personalize: true,
        }
    }
}

pub struct ReportGenerator {
    options: ReportOptions,
    rules: Vec<Box<dyn InsightRule>>,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportGenerator {
    pub fn new() -> Self {
        Self::with_options(ReportOptions::default())
    }

    pub fn with_options(options: ReportOptions) -> Self {
        Self {
            options,
            rules: default_rules(),
        }
    }

    /// Register an extra insight rule, evaluated after the built-in ones
    pub fn register(&mut self, rule: Box<dyn InsightRule>) {
        self.rules.push(rule);
    }

    pub fn options(&self) -> ReportOptions {
        self.options
    }

    /// Aggregate without rendering; `name` only affects insight wording
    pub fn build(&self, expenses: &[Expense], today: NaiveDate, name: Option<&str>) -> Report {
        let total: f64 = expenses.iter().map(|e| e.amount).sum();
        let by_category = breakdown(expenses, total);

        let mut top_expenses = expenses.to_vec();
        top_expenses.sort_by(|a, b| b.amount.total_cmp(&a.amount));
        top_expenses.truncate(TOP_EXPENSES);

        let insights = if self.options.include_insights {
            self.insights(&InsightContext {
                expenses,
                by_category: &by_category,
                total,
                today,
                name,
            })
        } else {
            Vec::new()
        };

        Report {
            total,
            count: expenses.len(),
            by_category,
            top_expenses,
            insights,
        }
    }

    fn insights(&self, ctx: &InsightContext<'_>) -> Vec<String> {
        self.rules
            .iter()
            .filter_map(|rule| {
                let text = rule.evaluate(ctx)?;
                debug!(rule = rule.id(), "Insight fired");
                Some(text)
            })
            .collect()
    }

    /// Render a report: header, total, categories, top expenses, insights
    pub fn render(&self, report: &Report, params: &IntentParameters, name: Option<&str>) -> String {
        let mut out = String::new();

        let _ = write!(out, "📊 Relatório Financeiro");
        if let Some(name) = self.display_name(name) {
            let _ = write!(out, " de {}", name);
        }
        if let Some(period) = params.period {
            let _ = write!(out, " ({})", period.label());
        }
        if let Some(category) = params.category.as_deref() {
            let _ = write!(out, " - {}", category);
        }
        out.push_str("\n\n");

        let _ = writeln!(out, "💰 Total gasto: {}", format_amount(report.total));

        out.push_str("\n📂 Por categoria:\n");
        for entry in &report.by_category {
            let _ = writeln!(
                out,
                "{} {}: {} ({:.1}%)",
                category_emoji(&entry.category),
                entry.category,
                format_amount(entry.amount),
                entry.percentage
            );
        }

        if !report.top_expenses.is_empty() {
            out.push_str("\n🔝 Top 3 maiores despesas:\n");
            for (i, expense) in report.top_expenses.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "{}. {} - {} ({})",
                    i + 1,
                    expense.description,
                    format_amount(expense.amount),
                    format_br(expense.date)
                );
            }
        }

        push_insights(&mut out, &report.insights);
        out.trim_end().to_string()
    }

    /// Build and render, or the empty-state message when nothing matched
    pub fn generate(
        &self,
        expenses: &[Expense],
        params: &IntentParameters,
        name: Option<&str>,
        today: NaiveDate,
    ) -> String {
        if expenses.is_empty() {
            return match self.display_name(name) {
                Some(name) => format!(
                    "📊 {}, nenhuma despesa encontrada no período especificado.",
                    name
                ),
                None => EMPTY_REPORT_MESSAGE.to_string(),
            };
        }

        let name = self.display_name(name);
        let report = self.build(expenses, today, name);
        self.render(&report, params, name)
    }

    /// Short impersonal summary answering a question about spending
    ///
    /// The daily average always divides by 30, whatever span the
    /// expenses cover.
    pub fn answer(&self, expenses: &[Expense], today: NaiveDate) -> String {
        if expenses.is_empty() {
            return EMPTY_ANSWER_MESSAGE.to_string();
        }

        let report = self.build(expenses, today, None);

        // first of equal maxima wins
        let largest = expenses
            .iter()
            .fold(&expenses[0], |max, e| if e.amount > max.amount { e } else { max });

        let mut out = String::from("📊 Resumo dos seus gastos:\n\n");
        let _ = writeln!(out, "💰 Total: {}", format_amount(report.total));
        let _ = writeln!(
            out,
            "📈 Média diária: {}",
            format_amount(report.total / DAYS_PER_MONTH)
        );
        let _ = writeln!(
            out,
            "🔝 Maior despesa: {} - {}",
            largest.description,
            format_amount(largest.amount)
        );
        if let Some(top) = report.by_category.first() {
            let _ = writeln!(
                out,
                "📂 Categoria principal: {} ({})",
                top.category,
                format_amount(top.amount)
            );
        }

        push_insights(&mut out, &report.insights);
        out.trim_end().to_string()
    }

    fn display_name<'a>(&self, name: Option<&'a str>) -> Option<&'a str> {
        if !self.options.personalize {
            return None;
        }
        name.map(str::trim).filter(|n| !n.is_empty())
    }
}

/// Group by category name, summing amounts; largest first
fn breakdown(expenses: &[Expense], total: f64) -> Vec<CategoryBreakdownEntry> {
    let mut order: Vec<&str> = Vec::new();
    let mut sums: HashMap<&str, f64> = HashMap::new();
    for expense in expenses {
        let name = expense.category_name.as_str();
        if !sums.contains_key(name) {
            order.push(name);
        }
        *sums.entry(name).or_insert(0.0) += expense.amount;
    }

    let mut entries: Vec<CategoryBreakdownEntry> = order
        .into_iter()
        .map(|category| {
            let amount = sums.get(category).copied().unwrap_or(0.0);
            CategoryBreakdownEntry {
                category: category.to_string(),
                amount,
                percentage: if total > 0.0 {
                    amount / total * 100.0
                } else {
                    0.0
                },
            }
        })
        .collect();
    entries.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    entries
}

fn push_insights(out: &mut String, insights: &[String]) {
    if insights.is_empty() {
        return;
    }
    out.push_str("\n💡 Insights:\n");
    for insight in insights {
        let _ = writeln!(out, "• {}", insight);
    }
}
