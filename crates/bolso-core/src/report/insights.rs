//! Threshold-triggered insights over an expense set
//!
//! Every rule is evaluated independently; all that fire are kept, in
//! registration order, with no deduplication.

use chrono::NaiveDate;

use crate::models::{CategoryBreakdownEntry, Expense};

/// Everything a rule may look at
pub struct InsightContext<'a> {
    pub expenses: &'a [Expense],
    /// Sorted by amount, largest first
    pub by_category: &'a [CategoryBreakdownEntry],
    pub total: f64,
    pub today: NaiveDate,
    /// Set only when the wording should address the user
    pub name: Option<&'a str>,
}

impl InsightContext<'_> {
    pub fn average(&self) -> f64 {
        if self.expenses.is_empty() {
            0.0
        } else {
            self.total / self.expenses.len() as f64
        }
    }

    /// Share of a named category, case-insensitive; 0 when absent
    pub fn share_of(&self, category: &str) -> f64 {
        let wanted = category.to_lowercase();
        self.by_category
            .iter()
            .find(|e| e.category.to_lowercase() == wanted)
            .map(|e| e.percentage)
            .unwrap_or(0.0)
    }

    /// Expenses dated at most 7 days before `today` (future dates count too)
    pub fn recent_count(&self) -> usize {
        self.expenses
            .iter()
            .filter(|e| (self.today - e.date).num_days() <= 7)
            .count()
    }
}

/// One insight rule
pub trait InsightRule: Send + Sync {
    /// Stable identifier, used in logs
    fn id(&self) -> &'static str;

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Option<String>;
}

/// Top category above 50% of the total
pub struct DominantCategory;

impl InsightRule for DominantCategory {
    fn id(&self) -> &'static str {
        "dominant_category"
    }

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Option<String> {
        let top = ctx.by_category.first().filter(|e| e.percentage > 50.0)?;
        let lead = match ctx.name {
            Some(name) => format!("{}, {}", name, top.category),
            None => top.category.clone(),
        };
        Some(format!(
            "⚠️ {} representa {:.1}% dos seus gastos. Vale a pena rever essa categoria.",
            lead, top.percentage
        ))
    }
}

/// Top category between 30% and 50%
pub struct MainCategory;

impl InsightRule for MainCategory {
    fn id(&self) -> &'static str {
        "main_category"
    }

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Option<String> {
        let top = ctx
            .by_category
            .first()
            .filter(|e| e.percentage > 30.0 && e.percentage <= 50.0)?;
        Some(format!(
            "📌 {} é sua principal categoria ({:.1}% dos gastos).",
            top.category, top.percentage
        ))
    }
}

/// More than five expenses in the last week
pub struct FrequentSpending;

impl InsightRule for FrequentSpending {
    fn id(&self) -> &'static str {
        "frequent_spending"
    }

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Option<String> {
        let count = ctx.recent_count();
        (count > 5).then(|| format!("📅 Você fez {} despesas nos últimos 7 dias.", count))
    }
}

pub struct HighAverage;

impl InsightRule for HighAverage {
    fn id(&self) -> &'static str {
        "high_average"
    }

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Option<String> {
        let average = ctx.average();
        (average > 200.0).then(|| {
            format!(
                "💸 Sua despesa média está alta: R$ {:.2} por lançamento.",
                average
            )
        })
    }
}

pub struct LowAverage;

impl InsightRule for LowAverage {
    fn id(&self) -> &'static str {
        "low_average"
    }

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Option<String> {
        let average = ctx.average();
        (!ctx.expenses.is_empty() && average < 50.0).then(|| {
            format!(
                "👏 Bom controle! Sua despesa média é de R$ {:.2}.",
                average
            )
        })
    }
}

/// Share of a named category above a threshold, with a fixed suggestion
pub struct CategoryShare {
    id: &'static str,
    category: &'static str,
    threshold: f64,
    suggestion: &'static str,
}

impl CategoryShare {
    pub fn food() -> Self {
        Self {
            id: "food_share",
            category: "Alimentação",
            threshold: 40.0,
            suggestion: "🍳 Cozinhar em casa com mais frequência pode ajudar a economizar.",
        }
    }

    pub fn transport() -> Self {
        Self {
            id: "transport_share",
            category: "Transporte",
            threshold: 30.0,
            suggestion: "🚌 Considere usar transporte público para reduzir esse custo.",
        }
    }
}

impl InsightRule for CategoryShare {
    fn id(&self) -> &'static str {
        self.id
    }

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Option<String> {
        let share = ctx.share_of(self.category);
        (share > self.threshold).then(|| {
            format!(
                "{} ({} representa {:.1}% dos gastos.)",
                self.suggestion, self.category, share
            )
        })
    }
}

/// The built-in rules, in evaluation order
pub fn default_rules() -> Vec<Box<dyn InsightRule>> {
    vec![
        Box::new(DominantCategory),
        Box::new(MainCategory),
        Box::new(FrequentSpending),
        Box::new(HighAverage),
        Box::new(LowAverage),
        Box::new(CategoryShare::food()),
        Box::new(CategoryShare::transport()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()
    }

    fn expense(amount: f64, days_ago: i64) -> Expense {
        Expense {
            id: 0,
            user_id: 1,
            description: "x".into(),
            category_id: None,
            category_name: "Outros".into(),
            amount,
            date: today() - chrono::Duration::days(days_ago),
        }
    }

    fn entry(category: &str, percentage: f64) -> CategoryBreakdownEntry {
        CategoryBreakdownEntry {
            category: category.into(),
            amount: percentage,
            percentage,
        }
    }

    #[test]
    fn test_dominant_category_is_personalized() {
        let by_category = [entry("Lazer", 60.0), entry("Outros", 40.0)];
        let expenses = [expense(100.0, 0)];
        let mut ctx = InsightContext {
            expenses: &expenses,
            by_category: &by_category,
            total: 100.0,
            today: today(),
            name: Some("Ana"),
        };
        let text = DominantCategory.evaluate(&ctx).unwrap();
        assert!(text.starts_with("⚠️ Ana, Lazer representa 60.0%"));
        assert!(MainCategory.evaluate(&ctx).is_none());

        ctx.name = None;
        assert!(DominantCategory
            .evaluate(&ctx)
            .unwrap()
            .starts_with("⚠️ Lazer representa"));
    }

    #[test]
    fn test_main_category_band() {
        let expenses = [expense(10.0, 0)];
        for (pct, fires) in [(30.0, false), (30.1, true), (50.0, true), (50.1, false)] {
            let by_category = [entry("Moradia", pct)];
            let ctx = InsightContext {
                expenses: &expenses,
                by_category: &by_category,
                total: 10.0,
                today: today(),
                name: None,
            };
            assert_eq!(MainCategory.evaluate(&ctx).is_some(), fires, "{}", pct);
        }
    }

    #[test]
    fn test_recent_count_window() {
        let expenses: Vec<Expense> = [0, 1, 2, 3, 7, 8, -2]
            .iter()
            .map(|d| expense(10.0, *d))
            .collect();
        let ctx = InsightContext {
            expenses: &expenses,
            by_category: &[],
            total: 70.0,
            today: today(),
            name: None,
        };
        // 8 days ago is out; the future-dated one is in
        assert_eq!(ctx.recent_count(), 6);
        assert!(FrequentSpending
            .evaluate(&ctx)
            .unwrap()
            .contains("6 despesas"));
    }

    #[test]
    fn test_average_rules() {
        let high = [expense(250.0, 30)];
        let ctx = InsightContext {
            expenses: &high,
            by_category: &[],
            total: 250.0,
            today: today(),
            name: None,
        };
        assert!(HighAverage.evaluate(&ctx).unwrap().contains("R$ 250.00"));
        assert!(LowAverage.evaluate(&ctx).is_none());

        let low = [expense(20.0, 30)];
        let ctx = InsightContext {
            expenses: &low,
            by_category: &[],
            total: 20.0,
            today: today(),
            name: None,
        };
        assert!(LowAverage.evaluate(&ctx).is_some());
        assert!(HighAverage.evaluate(&ctx).is_none());
    }

    #[test]
    fn test_category_share_rules() {
        let expenses = [expense(100.0, 30)];
        let by_category = [entry("alimentação", 45.0), entry("Transporte", 30.0)];
        let ctx = InsightContext {
            expenses: &expenses,
            by_category: &by_category,
            total: 100.0,
            today: today(),
            name: None,
        };
        assert!(CategoryShare::food().evaluate(&ctx).is_some());
        // threshold is exclusive
        assert!(CategoryShare::transport().evaluate(&ctx).is_none());
    }
}
