//! Fetching a user's expenses for a resolved query

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use crate::error::Result;
use crate::models::{Expense, IntentParameters};
use crate::store::RecordStore;

use super::resolver::{QueryFilter, QueryParameterResolver};

/// Turns intent parameters into the matching expense set
#[derive(Clone)]
pub struct ExpenseQueryEngine {
    store: Arc<dyn RecordStore>,
    resolver: QueryParameterResolver,
}

impl ExpenseQueryEngine {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            resolver: QueryParameterResolver::new(),
        }
    }

    /// Resolve the filter against the store's current categories
    pub async fn resolve(&self, params: &IntentParameters, today: NaiveDate) -> Result<QueryFilter> {
        let categories = match params.category {
            Some(_) => self.store.list_categories().await?,
            None => Vec::new(),
        };
        Ok(self.resolver.resolve(params, today, &categories))
    }

    /// Expenses matching `params`, most recent first
    pub async fn fetch(
        &self,
        user_id: i64,
        params: &IntentParameters,
        today: NaiveDate,
    ) -> Result<Vec<Expense>> {
        let filter = self.resolve(params, today).await?;
        self.fetch_filtered(user_id, &filter).await
    }

    pub async fn fetch_filtered(&self, user_id: i64, filter: &QueryFilter) -> Result<Vec<Expense>> {
        let mut expenses = self
            .store
            .list_expenses(user_id, filter.start_date, filter.end_date)
            .await?;
        let fetched = expenses.len();

        expenses.retain(|e| filter.in_month(e.date));

        if let Some(category) = &filter.category {
            expenses.retain(|e| match e.category_id {
                Some(id) => id == category.id,
                None => e.category_name.to_lowercase() == category.name.to_lowercase(),
            });
        }

        expenses.sort_by(|a, b| b.date.cmp(&a.date));

        debug!(
            user_id,
            fetched,
            kept = expenses.len(),
            category = filter.category.as_ref().map(|c| c.name.as_str()),
            "Expense query"
        );
        Ok(expenses)
    }

    /// The user's whole history, most recent first
    pub async fn fetch_all(&self, user_id: i64) -> Result<Vec<Expense>> {
        self.fetch_filtered(user_id, &QueryFilter::default()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::error::Error;
    use crate::models::{Category, NewExpense, Period, User};
    use async_trait::async_trait;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        date(2024, 5, 20)
    }

    fn seeded() -> (Arc<Database>, i64) {
        let db = Database::in_memory().unwrap();
        db.seed_categories().unwrap();
        let user = db.upsert_user("+5511912345678").unwrap();

        let rows = [
            ("Alimentação", 50.0, date(2024, 5, 20)),
            ("Transporte", 30.0, date(2024, 5, 15)),
            ("Alimentação", 120.0, date(2024, 5, 2)),
            ("Lazer", 80.0, date(2024, 4, 28)),
            ("Moradia", 1500.0, date(2023, 5, 10)),
        ];
        for (category, amount, day) in rows {
            let category = db.upsert_category(category).unwrap();
            db.insert_expense(&NewExpense {
                user_id: user.id,
                description: format!("{} {}", category.name, amount),
                category_id: Some(category.id),
                amount,
                date: day,
            })
            .unwrap();
        }
        (Arc::new(db), user.id)
    }

    fn params(period: Option<Period>, category: Option<&str>) -> IntentParameters {
        IntentParameters {
            period,
            category: category.map(str::to_string),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_month_keeps_current_month_only() {
        let (db, user_id) = seeded();
        let engine = ExpenseQueryEngine::new(db);
        let expenses = engine
            .fetch(user_id, &params(Some(Period::Month), None), today())
            .await
            .unwrap();
        assert_eq!(expenses.len(), 3);
        assert!(expenses.iter().all(|e| e.date >= date(2024, 5, 1)));
        assert_eq!(expenses[0].date, date(2024, 5, 20));
    }

    #[tokio::test]
    async fn test_week_window() {
        let (db, user_id) = seeded();
        let engine = ExpenseQueryEngine::new(db);
        let expenses = engine
            .fetch(user_id, &params(Some(Period::Week), None), today())
            .await
            .unwrap();
        let amounts: Vec<f64> = expenses.iter().map(|e| e.amount).collect();
        assert_eq!(amounts, vec![50.0, 30.0]);
    }

    #[tokio::test]
    async fn test_category_filter() {
        let (db, user_id) = seeded();
        let engine = ExpenseQueryEngine::new(db);
        let expenses = engine
            .fetch(user_id, &params(None, Some("ALIMENTAÇÃO")), today())
            .await
            .unwrap();
        assert_eq!(expenses.len(), 2);
        assert!(expenses.iter().all(|e| e.category_name == "Alimentação"));
    }

    #[tokio::test]
    async fn test_unknown_category_is_ignored() {
        let (db, user_id) = seeded();
        let engine = ExpenseQueryEngine::new(db);
        let expenses = engine
            .fetch(user_id, &params(None, Some("Viagem")), today())
            .await
            .unwrap();
        assert_eq!(expenses.len(), 5);
    }

    #[tokio::test]
    async fn test_fetch_all_is_newest_first() {
        let (db, user_id) = seeded();
        let expenses = ExpenseQueryEngine::new(db).fetch_all(user_id).await.unwrap();
        assert_eq!(expenses.len(), 5);
        assert!(expenses.windows(2).all(|w| w[0].date >= w[1].date));
    }

    struct FailingStore;

    #[async_trait]
    impl RecordStore for FailingStore {
        async fn find_user_by_phone(&self, _phone: &str) -> Result<Option<User>> {
            Err(Error::InvalidData("store offline".into()))
        }
        async fn find_or_create_user(&self, _phone: &str) -> Result<User> {
            Err(Error::InvalidData("store offline".into()))
        }
        async fn list_categories(&self) -> Result<Vec<Category>> {
            Err(Error::InvalidData("store offline".into()))
        }
        async fn find_category_by_name(&self, _name: &str) -> Result<Option<Category>> {
            Err(Error::InvalidData("store offline".into()))
        }
        async fn create_category(&self, _name: &str) -> Result<Category> {
            Err(Error::InvalidData("store offline".into()))
        }
        async fn create_expense(&self, _expense: &NewExpense) -> Result<Expense> {
            Err(Error::InvalidData("store offline".into()))
        }
        async fn list_expenses(
            &self,
            _user_id: i64,
            _start: Option<NaiveDate>,
            _end: Option<NaiveDate>,
        ) -> Result<Vec<Expense>> {
            Err(Error::InvalidData("store offline".into()))
        }
    }

    #[tokio::test]
    async fn test_store_errors_propagate() {
        let engine = ExpenseQueryEngine::new(Arc::new(FailingStore));
        assert!(engine
            .fetch(1, &params(Some(Period::Today), None), today())
            .await
            .is_err());
    }
}
