//! Record store seam
//!
//! The pipeline only talks to persistence through `RecordStore`, so the
//! router and query engine can run against SQLite or a test double.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{Category, Expense, NewExpense, User};

/// Maximum stored length of a sender phone identifier
pub const MAX_PHONE_LEN: usize = 20;

/// Truncate a sender identifier to the stored length (char-safe)
pub fn truncate_phone(phone: &str) -> String {
    phone.trim().chars().take(MAX_PHONE_LEN).collect()
}

/// Users, categories and expenses
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_user_by_phone(&self, phone: &str) -> Result<Option<User>>;

    /// Upsert by phone; concurrent callers end up with the same user
    async fn find_or_create_user(&self, phone: &str) -> Result<User>;

    async fn list_categories(&self) -> Result<Vec<Category>>;

    /// Case-insensitive lookup
    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>>;

    async fn create_category(&self, name: &str) -> Result<Category>;

    async fn find_or_create_category(&self, name: &str) -> Result<Category> {
        match self.find_category_by_name(name).await? {
            Some(category) => Ok(category),
            None => self.create_category(name).await,
        }
    }

    async fn create_expense(&self, expense: &NewExpense) -> Result<Expense>;

    /// Expenses of one user within inclusive bounds, most recent first
    async fn list_expenses(
        &self,
        user_id: i64,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Expense>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_phone() {
        assert_eq!(truncate_phone(" +5511999998888 "), "+5511999998888");
        assert_eq!(
            truncate_phone("whatsapp:+5511999998888"),
            "whatsapp:+5511999998"
        );
        assert_eq!(truncate_phone("whatsapp:+5511999998888").len(), MAX_PHONE_LEN);
    }
}
