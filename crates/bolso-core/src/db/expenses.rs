//! Expense operations

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};
use tracing::debug;

use super::{parse_date_column, Database};
use crate::error::{Error, Result};
use crate::models::{Expense, NewExpense, DEFAULT_CATEGORY};

impl Database {
    /// Record an expense and return it with the category name joined in
    pub fn insert_expense(&self, expense: &NewExpense) -> Result<Expense> {
        if !expense.amount.is_finite() || expense.amount < 0.0 {
            return Err(Error::InvalidData(format!(
                "Invalid expense amount: {}",
                expense.amount
            )));
        }

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO expenses (user_id, description, category_id, amount, date) VALUES (?, ?, ?, ?, ?)",
            params![
                expense.user_id,
                expense.description,
                expense.category_id,
                expense.amount,
                expense.date.format("%Y-%m-%d").to_string(),
            ],
        )?;
        let id = conn.last_insert_rowid();

        let category_name: Option<String> = match expense.category_id {
            Some(category_id) => conn
                .query_row(
                    "SELECT name FROM categories WHERE id = ?",
                    params![category_id],
                    |row| row.get(0),
                )
                .optional()?,
            None => None,
        };

        debug!(id, user_id = expense.user_id, amount = expense.amount, "Expense recorded");

        Ok(Expense {
            id,
            user_id: expense.user_id,
            description: expense.description.clone(),
            category_id: expense.category_id,
            category_name: category_name.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            amount: expense.amount,
            date: expense.date,
        })
    }

    /// List a user's expenses within inclusive date bounds, most recent first
    pub fn list_user_expenses(
        &self,
        user_id: i64,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Expense>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT e.id, e.user_id, e.description, e.category_id, c.name, e.amount, e.date
            FROM expenses e
            LEFT JOIN categories c ON c.id = e.category_id
            WHERE e.user_id = ?1
              AND (?2 IS NULL OR e.date >= ?2)
              AND (?3 IS NULL OR e.date <= ?3)
            ORDER BY e.date DESC, e.id DESC
            "#,
        )?;

        let start = start.map(|d| d.format("%Y-%m-%d").to_string());
        let end = end.map(|d| d.format("%Y-%m-%d").to_string());

        let expenses = stmt
            .query_map(params![user_id, start, end], |row| {
                let category_name: Option<String> = row.get(4)?;
                let date_str: String = row.get(6)?;
                Ok(Expense {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    description: row.get(2)?,
                    category_id: row.get(3)?,
                    category_name: category_name
                        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
                    amount: row.get(5)?,
                    date: parse_date_column(6, &date_str)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(expenses)
    }
}
