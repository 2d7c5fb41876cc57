//! Category operations

use rusqlite::params;
use tracing::info;

use super::Database;
use crate::error::{Error, Result};
use crate::models::{Category, DEFAULT_CATEGORIES};

impl Database {
    /// List all categories in creation order
    pub fn all_categories(&self) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, name FROM categories ORDER BY id")?;

        let categories = stmt
            .query_map([], |row| {
                Ok(Category {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(categories)
    }

    /// Case-insensitive lookup
    ///
    /// Compared in Rust because SQLite's NOCASE only folds ASCII, and
    /// category names carry accents ("Saúde" vs "SAÚDE").
    pub fn get_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let wanted = name.trim().to_lowercase();
        if wanted.is_empty() {
            return Ok(None);
        }
        Ok(self
            .all_categories()?
            .into_iter()
            .find(|c| c.name.to_lowercase() == wanted))
    }

    pub fn insert_category(&self, name: &str) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidData("Empty category name".into()));
        }

        let conn = self.conn()?;
        conn.execute("INSERT INTO categories (name) VALUES (?)", params![name])?;

        Ok(Category {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    /// Return the existing category or create it
    pub fn upsert_category(&self, name: &str) -> Result<Category> {
        match self.get_category_by_name(name)? {
            Some(category) => Ok(category),
            None => self.insert_category(name),
        }
    }

    /// Insert the built-in vocabulary; returns how many were new
    pub fn seed_categories(&self) -> Result<usize> {
        let mut created = 0;
        for name in DEFAULT_CATEGORIES {
            if self.get_category_by_name(name)?.is_none() {
                self.insert_category(name)?;
                created += 1;
            }
        }
        info!(created, "Seeded default categories");
        Ok(created)
    }
}
