//! User operations

use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::User;
use crate::store::truncate_phone;

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let created_at_str: String = row.get(3)?;
    Ok(User {
        id: row.get(0)?,
        phone: row.get(1)?,
        name: row.get(2)?,
        created_at: parse_datetime(&created_at_str),
    })
}

impl Database {
    /// Look up a user by phone (truncated the same way it was stored)
    pub fn get_user_by_phone(&self, phone: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT id, phone, name, created_at FROM users WHERE phone = ?",
                params![truncate_phone(phone)],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Find or create a user by phone
    ///
    /// The insert is a no-op on conflict, so two racing first messages
    /// from the same sender resolve to one row.
    pub fn upsert_user(&self, phone: &str) -> Result<User> {
        let phone = truncate_phone(phone);
        if phone.is_empty() {
            return Err(Error::InvalidData("Empty phone identifier".into()));
        }

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (phone) VALUES (?) ON CONFLICT(phone) DO NOTHING",
            params![phone],
        )?;

        let user = conn.query_row(
            "SELECT id, phone, name, created_at FROM users WHERE phone = ?",
            params![phone],
            row_to_user,
        )?;
        Ok(user)
    }

    /// Set the display name used to personalize replies
    pub fn set_user_name(&self, user_id: i64, name: Option<&str>) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE users SET name = ? WHERE id = ?",
            params![name, user_id],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("User {}", user_id)));
        }
        Ok(())
    }
}
