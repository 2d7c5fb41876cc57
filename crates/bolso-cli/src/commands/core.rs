//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `task_runner` - Completion backend from the environment, if any
//! - `cmd_init` - Initialize the database
//! - `cmd_categories` - List categories
//! - `cmd_user` - Show or set a sender's display name

use std::path::Path;

use anyhow::{Context, Result};
use bolso_core::{ai::TaskRunner, db::Database, models::User};

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path must be valid UTF-8")?;
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

/// Completion runner from `AI_BACKEND` and friends; None runs the fallbacks only
pub fn task_runner() -> Option<TaskRunner> {
    let runner = TaskRunner::from_env();
    match runner {
        Some(ref r) => {
            let client = r.client();
            tracing::debug!(model = client.model(), host = client.host(), "Completion backend");
        }
        None => eprintln!("   💡 Tip: Set OLLAMA_HOST (or AI_BACKEND=mock) for model-backed replies"),
    }
    runner
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path, no_encrypt)?;

    let seeded = db
        .seed_categories()
        .context("Failed to seed categories")?;
    println!("   Seeded {} default categories", seeded);

    if db.is_encrypted().context("Failed to check encryption")? {
        println!("   🔒 Encryption: ENABLED");
    } else {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Try a message: bolso chat --from +5511999999999 \"gastei 50 no mercado\"");
    println!("  2. Start the webhook server: bolso serve");

    Ok(())
}

pub fn cmd_categories(db: &Database) -> Result<()> {
    let categories = db.all_categories().context("Failed to list categories")?;

    if categories.is_empty() {
        println!("No categories yet. Run `bolso init` to seed the defaults.");
        return Ok(());
    }

    println!("{:>4}  {}", "ID", "NAME");
    println!("{}", "-".repeat(30));
    for category in categories {
        println!("{:>4}  {}", category.id, category.name);
    }

    Ok(())
}

/// Show a sender, optionally setting or clearing their name first
///
/// The sender is created if it has never written before.
pub fn cmd_user(db: &Database, from: &str, name: Option<&str>, clear: bool) -> Result<User> {
    let mut user = db.upsert_user(from).context("Failed to load user")?;

    let name = name.map(str::trim).filter(|n| !n.is_empty());
    if name.is_some() || clear {
        db.set_user_name(user.id, name)
            .context("Failed to update user name")?;
        user.name = name.map(str::to_string);
    }

    println!("{:>4}  {}", "ID", "PHONE");
    println!("{:>4}  {}", user.id, user.phone);
    match &user.name {
        Some(name) => println!("      Name: {}", name),
        None => println!("      Name: (not set)"),
    }

    Ok(user)
}
