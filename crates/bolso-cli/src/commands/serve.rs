//! Server command implementation

use std::path::Path;

use anyhow::{Context, Result};

use super::{open_db, task_runner};

pub async fn cmd_serve(db_path: &Path, host: &str, port: u16, no_encrypt: bool) -> Result<()> {
    println!("🚀 Starting Bolso webhook server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);
    println!("   Webhook: POST /webhook/whatsapp");
    if no_encrypt {
        println!("   ⚠️  Encryption DISABLED (--no-encrypt)");
    }

    let db = open_db(db_path, no_encrypt)?;

    // Idempotent
    db.seed_categories().context("Failed to seed categories")?;

    let runner = task_runner();
    match runner {
        Some(ref r) => println!(
            "   🤖 Completion backend: {} ({})",
            r.client().host(),
            r.client().model()
        ),
        None => println!("   🔤 Keyword and regex fallbacks only"),
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let config = bolso_server::ServerConfig::default();
    bolso_server::serve_with_config(db, runner, host, port, config).await?;

    Ok(())
}
