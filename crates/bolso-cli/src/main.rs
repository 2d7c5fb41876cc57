//! Bolso CLI - Expense chat assistant
//!
//! Usage:
//!   bolso init                                 Initialize database
//!   bolso chat --from +5511... "gastei 50"     Handle one message
//!   bolso report --from +5511... --period month
//!   bolso serve --port 3000                    Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let today = chrono::Local::now().date_naive();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Categories => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_categories(&db)
        }
        Commands::User { from, name, clear } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_user(&db, &from, name.as_deref(), clear).map(|_| ())
        }
        Commands::Classify { message, basic } => {
            commands::cmd_classify(&message, basic, today).await
        }
        Commands::Parse { message } => commands::cmd_parse(&message, today).await,
        Commands::Chat {
            from,
            message,
            json,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_chat(db, &from, &message, json, today).await
        }
        Commands::Report {
            from,
            period,
            category,
            no_insights,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_report(
                db,
                &from,
                period.as_deref(),
                category.as_deref(),
                !no_insights,
                today,
            )
            .await
        }
        Commands::Prompts { action } => match action {
            PromptsAction::List => commands::cmd_prompts_list(),
            PromptsAction::Show { id } => commands::cmd_prompts_show(&id),
            PromptsAction::Path => commands::cmd_prompts_path(),
        },
        Commands::Serve { port, host } => {
            commands::cmd_serve(&cli.db, &host, port, cli.no_encrypt).await
        }
    }
}
