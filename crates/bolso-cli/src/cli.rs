//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Bolso - Record and understand your expenses by chat
#[derive(Parser)]
#[command(name = "bolso")]
#[command(about = "Expense chat assistant for Brazilian Portuguese messages", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "bolso.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set BOLSO_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and seed default categories
    Init,

    /// List expense categories
    Categories,

    /// Show or set the display name of a sender
    User {
        /// Sender phone number
        #[arg(short, long)]
        from: String,

        /// Name used to personalize replies
        #[arg(short, long)]
        name: Option<String>,

        /// Remove the stored name
        #[arg(long, conflicts_with = "name")]
        clear: bool,
    },

    /// Classify a message and print the intent as JSON
    Classify {
        /// Message text
        message: String,

        /// Only expense, report, help and unknown intents
        #[arg(long)]
        basic: bool,
    },

    /// Extract an expense from a message and print it as JSON
    Parse {
        /// Message text
        message: String,
    },

    /// Handle a message end to end, as if it arrived from `--from`
    Chat {
        /// Sender phone number
        #[arg(short, long)]
        from: String,

        /// Message text
        message: String,

        /// Print the intent and replies as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a financial report for a sender
    Report {
        /// Sender phone number
        #[arg(short, long)]
        from: String,

        /// Period: today, week, month, year (all expenses if omitted)
        #[arg(short, long)]
        period: Option<String>,

        /// Category name
        #[arg(short, long)]
        category: Option<String>,

        /// Skip insights
        #[arg(long)]
        no_insights: bool,
    },

    /// Manage prompt templates
    Prompts {
        #[command(subcommand)]
        action: PromptsAction,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

#[derive(Subcommand)]
pub enum PromptsAction {
    /// List all prompts and their override status
    List,

    /// Show a prompt's content
    Show {
        /// Prompt ID (e.g. classify_intent)
        id: String,
    },

    /// Print the override directory
    Path,
}
