//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Core commands (init, categories) and shared utilities (open_db, task_runner)
//! - `chat` - Pipeline commands (classify, parse, chat, report)
//! - `prompts` - Prompt library management commands
//! - `serve` - Web server command

pub mod chat;
pub mod core;
pub mod prompts;
pub mod serve;

// Re-export command functions for main.rs
pub use chat::*;
pub use core::*;
pub use prompts::*;
pub use serve::*;
