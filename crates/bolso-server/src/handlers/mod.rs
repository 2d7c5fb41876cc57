//! HTTP request handlers
//!
//! - `messages` - inbound chat messages (gateway webhook and JSON API)
//! - `twiml` - TwiML rendering for gateway replies

pub mod messages;
pub mod twiml;

pub use messages::*;
