//! Query resolution and expense fetching

mod engine;
mod resolver;

pub use engine::ExpenseQueryEngine;
pub use resolver::{QueryFilter, QueryParameterResolver};
