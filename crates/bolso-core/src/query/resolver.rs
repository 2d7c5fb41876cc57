//! Intent parameters to concrete query bounds

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::models::{Category, IntentParameters, Period};

/// Resolved date and category bounds for one query
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryFilter {
    /// Inclusive lower bound passed to the store
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound passed to the store
    pub end_date: Option<NaiveDate>,
    /// Calendar month applied after fetching, as (year, month)
    ///
    /// "month" queries fetch the full history and keep the current month
    /// client-side instead of sending a range to the store.
    pub month: Option<(i32, u32)>,
    /// Category matched in the store, if the requested name exists
    pub category: Option<Category>,
}

impl QueryFilter {
    pub fn in_month(&self, date: NaiveDate) -> bool {
        match self.month {
            Some((year, month)) => date.year() == year && date.month() == month,
            None => true,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.start_date.is_none() && self.end_date.is_none() && self.month.is_none()
    }
}

/// Pure mapping from `IntentParameters` to a `QueryFilter`
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryParameterResolver;

impl QueryParameterResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve dates relative to `today` and the category against `categories`
    ///
    /// Period wins over explicit dates. "year" and "custom" without dates
    /// leave the history unbounded. A category name with no match is dropped.
    pub fn resolve(
        &self,
        params: &IntentParameters,
        today: NaiveDate,
        categories: &[Category],
    ) -> QueryFilter {
        let mut filter = QueryFilter::default();

        match params.period {
            Some(Period::Today) => {
                filter.start_date = Some(today);
                filter.end_date = Some(today);
            }
            Some(Period::Week) => {
                filter.start_date = Some(today - Duration::days(7));
                filter.end_date = Some(today);
            }
            Some(Period::Month) => {
                filter.month = Some((today.year(), today.month()));
            }
            _ if params.start_date.is_some() || params.end_date.is_some() => {
                filter.start_date = params.start_date;
                filter.end_date = params.end_date;
            }
            _ if params.specific_date.is_some() => {
                filter.start_date = params.specific_date;
                filter.end_date = params.specific_date;
            }
            _ => {}
        }

        filter.category = params
            .category
            .as_deref()
            .and_then(|name| find_category(name, categories));

        filter
    }
}

fn find_category(name: &str, categories: &[Category]) -> Option<Category> {
    let wanted = name.trim().to_lowercase();
    if wanted.is_empty() {
        return None;
    }
    categories
        .iter()
        .find(|c| c.name.to_lowercase() == wanted)
        .cloned()
}
