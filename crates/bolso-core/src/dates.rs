//! Date helpers for chat input and Brazilian formatting

use chrono::{Datelike, Duration, NaiveDate};

/// Parse a date as people and models write it in chat
///
/// Accepts `YYYY-MM-DD`, `DD/MM/YYYY`, `DD/MM` (current year of `today`),
/// and the relative words hoje/today and ontem/yesterday.
pub fn parse_loose_date(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = input.trim().to_lowercase();
    match s.as_str() {
        "" => return None,
        "hoje" | "today" => return Some(today),
        "ontem" | "yesterday" => return Some(today - Duration::days(1)),
        _ => {}
    }

    if let Ok(date) = NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(&s, "%d/%m/%Y") {
        return Some(date);
    }

    let mut parts = s.split('/');
    let day: u32 = parts.next()?.trim().parse().ok()?;
    let month: u32 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(today.year(), month, day)
}

/// Format as dd/mm/yyyy
pub fn format_br(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}
