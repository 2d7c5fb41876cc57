//! Splitting a message that names several expenses

use std::sync::LazyLock;

use regex::Regex;

/// Marker every part of a multi-expense message must carry
const SPEND_MARKER: &str = "gastei";

/// "gastei <amount> <words>" up to the next separator
static SPEND_CLAUSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)gastei\s+\d+(?:[.,]\d{2})?\s+[^,.\n]+").expect("valid regex")
});

/// Break "gastei 30 no uber, gastei 50 no mercado" into one part per expense
///
/// Separators are tried in order (comma, period, newline); the first one
/// that leaves more than one part containing "gastei" wins. Failing that,
/// every `gastei <n> ...` clause is taken. Returns the whole message when
/// fewer than two expenses are found.
pub fn split_expenses(message: &str) -> Vec<String> {
    for separator in [',', '.', '\n'] {
        let parts: Vec<&str> = message
            .split(separator)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() < 2 {
            continue;
        }

        let spends: Vec<String> = parts
            .into_iter()
            .filter(|p| p.to_lowercase().contains(SPEND_MARKER))
            .map(str::to_string)
            .collect();
        if spends.len() > 1 {
            return spends;
        }
    }

    let clauses: Vec<String> = SPEND_CLAUSE_RE
        .find_iter(message)
        .map(|m| m.as_str().trim().to_string())
        .collect();
    if clauses.len() > 1 {
        return clauses;
    }

    vec![message.trim().to_string()]
}
