//! Pipeline command implementations
//!
//! `classify` and `parse` run a single stage and print JSON; `chat` runs the
//! whole router against the database; `report` builds a report directly.

use std::sync::Arc;

use anyhow::{Context, Result};
use bolso_core::{
    db::Database,
    expense::ExpenseParser,
    intent::{ClassificationSource, IntentClassifier, IntentTaxonomy},
    models::{IntentParameters, Period},
    query::ExpenseQueryEngine,
    report::{ReportGenerator, ReportOptions, EMPTY_REPORT_MESSAGE},
    IntentRouter,
};
use chrono::NaiveDate;

use super::task_runner;

pub async fn cmd_classify(message: &str, basic: bool, today: NaiveDate) -> Result<()> {
    let mut classifier = IntentClassifier::new(task_runner());
    if basic {
        classifier = classifier.with_taxonomy(IntentTaxonomy::basic());
    }

    let (analysis, source) = classifier.classify_with_source(message, today).await;
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    if source == ClassificationSource::Fallback {
        eprintln!("(keyword rules)");
    }

    Ok(())
}

pub async fn cmd_parse(message: &str, today: NaiveDate) -> Result<()> {
    let parser = ExpenseParser::new(task_runner());
    let expenses = parser.parse_all(message, today).await;

    if expenses.len() == 1 {
        println!("{}", serde_json::to_string_pretty(&expenses[0])?);
    } else {
        println!("{}", serde_json::to_string_pretty(&expenses)?);
    }

    Ok(())
}

pub async fn cmd_chat(
    db: Database,
    from: &str,
    message: &str,
    json: bool,
    today: NaiveDate,
) -> Result<()> {
    let router = IntentRouter::new(Arc::new(db), task_runner());
    let response = router.handle(from, message, today).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    for reply in &response.replies {
        println!("{}", reply);
        println!();
    }

    Ok(())
}

pub async fn cmd_report(
    db: Database,
    from: &str,
    period: Option<&str>,
    category: Option<&str>,
    include_insights: bool,
    today: NaiveDate,
) -> Result<()> {
    let text = report_text(db, from, period, category, include_insights, today).await?;
    println!("{}", text);
    Ok(())
}

/// Report for a sender; an unknown sender gets the empty report
pub async fn report_text(
    db: Database,
    from: &str,
    period: Option<&str>,
    category: Option<&str>,
    include_insights: bool,
    today: NaiveDate,
) -> Result<String> {
    let period = period
        .map(|p| p.parse::<Period>())
        .transpose()
        .map_err(|e| anyhow::anyhow!(e))?;
    let params = IntentParameters {
        period,
        category: category.map(str::to_string),
        ..Default::default()
    };

    let Some(user) = db
        .get_user_by_phone(from)
        .context("Failed to look up user")?
    else {
        return Ok(EMPTY_REPORT_MESSAGE.to_string());
    };

    let engine = ExpenseQueryEngine::new(Arc::new(db));
    let expenses = engine
        .fetch(user.id, &params, today)
        .await
        .context("Failed to query expenses")?;

    let reports = ReportGenerator::with_options(ReportOptions {
        include_insights,
        ..Default::default()
    });
    Ok(reports.generate(&expenses, &params, user.name.as_deref(), today))
}
