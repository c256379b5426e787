//! AI comparative analysis command

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use nilufar_core::{AnalysisBackend, Config, Database, DeepSeekBackend, PeriodSummary};

fn period_summary(db: &Database, start: NaiveDate, end: NaiveDate) -> Result<PeriodSummary> {
    let totals = db.category_totals(start, end)?;
    Ok(PeriodSummary { start, end, totals })
}

pub async fn cmd_analyze(
    db: &Database,
    period1: (NaiveDate, NaiveDate),
    period2: (NaiveDate, NaiveDate),
    output: Option<&Path>,
) -> Result<()> {
    let config = Config::load()?;
    let backend = DeepSeekBackend::from_config(&config)?;

    let summary1 = period_summary(db, period1.0, period1.1)?;
    let summary2 = period_summary(db, period2.0, period2.1)?;

    println!(
        "🤖 Requesting comparative analysis from {} ({} vs {} categories)...",
        backend.model(),
        summary1.totals.len(),
        summary2.totals.len()
    );

    let report = backend.comparative_report(&summary1, &summary2).await?;
    tracing::debug!("Received analysis report ({} chars)", report.len());

    match output {
        Some(path) => {
            std::fs::write(path, &report)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✅ Report written to {}", path.display());
        }
        None => {
            println!();
            println!("{}", report);
        }
    }
    Ok(())
}
