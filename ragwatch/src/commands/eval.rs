// ragwatch/src/commands/eval.rs
//
// USE CASE: Try RAG rules against a recorded set of job runs.

use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, NaiveTime};
use ragwatch_core::domain::entity::{RagIndicator, RagRuleConfig};
use ragwatch_core::domain::rules::RuleEvaluator;
use ragwatch_core::infrastructure::adapters::mapping::decode_job_stats;
use ragwatch_core::ports::{Clock, SystemClock};

pub fn execute(
    runs_path: PathBuf,
    red: String,
    amber: String,
    green: String,
    reference_date: Option<NaiveDate>,
) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(&runs_path)
        .with_context(|| format!("Failed to read runs from {:?}", runs_path))?;
    let body: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("{:?} is not valid JSON", runs_path))?;
    // Same case-insensitive decoding as the statistics source.
    let runs = decode_job_stats(body)
        .with_context(|| format!("{:?} is not an array of job runs", runs_path))?;

    let reference = match reference_date {
        Some(date) => date.and_time(NaiveTime::MIN),
        None => SystemClock.today(),
    };

    let rules = RagRuleConfig::new(&red, &amber, &green);
    let status = RuleEvaluator::new()
        .evaluate(&runs, &rules, reference)
        .map_err(|failure| {
            anyhow::anyhow!("{} rule failed: {}", failure.indicator, failure.source)
        })?;

    let icon = match status.indicator {
        RagIndicator::Red => "🔴",
        RagIndicator::Amber => "🟠",
        RagIndicator::Green => "🟢",
    };
    println!(
        "{} {} ({} runs, reference {})",
        icon,
        status.indicator,
        runs.len(),
        reference.date()
    );
    Ok(())
}
