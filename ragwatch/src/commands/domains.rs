// ragwatch/src/commands/domains.rs
//
// USE CASE: Raw metrics per data domain, no RAG evaluation.

use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use ragwatch_core::domain::entity::DataDomain;
use ragwatch_core::infrastructure::fs::atomic_write;
use ragwatch_core::ports::Cancellation;

use crate::cli::OutputFormat;
use crate::wiring;

pub async fn execute(
    config_dir: PathBuf,
    as_of: Option<NaiveDate>,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let chatty = format == OutputFormat::Table || output.is_some();

    let settings = wiring::load(&config_dir)?;
    let orchestrator = wiring::build_orchestrator(&settings, &config_dir)?;

    let (handle, cancel) = Cancellation::new();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.cancel();
        }
    });

    if chatty {
        println!("📊 Collecting data domain metrics...");
    }
    let domains = orchestrator
        .domains(as_of, &cancel)
        .await
        .context("Data domain collection failed")?;

    match format {
        OutputFormat::Table => println!("{}", render_table(&domains)),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&domains)?;
            match &output {
                Some(path) => {
                    atomic_write(path, &json)
                        .with_context(|| format!("Failed to write report to {:?}", path))?;
                    println!("📄 JSON report saved to {}", path.display());
                }
                None => println!("{}", json),
            }
        }
    }
    Ok(())
}

fn render_table(domains: &[DataDomain]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Domain", "Key", "Date", "Count", "Message"]);

    for domain in domains {
        for metric in &domain.metrics {
            let date = metric
                .date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string());
            let message = if metric.is_degraded() {
                Cell::new(&metric.message).fg(Color::Red)
            } else {
                Cell::new("")
            };
            table.add_row(vec![
                Cell::new(&domain.name),
                Cell::new(&metric.entity_key),
                Cell::new(date),
                Cell::new(metric.count),
                message,
            ]);
        }
    }
    table
}
