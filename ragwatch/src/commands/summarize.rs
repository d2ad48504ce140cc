// ragwatch/src/commands/summarize.rs
//
// USE CASE: One aggregation cycle, rendered as a table or a JSON report.

use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use ragwatch_core::domain::entity::{EntitySummary, RagIndicator};
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
    let start = std::time::Instant::now();
    // JSON on stdout must stay machine readable.
    let chatty = format == OutputFormat::Table || output.is_some();

    if chatty {
        println!("⚙️  Loading configuration...");
    }
    let settings = wiring::load(&config_dir)?;
    if chatty {
        println!(
            "   Project: {} (environment: {})",
            settings.name, settings.environment
        );
    }

    let orchestrator = wiring::build_orchestrator(&settings, &config_dir)?;

    // Ctrl-C cancels the in-flight cycle instead of killing the process mid-write.
    let (handle, cancel) = Cancellation::new();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.cancel();
        }
    });

    if chatty {
        println!("🚦 Aggregating job runs...");
    }
    let summaries = orchestrator
        .summarize_as_of(as_of, &cancel)
        .await
        .context("Aggregation cycle failed")?;

    match format {
        OutputFormat::Table => {
            println!("{}", render_table(&summaries));
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&summaries)?;
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

    if chatty {
        println!(
            "\n✨ {} entities summarized in {:.2?}",
            summaries.len(),
            start.elapsed()
        );
    }
    Ok(())
}

fn render_table(summaries: &[EntitySummary]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Entity",
            "Owner",
            "Latest load",
            "Records",
            "RAG",
            "Dependent functionalities",
        ]);

    for summary in summaries {
        let colour = match summary.rag_status.indicator {
            RagIndicator::Red => Color::Red,
            RagIndicator::Amber => Color::Yellow,
            RagIndicator::Green => Color::Green,
        };
        let latest = summary
            .latest_load_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());

        table.add_row(vec![
            Cell::new(&summary.display_name),
            Cell::new(&summary.application_owner),
            Cell::new(latest),
            Cell::new(summary.total_records_loaded),
            Cell::new(&summary.rag_status.description).fg(colour),
            Cell::new(summary.dependent_funcs.join(", ")),
        ]);
    }
    table
}
