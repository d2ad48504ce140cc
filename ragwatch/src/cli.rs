// ragwatch/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ragwatch")]
#[command(about = "Red / Amber / Green health of data-load jobs", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🚦 Aggregates job runs from every source and evaluates RAG status
    Summarize {
        /// Directory holding ragwatch.yaml
        #[arg(long, default_value = ".")]
        config_dir: PathBuf,

        /// As-of date forwarded to the sources (YYYY-MM-DD)
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// Output format: table | json
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Write the JSON report to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// 📊 Collects raw metrics for every active data domain
    Domains {
        #[arg(long, default_value = ".")]
        config_dir: PathBuf,

        /// As-of date forwarded to the sources (YYYY-MM-DD)
        #[arg(long)]
        as_of: Option<NaiveDate>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Write the JSON report to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// ✅ Validates configuration offline (metadata, environments, rules)
    Check {
        #[arg(long, default_value = ".")]
        config_dir: PathBuf,
    },

    /// 🧪 Evaluates RAG rules against a JSON file of job runs
    Eval {
        /// JSON array of job runs
        #[arg(long)]
        runs: PathBuf,

        #[arg(long, default_value = "false")]
        red: String,

        #[arg(long, default_value = "false")]
        amber: String,

        #[arg(long, default_value = "true")]
        green: String,

        /// Reference date seen by the rules (defaults to today, UTC)
        #[arg(long)]
        reference_date: Option<NaiveDate>,
    },
}
