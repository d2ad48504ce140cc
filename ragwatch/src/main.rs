// ragwatch/src/main.rs

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod wiring;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG=debug ragwatch summarize ... to see the details.
    // Logs go to stderr so `--format json` output stays clean.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Summarize {
            config_dir,
            as_of,
            format,
            output,
        } => commands::summarize::execute(config_dir, as_of, format, output).await,
        Commands::Domains {
            config_dir,
            as_of,
            format,
            output,
        } => commands::domains::execute(config_dir, as_of, format, output).await,
        Commands::Check { config_dir } => commands::check::execute(config_dir).await,
        Commands::Eval {
            runs,
            red,
            amber,
            green,
            reference_date,
        } => commands::eval::execute(runs, red, amber, green, reference_date),
    }
}
