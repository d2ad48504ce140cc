// ragwatch/src/commands/check.rs
//
// USE CASE: Pre-flight. Nothing leaves the machine.

use std::path::PathBuf;

use crate::wiring;

pub async fn execute(config_dir: PathBuf) -> anyhow::Result<()> {
    println!("🔍 Checking configuration...");

    let settings = wiring::load(&config_dir)?;
    println!(
        "   Project: {} (environment: {})",
        settings.name, settings.environment
    );

    let orchestrator = wiring::build_orchestrator(&settings, &config_dir)?;
    println!(
        "   Registered sources: {}",
        orchestrator.registry().names().join(", ")
    );

    let report = orchestrator.preflight().await?;
    for (source, count) in &report.sources {
        println!("   ➜ {}: {} entities", source, count);
    }

    println!(
        "✅ Configuration OK: {} active entities, {} rules compiled",
        report.entities, report.compiled_rules
    );
    Ok(())
}
