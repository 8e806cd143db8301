// Courtcast entry point.
//
// Startup sequence:
// 1. Parse arguments
// 2. Initialize tracing (log to file, stdout carries the report)
// 3. Load config and snapshots, run the command
// 4. Print the report

use std::path::Path;

use anyhow::{bail, Context};
use clap::Parser;
use courtcast::cli::{self, Cli};
use tracing::info;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.base_dir)?;
    info!("courtcast starting: {:?}", cli.command);

    let out = cli::run(&cli)?;
    println!("{}", out.text);

    if !out.ok {
        bail!("data-quality checks failed");
    }
    info!("courtcast finished");
    Ok(())
}

/// Initialize tracing to log to a file under `<base_dir>/logs`.
fn init_tracing(base_dir: &Path) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = base_dir.join("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create {}", log_dir.display()))?;

    let log_file = std::fs::File::create(log_dir.join("courtcast.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("courtcast=info,courtcast_core=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
