use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Parser;
use dashboard_streamliner::{
    profile_workbook, DashboardStreamliner, StreamlinerConfig, TAB_NAMES,
};
use log::{info, Level};
use std::path::PathBuf;

/// Rewrites a personal-finance workbook into seven standardized dashboard sheets.
#[derive(Parser, Debug)]
#[command(name = "dashboard-streamliner", version, about)]
struct Cli {
    /// Source workbook to read
    source: PathBuf,

    /// Where to write the streamlined workbook
    destination: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let streamliner = DashboardStreamliner::new(StreamlinerConfig::default())?;
    let report = streamliner
        .run(&cli.source, &cli.destination, Local::now().date_naive())
        .with_context(|| {
            format!(
                "failed to streamline {} into {}",
                cli.source.display(),
                cli.destination.display()
            )
        })?;

    let profile = profile_workbook(&cli.destination)
        .with_context(|| format!("failed to re-read {}", cli.destination.display()))?;
    let check = profile.verify_tabs(&TAB_NAMES);
    if !check.is_ok() {
        bail!(
            "output tabs do not match: missing {:?}, unexpected {:?}, in order: {}",
            check.missing,
            check.unexpected,
            check.in_order
        );
    }
    info!("Verified output tabs:");
    profile.log_summary(Level::Info);

    for line in report.summary_lines() {
        info!("{}", line);
    }

    Ok(())
}
