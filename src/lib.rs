use anyhow::Result;
use colored::Colorize;
use std::path::Path;

pub mod config;
pub mod interface;
pub mod logger;
pub mod models;
pub mod probe;
pub mod profile;
pub mod runner;
pub mod setup;
pub mod utils;
pub mod venv;

pub use config::SetupConfig;
pub use setup::{Setup, SetupReport, StepKind, StepOutcome};

use logger::Logger;
use runner::SystemRunner;

/// Dry runs leave no trace on disk, so they get no log file.
fn open_logger(config: &SetupConfig, dry_run: bool) -> Logger {
    if dry_run {
        return Logger::disabled();
    }
    match Logger::new(Path::new(&config.log_dir)) {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("{}", format!("Warning: logging disabled: {:#}", e).yellow());
            Logger::disabled()
        }
    }
}

fn build_setup<'a>(
    config: &'a SetupConfig,
    runner: &'a SystemRunner,
    logger: &'a Logger,
) -> Result<Setup<'a>> {
    let shell_env = std::env::var("SHELL").ok();
    let home = dirs::home_dir();
    let profile = setup::resolve_profile(config, shell_env.as_deref(), home.as_deref())?;
    Ok(Setup::new(config, runner, logger, profile))
}

/// Run the setup sequence on this machine. Returns true when no step failed.
pub async fn run_setup(config: &SetupConfig, dry_run: bool) -> Result<bool> {
    let runner = SystemRunner;
    let logger = open_logger(config, dry_run);
    let _ = logger.log(&format!("setup started (dry_run={})", dry_run));

    let sequence = build_setup(config, &runner, &logger)?.dry_run(dry_run);
    interface::print_banner(dry_run);
    let report = sequence.run().await;

    let summary = report.summary();
    summary.display();

    if !report.is_success() {
        interface::print_incomplete(summary.failed, logger.path());
    } else if dry_run {
        interface::print_dry_run_done();
    } else {
        interface::print_completion(&config.command_name, report.reload_hint.as_deref());
    }

    let _ = logger.log(&format!("setup finished: {:?}", summary));
    Ok(report.is_success())
}

/// Report which capabilities are present without changing anything. Returns true when ready.
pub async fn run_check(config: &SetupConfig) -> Result<bool> {
    let runner = SystemRunner;
    let logger = Logger::disabled();

    let sequence = build_setup(config, &runner, &logger)?;
    let statuses = sequence.check().await;
    interface::print_check(&statuses);

    let ready = setup::is_ready(&statuses);
    if ready {
        println!("\n{}", "Ready.".green().bold());
    } else {
        println!("\n{}", "Not ready: run `localcli-setup` to fix.".yellow());
    }
    Ok(ready)
}
