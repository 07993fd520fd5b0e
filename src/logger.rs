use crate::utils::ensure_dir;
use anyhow::Result;
use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Appends timestamped lines to `setup_<timestamp>.log`.
/// A disabled logger accepts every call and writes nothing.
pub struct Logger {
    log_file: Option<PathBuf>,
}

/// Per-run tally of step outcomes.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunSummary {
    pub done: usize,
    pub skipped: usize,
    pub planned: usize,
    pub warned: usize,
    pub failed: usize,
    pub not_run: usize,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    pub fn display(&self) {
        use colored::Colorize;
        println!("\n{}", "━━━━━━━━━━━━ Setup Summary ━━━━━━━━━━━━".bright_cyan().bold());
        println!("Done:     {}", self.done.to_string().green());
        println!("Skipped:  {}", self.skipped.to_string().dimmed());
        if self.planned > 0 {
            println!("Planned:  {}", self.planned.to_string().cyan());
        }
        println!("Warnings: {}", self.warned.to_string().yellow());
        println!("Failed:   {}", self.failed.to_string().red());
        if self.not_run > 0 {
            println!("Not run:  {}", self.not_run.to_string().red());
        }
        println!("{}", "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".bright_cyan());
    }
}

impl Logger {
    pub fn new(log_dir: &Path) -> Result<Self> {
        ensure_dir(log_dir)?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let log_file = log_dir.join(format!("setup_{}.log", timestamp));

        Ok(Self { log_file: Some(log_file) })
    }

    pub fn disabled() -> Self {
        Self { log_file: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    pub fn log(&self, message: &str) -> Result<()> {
        let Some(path) = &self.log_file else {
            return Ok(());
        };
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(file, "[{}] {}", timestamp, message)?;
        Ok(())
    }

    pub fn log_step(&self, step: &str, outcome: &str) -> Result<()> {
        self.log(&format!("STEP {}: {}", step, outcome))
    }

    pub fn log_command(&self, program: &str, args: &[String]) -> Result<()> {
        self.log(&format!("RUN {} {}", program, args.join(" ")))
    }

    pub fn log_error(&self, error: &str) -> Result<()> {
        self.log(&format!("ERROR: {}", error))
    }
}
