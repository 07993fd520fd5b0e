use crate::setup::{CapabilityStatus, StepKind, StepOutcome};
use colored::*;

pub fn print_banner(dry_run: bool) {
    println!("{}", "====================================".bright_cyan());
    println!("{}", "      LOCAL AI CLI SETUP v0.1.0     ".bright_cyan().bold());
    println!("{}", "====================================".bright_cyan());
    if dry_run {
        println!("{}\n", " Dry run: nothing will be changed".yellow());
    } else {
        println!("{}\n", " Preparing your machine for the Local AI CLI".bright_white());
    }
}

pub fn print_step_start(index: usize, total: usize, kind: StepKind) {
    println!("{} {}", format!("[{}/{}]", index, total).bright_black(), kind.title().bold());
}

pub fn render_outcome(outcome: &StepOutcome) -> String {
    match outcome {
        StepOutcome::Done(msg) => format!("  {} {}", "✓".green(), msg),
        StepOutcome::Skipped(msg) => format!("  {} {}", "✓".green(), msg.dimmed()),
        StepOutcome::Planned(msg) => format!("  {} {}", "→".cyan(), msg.cyan()),
        StepOutcome::Warned(msg) => format!("  {} {}", "⚠".yellow(), msg.yellow()),
        StepOutcome::Failed(msg) => format!("  {} {}", "✗".red(), msg.red()),
        StepOutcome::NotRun => format!("  {} {}", "-".bright_black(), "not run".bright_black()),
    }
}

pub fn print_outcome(outcome: &StepOutcome) {
    println!("{}", render_outcome(outcome));
}

/// Example invocations of the external CLI under `name`, one per usage mode.
pub fn usage_examples(name: &str) -> Vec<String> {
    vec![
        format!("{name}                          # interactive chat"),
        format!("{name} \"explain this regex\"     # one-shot prompt"),
        format!("{name} -f main.py \"find bugs\"   # include file context"),
        format!("cat main.py | {name} \"review\"   # pipe input"),
    ]
}

pub fn render_completion(name: &str, reload_hint: Option<&str>) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        "━━━━━━━━━━━━━ Setup complete! ━━━━━━━━━━━━━".bright_green().bold().to_string(),
    ];
    if let Some(hint) = reload_hint {
        lines.push(format!("Reload your shell profile to use '{}' now:", name.bold()));
        lines.push(format!("  {}", hint.cyan()));
        lines.push("(new terminal sessions pick it up automatically)".dimmed().to_string());
    }
    lines.push(String::new());
    lines.push("Usage:".bold().to_string());
    for example in usage_examples(name) {
        lines.push(format!("  {example}"));
    }
    lines
}

pub fn print_completion(name: &str, reload_hint: Option<&str>) {
    for line in render_completion(name, reload_hint) {
        println!("{line}");
    }
}

pub fn print_incomplete(failed: usize, log_path: Option<&std::path::Path>) {
    println!(
        "\n{}",
        format!("Setup incomplete: {} step(s) failed.", failed).red().bold()
    );
    if let Some(path) = log_path {
        println!("{}", format!("Details: {}", path.display()).dimmed());
    }
    println!("{}", "Fix the problem above and re-run; completed steps are skipped.".dimmed());
}

pub fn print_dry_run_done() {
    println!("\n{}", "Dry run finished. Re-run without --dry-run to apply.".cyan());
}

pub fn render_capability(status: &CapabilityStatus) -> String {
    let mark = match (status.present, status.advisory) {
        (true, _) => "✓".green(),
        (false, true) => "⚠".yellow(),
        (false, false) => "✗".red(),
    };
    format!("  {} {:<22} {}", mark, status.name, status.detail.dimmed())
}

pub fn print_check(statuses: &[CapabilityStatus]) {
    println!("{}", "Environment status:".bold());
    for status in statuses {
        println!("{}", render_capability(status));
    }
}
