use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use localcli_setup::SetupConfig;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "localcli-setup")]
#[command(about = "Prepare this machine to run the Local AI CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (default: ./localcli-setup.toml, then <config dir>/setup.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Model to make sure Ollama has
    #[arg(long, global = true)]
    model: Option<String>,

    /// Ollama server base URL
    #[arg(long, global = true)]
    ollama_url: Option<String>,

    /// Python virtual environment directory
    #[arg(long, global = true)]
    venv: Option<String>,

    /// Path to the CLI script the shell command runs
    #[arg(long, global = true)]
    script: Option<String>,

    /// Name of the shell command to register
    #[arg(long, global = true)]
    name: Option<String>,

    /// bash, zsh, sh, fish or powershell (default: detected from $SHELL)
    #[arg(long, global = true)]
    shell: Option<String>,

    /// Shell profile to edit instead of the shell's default
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Continue with the remaining steps after a failure
    #[arg(long, global = true)]
    keep_going: bool,

    /// Only report what would change
    #[arg(long, global = true)]
    dry_run: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the setup sequence (default)
    Run,
    /// Show which pieces are already in place
    Check,
}

impl Cli {
    fn apply_to(&self, cfg: &mut SetupConfig) {
        if let Some(model) = &self.model {
            cfg.model = model.clone();
        }
        if let Some(url) = &self.ollama_url {
            cfg.ollama_url = url.clone();
        }
        if let Some(venv) = &self.venv {
            cfg.venv_dir = venv.clone();
        }
        if let Some(script) = &self.script {
            cfg.cli_script = script.clone();
        }
        if let Some(name) = &self.name {
            cfg.command_name = name.clone();
        }
        if let Some(shell) = &self.shell {
            cfg.shell = Some(shell.clone());
        }
        if let Some(profile) = &self.profile {
            cfg.profile_path = Some(profile.clone());
        }
        if self.keep_going {
            cfg.keep_going = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // .env may carry LOCALCLI_* overrides
    dotenv().ok();

    let cli = Cli::parse();
    if cli.no_color {
        colored::control::set_override(false);
    }

    let mut config = SetupConfig::load(cli.config.as_deref());
    cli.apply_to(&mut config);
    for warning in config.sanitize() {
        eprintln!("Warning: {}", warning);
    }

    let ok = match cli.command {
        None | Some(Commands::Run) => localcli_setup::run_setup(&config, cli.dry_run).await?,
        Some(Commands::Check) => localcli_setup::run_check(&config).await?,
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
