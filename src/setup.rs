use crate::config::SetupConfig;
use crate::interface;
use crate::logger::{Logger, RunSummary};
use crate::models::ModelRegistry;
use crate::probe::{self, ProbeOutcome};
use crate::profile::{AliasOutcome, Shell, ShellProfile};
use crate::runner::{CommandOutput, CommandRunner};
use crate::venv::PythonEnv;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The five setup steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Probe,
    Environment,
    Dependencies,
    Model,
    Alias,
}

impl StepKind {
    pub const ALL: [StepKind; 5] = [
        StepKind::Probe,
        StepKind::Environment,
        StepKind::Dependencies,
        StepKind::Model,
        StepKind::Alias,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Probe => "Checking Ollama server",
            Self::Environment => "Python environment",
            Self::Dependencies => "Installing dependencies",
            Self::Model => "Model",
            Self::Alias => "Shell command",
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::Probe => "probe",
            Self::Environment => "environment",
            Self::Dependencies => "dependencies",
            Self::Model => "model",
            Self::Alias => "alias",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// An action was performed.
    Done(String),
    /// Already in the desired state.
    Skipped(String),
    /// Dry run: the action that would have been taken.
    Planned(String),
    /// Advisory failure; the sequence continues.
    Warned(String),
    Failed(String),
    /// Not attempted because an earlier step failed.
    NotRun,
}

impl StepOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

#[derive(Debug, Default)]
pub struct SetupReport {
    pub steps: Vec<(StepKind, StepOutcome)>,
    /// Set whenever the alias is in the profile (freshly appended or already there).
    pub reload_hint: Option<String>,
}

impl SetupReport {
    pub fn is_success(&self) -> bool {
        !self.steps.iter().any(|(_, o)| o.is_failure())
    }

    pub fn outcome(&self, kind: StepKind) -> Option<&StepOutcome> {
        self.steps.iter().find(|(k, _)| *k == kind).map(|(_, o)| o)
    }

    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary::new();
        for (_, outcome) in &self.steps {
            match outcome {
                StepOutcome::Done(_) => summary.done += 1,
                StepOutcome::Skipped(_) => summary.skipped += 1,
                StepOutcome::Planned(_) => summary.planned += 1,
                StepOutcome::Warned(_) => summary.warned += 1,
                StepOutcome::Failed(_) => summary.failed += 1,
                StepOutcome::NotRun => summary.not_run += 1,
            }
        }
        summary
    }
}

/// One line of `check` output.
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityStatus {
    pub name: &'static str,
    pub present: bool,
    /// Missing advisory capabilities do not make the machine "not ready".
    pub advisory: bool,
    pub detail: String,
}

pub fn is_ready(statuses: &[CapabilityStatus]) -> bool {
    statuses.iter().all(|s| s.present || s.advisory)
}

/// Pick the shell and profile path: explicit config first, then `$SHELL`, then platform default.
pub fn resolve_profile(
    config: &SetupConfig,
    shell_env: Option<&str>,
    home: Option<&Path>,
) -> Result<ShellProfile> {
    let shell = match config.shell.as_deref() {
        Some(name) => Shell::from_name(name)?,
        None => Shell::detect(shell_env),
    };

    let path = match &config.profile_path {
        Some(p) => PathBuf::from(p),
        None => {
            let home = home.ok_or_else(|| {
                anyhow!("Cannot locate home directory; pass --profile to choose a shell profile")
            })?;
            shell.default_profile(home)
        }
    };

    Ok(ShellProfile::new(path, shell))
}

/// Forwards to another runner, logging each invocation first.
struct LoggedRunner<'a> {
    inner: &'a dyn CommandRunner,
    logger: &'a Logger,
}

impl CommandRunner for LoggedRunner<'_> {
    fn output(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        let _ = self.logger.log_command(program, args);
        self.inner.output(program, args)
    }

    fn interactive(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        let _ = self.logger.log_command(program, args);
        self.inner.interactive(program, args)
    }

    fn is_available(&self, program: &str, timeout: Duration) -> bool {
        self.inner.is_available(program, timeout)
    }
}

/// Runs the setup sequence against one configuration.
pub struct Setup<'a> {
    config: &'a SetupConfig,
    runner: LoggedRunner<'a>,
    logger: &'a Logger,
    env: PythonEnv,
    registry: ModelRegistry,
    profile: ShellProfile,
    dry_run: bool,
}

impl<'a> Setup<'a> {
    pub fn new(
        config: &'a SetupConfig,
        runner: &'a dyn CommandRunner,
        logger: &'a Logger,
        profile: ShellProfile,
    ) -> Self {
        Self {
            config,
            runner: LoggedRunner { inner: runner, logger },
            logger,
            env: PythonEnv::new(&config.venv_dir, &config.python_executable),
            registry: ModelRegistry::new(&config.ollama_executable),
            profile,
            dry_run: false,
        }
    }

    /// Query only: presence checks run, nothing is created, installed, pulled or appended.
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    pub fn profile(&self) -> &ShellProfile {
        &self.profile
    }

    /// Run every step in order, printing progress as it goes.
    ///
    /// Fail-fast unless `keep_going` is set; the probe never stops the sequence.
    pub async fn run(&self) -> SetupReport {
        let mut report = SetupReport::default();
        let total = StepKind::ALL.len();
        let mut halted = false;

        for (i, kind) in StepKind::ALL.into_iter().enumerate() {
            if halted {
                report.steps.push((kind, StepOutcome::NotRun));
                continue;
            }

            interface::print_step_start(i + 1, total, kind);
            let outcome = match kind {
                StepKind::Probe => self.probe_step().await,
                StepKind::Environment => self.environment_step(),
                StepKind::Dependencies => self.dependencies_step(),
                StepKind::Model => self.model_step(),
                StepKind::Alias => self.alias_step(),
            };
            interface::print_outcome(&outcome);
            self.log_outcome(kind, &outcome);

            if kind == StepKind::Alias && !outcome.is_failure() {
                report.reload_hint = Some(self.profile.shell().reload_hint(self.profile.path()));
            }
            if outcome.is_failure() && !self.config.keep_going {
                halted = true;
            }
            report.steps.push((kind, outcome));
        }

        report
    }

    fn log_outcome(&self, kind: StepKind, outcome: &StepOutcome) {
        let _ = match outcome {
            StepOutcome::Failed(msg) => self.logger.log_error(&format!("{}: {}", kind.key(), msg)),
            other => self.logger.log_step(kind.key(), &format!("{:?}", other)),
        };
    }

    async fn probe_step(&self) -> StepOutcome {
        let timeout = Duration::from_millis(self.config.probe_timeout_ms);
        match probe::probe(&self.config.ollama_url, timeout).await {
            ProbeOutcome::Reachable { models: Some(models) } => StepOutcome::Done(format!(
                "Ollama is running at {} ({} model(s) served)",
                self.config.ollama_url,
                models.len()
            )),
            ProbeOutcome::Reachable { models: None } => {
                StepOutcome::Done(format!("Ollama is running at {}", self.config.ollama_url))
            }
            ProbeOutcome::Unreachable(reason) => StepOutcome::Warned(format!(
                "Ollama not reachable ({}). Start it with `ollama serve`; continuing anyway",
                reason
            )),
        }
    }

    fn environment_step(&self) -> StepOutcome {
        let dir = self.env.dir().display();
        if self.env.is_present() {
            return StepOutcome::Skipped(format!("{} already exists", dir));
        }
        if self.dry_run {
            return StepOutcome::Planned(format!("would create {}", dir));
        }
        match self.env.create(&self.runner) {
            Ok(()) => StepOutcome::Done(format!("created {}", dir)),
            Err(e) => StepOutcome::Failed(format!("{:#}", e)),
        }
    }

    fn dependencies_step(&self) -> StepOutcome {
        let packages = &self.config.packages;
        if packages.is_empty() {
            return StepOutcome::Skipped("no packages configured".to_string());
        }
        let list = packages.join(", ");
        if self.dry_run {
            return StepOutcome::Planned(format!("would install {}", list));
        }
        match self.env.install(&self.runner, packages) {
            Ok(()) => StepOutcome::Done(format!("installed {}", list)),
            Err(e) => StepOutcome::Failed(format!("{:#}", e)),
        }
    }

    fn model_step(&self) -> StepOutcome {
        let model = &self.config.model;
        match self.registry.is_present(&self.runner, model) {
            Ok(true) => StepOutcome::Skipped(format!("{} already installed", model)),
            Ok(false) if self.dry_run => StepOutcome::Planned(format!("would pull {}", model)),
            Ok(false) => match self.registry.pull(&self.runner, model) {
                Ok(()) => StepOutcome::Done(format!("pulled {}", model)),
                Err(e) => StepOutcome::Failed(format!("{:#}", e)),
            },
            Err(e) => StepOutcome::Failed(format!("{:#}", e)),
        }
    }

    fn alias_step(&self) -> StepOutcome {
        match self.alias_step_inner() {
            Ok(outcome) => outcome,
            Err(e) => StepOutcome::Failed(format!("{:#}", e)),
        }
    }

    fn alias_step_inner(&self) -> Result<StepOutcome> {
        let name = &self.config.command_name;
        let profile_path = self.profile.path().display();

        if self.profile.has_alias(name)? {
            return Ok(StepOutcome::Skipped(format!("'{}' already defined in {}", name, profile_path)));
        }

        let script = self.resolve_script()?;
        let python = self.env.python_path()?;

        if self.dry_run {
            let line = self.profile.shell().definition_line(name, &python, &script);
            return Ok(StepOutcome::Planned(format!("would append to {}: {}", profile_path, line)));
        }

        match self.profile.ensure_alias(name, &python, &script)? {
            AliasOutcome::AlreadyPresent => {
                Ok(StepOutcome::Skipped(format!("'{}' already defined in {}", name, profile_path)))
            }
            AliasOutcome::Appended(_) => Ok(StepOutcome::Done(format!(
                "added '{}' ({} profile: {})",
                name,
                self.profile.shell().display_name(),
                profile_path
            ))),
        }
    }

    fn resolve_script(&self) -> Result<PathBuf> {
        let script = Path::new(&self.config.cli_script);
        if !script.is_file() {
            return Err(anyhow!(
                "CLI script not found at {}; run setup from the project directory or pass --script",
                script.display()
            ));
        }
        fs::canonicalize(script).with_context(|| format!("Failed to resolve {}", script.display()))
    }

    /// Presence queries only; never mutates anything.
    pub async fn check(&self) -> Vec<CapabilityStatus> {
        let timeout = Duration::from_secs(self.config.tool_check_timeout_secs);
        let mut statuses = Vec::new();

        let probe = probe::probe(
            &self.config.ollama_url,
            Duration::from_millis(self.config.probe_timeout_ms),
        )
        .await;
        statuses.push(CapabilityStatus {
            name: "ollama server",
            present: probe.is_reachable(),
            advisory: true,
            detail: match probe {
                ProbeOutcome::Reachable { .. } => self.config.ollama_url.clone(),
                ProbeOutcome::Unreachable(reason) => reason,
            },
        });

        let python = &self.config.python_executable;
        statuses.push(CapabilityStatus {
            name: "python",
            present: self.runner.is_available(python, timeout),
            advisory: false,
            detail: python.clone(),
        });

        let ollama = self.registry.executable();
        let ollama_available = self.runner.is_available(ollama, timeout);
        statuses.push(CapabilityStatus {
            name: "ollama cli",
            present: ollama_available,
            advisory: false,
            detail: ollama.to_string(),
        });

        statuses.push(CapabilityStatus {
            name: "environment",
            present: self.env.is_present(),
            advisory: false,
            detail: self.env.dir().display().to_string(),
        });

        let model = &self.config.model;
        let (model_present, model_detail) = if ollama_available {
            match self.registry.is_present(&self.runner, model) {
                Ok(true) => (true, model.clone()),
                Ok(false) => (false, format!("{} not installed", model)),
                Err(e) => (false, format!("{:#}", e)),
            }
        } else {
            (false, format!("{} (ollama cli unavailable)", model))
        };
        statuses.push(CapabilityStatus {
            name: "model",
            present: model_present,
            advisory: false,
            detail: model_detail,
        });

        let name = &self.config.command_name;
        let (alias_present, alias_detail) = match self.profile.has_alias(name) {
            Ok(present) => (present, format!("'{}' in {}", name, self.profile.path().display())),
            Err(e) => (false, format!("{:#}", e)),
        };
        statuses.push(CapabilityStatus {
            name: "shell command",
            present: alias_present,
            advisory: false,
            detail: alias_detail,
        });

        statuses
    }
}
