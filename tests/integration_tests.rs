// Integration tests for localcli-setup

use anyhow::Result;
use localcli_setup::interface::render_completion;
use localcli_setup::logger::Logger;
use localcli_setup::profile::{Shell, ShellProfile};
use localcli_setup::runner::{CommandOutput, CommandRunner};
use localcli_setup::{Setup, SetupConfig, StepKind, StepOutcome};
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Pretends to be python, pip and ollama. Keeps a registry of pulled models.
struct FakeMachine {
    models: RefCell<Vec<String>>,
    calls: RefCell<Vec<String>>,
}

impl FakeMachine {
    fn new(models: &[&str]) -> Self {
        Self {
            models: RefCell::new(models.iter().map(|m| m.to_string()).collect()),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn count(&self, needle: &str) -> usize {
        self.calls.borrow().iter().filter(|c| c.contains(needle)).count()
    }
}

impl CommandRunner for FakeMachine {
    fn output(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        let program_name = Path::new(program)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        self.calls
            .borrow_mut()
            .push(format!("{} {}", program_name, args.join(" ")));

        match (program_name.as_str(), args.first().map(String::as_str)) {
            ("python3" | "python", Some("-m")) => {
                fs::create_dir_all(&args[2])?;
                Ok(CommandOutput::success(""))
            }
            ("pip", Some("install")) => Ok(CommandOutput::success("Successfully installed")),
            ("ollama", Some("list")) => {
                let mut out = String::from("NAME    ID    SIZE    MODIFIED\n");
                for m in self.models.borrow().iter() {
                    out.push_str(&format!("{m}    abc123    9.0 GB    now\n"));
                }
                Ok(CommandOutput::success(&out))
            }
            _ => Ok(CommandOutput::failure(127, "unexpected command")),
        }
    }

    fn interactive(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        self.calls
            .borrow_mut()
            .push(format!("{} {}", program, args.join(" ")));
        if program == "ollama" && args.first().map(String::as_str) == Some("pull") {
            self.models.borrow_mut().push(args[1].clone());
            return Ok(CommandOutput::success(""));
        }
        Ok(CommandOutput::failure(127, "unexpected command"))
    }

    fn is_available(&self, _program: &str, _timeout: Duration) -> bool {
        true
    }
}

fn project(dir: &Path, ollama_url: &str) -> SetupConfig {
    fs::write(dir.join("cli.py"), "print('local ai')\n").unwrap();
    SetupConfig {
        ollama_url: ollama_url.to_string(),
        probe_timeout_ms: 500,
        venv_dir: dir.join(".venv").to_string_lossy().into_owned(),
        cli_script: dir.join("cli.py").to_string_lossy().into_owned(),
        log_dir: dir.join("logs").to_string_lossy().into_owned(),
        ..SetupConfig::default()
    }
}

#[tokio::test]
async fn test_end_to_end_fresh_machine() {
    let tmp = tempfile::tempdir().unwrap();
    let config = project(tmp.path(), "http://127.0.0.1:1");
    let bashrc = tmp.path().join(".bashrc");
    fs::write(&bashrc, "").unwrap();

    let machine = FakeMachine::new(&[]);
    let logger = Logger::new(&tmp.path().join("logs")).unwrap();
    let profile = ShellProfile::new(bashrc.clone(), Shell::Bash);

    let report = Setup::new(&config, &machine, &logger, profile).run().await;

    assert!(report.is_success());
    assert!(tmp.path().join(".venv").is_dir());
    assert_eq!(machine.count("pip install rich httpx prompt_toolkit pyyaml"), 1);
    assert_eq!(machine.count("ollama pull qwen2.5-coder:14b"), 1);

    let contents = fs::read_to_string(&bashrc).unwrap();
    assert_eq!(contents.lines().count(), 1);
    let line = contents.lines().next().unwrap();
    assert!(line.starts_with("ai() {"));
    let venv = fs::canonicalize(tmp.path().join(".venv")).unwrap();
    assert!(line.contains(&*venv.to_string_lossy()));
    let script = fs::canonicalize(tmp.path().join("cli.py")).unwrap();
    assert!(line.contains(&*script.to_string_lossy()));

    let completion = render_completion(&config.command_name, report.reload_hint.as_deref()).join("\n");
    assert!(completion.contains("Setup complete!"));
    assert!(completion.contains("Usage:"));
    assert!(completion.contains(".bashrc"));

    let log = fs::read_to_string(logger.path().unwrap()).unwrap();
    assert!(log.contains("RUN ollama pull qwen2.5-coder:14b"));
}

#[tokio::test]
async fn test_rerun_changes_nothing_but_pip() {
    let tmp = tempfile::tempdir().unwrap();
    let config = project(tmp.path(), "http://127.0.0.1:1");
    let bashrc = tmp.path().join(".bashrc");
    let machine = FakeMachine::new(&[]);
    let logger = Logger::disabled();

    for _ in 0..2 {
        let profile = ShellProfile::new(bashrc.clone(), Shell::Bash);
        let report = Setup::new(&config, &machine, &logger, profile).run().await;
        assert!(report.is_success());
    }

    assert_eq!(machine.count("-m venv"), 1);
    assert_eq!(machine.count("pip install"), 2);
    assert_eq!(machine.count("ollama pull"), 1);
    assert_eq!(fs::read_to_string(&bashrc).unwrap().lines().count(), 1);
}

#[tokio::test]
async fn test_probe_error_does_not_block_setup() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/tags")
        .with_status(500)
        .create_async()
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let config = project(tmp.path(), &server.url());
    let machine = FakeMachine::new(&["qwen2.5-coder:14b"]);
    let logger = Logger::disabled();
    let profile = ShellProfile::new(tmp.path().join(".zshrc"), Shell::Zsh);

    let report = Setup::new(&config, &machine, &logger, profile).run().await;

    assert!(matches!(report.outcome(StepKind::Probe), Some(StepOutcome::Warned(_))));
    assert!(report.is_success());
    assert!(matches!(report.outcome(StepKind::Model), Some(StepOutcome::Skipped(_))));
    assert!(matches!(report.outcome(StepKind::Alias), Some(StepOutcome::Done(_))));
}

#[tokio::test]
async fn test_reachable_server_reports_done() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/tags")
        .with_status(200)
        .with_body(r#"{"models":[]}"#)
        .create_async()
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let config = project(tmp.path(), &server.url());
    let machine = FakeMachine::new(&["qwen2.5-coder:14b"]);
    let logger = Logger::disabled();
    let profile = ShellProfile::new(tmp.path().join("config.fish"), Shell::Fish);

    let report = Setup::new(&config, &machine, &logger, profile).run().await;

    match report.outcome(StepKind::Probe) {
        Some(StepOutcome::Done(msg)) => assert!(msg.contains("0 model(s)")),
        other => panic!("unexpected probe outcome: {:?}", other),
    }
    let fish = fs::read_to_string(tmp.path().join("config.fish")).unwrap();
    assert!(fish.starts_with("function ai;"));
}

#[test]
fn test_config_loaded_from_explicit_path() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("localcli-setup.toml");
    fs::write(&path, "model = \"llama3.1:8b\"\ncommand_name = \"llm\"\n").unwrap();

    let cfg = SetupConfig::load(Some(&path));
    assert_eq!(cfg.model, "llama3.1:8b");
    assert_eq!(cfg.command_name, "llm");
}
