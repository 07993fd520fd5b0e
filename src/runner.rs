use anyhow::{Context, Result};
use std::process::{Command, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Outcome of an external command that was successfully spawned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Returns true only when the process exited with code 0.
    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn success(stdout: &str) -> Self {
        Self { exit_code: Some(0), stdout: stdout.to_string(), stderr: String::new() }
    }

    pub fn failure(code: i32, stderr: &str) -> Self {
        Self { exit_code: Some(code), stdout: String::new(), stderr: stderr.to_string() }
    }
}

/// Seam between the setup steps and the processes they drive
/// (python, pip, ollama). `Err` means the program could not be spawned at all.
pub trait CommandRunner {
    /// Run to completion with stdout/stderr captured.
    fn output(&self, program: &str, args: &[String]) -> Result<CommandOutput>;

    /// Run with inherited stdio so the user sees progress. Only the exit code is reported.
    fn interactive(&self, program: &str, args: &[String]) -> Result<CommandOutput>;

    /// True when `program --version` exits successfully within `timeout`.
    fn is_available(&self, program: &str, timeout: Duration) -> bool;
}

/// Runs real processes on the host.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn output(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        let out = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to run {}", program))?;

        Ok(CommandOutput {
            exit_code: out.status.code(),
            stdout: String::from_utf8_lossy(&out.stdout).to_string(),
            stderr: String::from_utf8_lossy(&out.stderr).to_string(),
        })
    }

    fn interactive(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        let status = Command::new(program)
            .args(args)
            .status()
            .with_context(|| format!("Failed to run {}", program))?;

        Ok(CommandOutput { exit_code: status.code(), ..Default::default() })
    }

    fn is_available(&self, program: &str, timeout: Duration) -> bool {
        let child = Command::new(program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        let mut child = match child {
            Ok(c) => c,
            Err(_) => return false,
        };

        match child.wait_timeout(timeout) {
            Ok(Some(status)) => status.success(),
            Ok(None) => {
                // Hung on --version: treat as unavailable
                let _ = child.kill();
                let _ = child.wait();
                false
            }
            Err(_) => false,
        }
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::path::Path;

    /// Scripted runner that records every invocation.
    ///
    /// Responses are keyed by `(program, first arg)`; unknown commands succeed
    /// with empty output. A successful `-m venv <dir>` creates `<dir>` like the
    /// real interpreter would.
    #[derive(Default)]
    pub struct FakeRunner {
        responses: HashMap<(String, String), CommandOutput>,
        spawn_failures: Vec<String>,
        unavailable: Vec<String>,
        pub calls: RefCell<Vec<Vec<String>>>,
    }

    impl FakeRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(mut self, program: &str, first_arg: &str, output: CommandOutput) -> Self {
            self.responses
                .insert((program.to_string(), first_arg.to_string()), output);
            self
        }

        pub fn missing_program(mut self, program: &str) -> Self {
            self.spawn_failures.push(program.to_string());
            self.unavailable.push(program.to_string());
            self
        }

        /// Invocations whose program or any argument equals `needle`.
        pub fn calls_with(&self, needle: &str) -> Vec<Vec<String>> {
            self.calls
                .borrow()
                .iter()
                .filter(|call| call.iter().any(|a| a == needle))
                .cloned()
                .collect()
        }

        fn record(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
            let mut call = vec![program.to_string()];
            call.extend(args.iter().cloned());
            self.calls.borrow_mut().push(call);

            if self.spawn_failures.iter().any(|p| p == program) {
                anyhow::bail!("Failed to run {}: No such file or directory", program);
            }

            let first = args.first().cloned().unwrap_or_default();
            let output = self
                .responses
                .get(&(program.to_string(), first))
                .cloned()
                .unwrap_or_else(|| CommandOutput::success(""));

            if output.is_success() && args.len() == 3 && args[0] == "-m" && args[1] == "venv" {
                std::fs::create_dir_all(Path::new(&args[2]))?;
            }
            Ok(output)
        }
    }

    impl CommandRunner for FakeRunner {
        fn output(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
            self.record(program, args)
        }

        fn interactive(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
            self.record(program, args)
        }

        fn is_available(&self, program: &str, _timeout: Duration) -> bool {
            !self.unavailable.iter().any(|p| p == program)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_success() {
        assert!(CommandOutput::success("ok").is_success());
        assert!(!CommandOutput::failure(1, "boom").is_success());
        assert!(!CommandOutput::default().is_success());
    }

    #[test]
    fn test_system_runner_missing_program() {
        let runner = SystemRunner;
        let result = runner.output("definitely-not-a-real-binary-12345", &[]);
        assert!(result.is_err());
        assert!(!runner.is_available("definitely-not-a-real-binary-12345", Duration::from_secs(1)));
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_captures_output() {
        let runner = SystemRunner;
        let out = runner
            .output("sh", &["-c".to_string(), "echo hello; echo oops >&2; exit 3".to_string()])
            .unwrap();
        assert_eq!(out.exit_code, Some(3));
        assert_eq!(out.stdout.trim(), "hello");
        assert_eq!(out.stderr.trim(), "oops");
    }

    #[test]
    fn test_fake_runner_records_calls() {
        let runner = fake::FakeRunner::new()
            .respond("ollama", "list", CommandOutput::success("NAME ID\n"));
        let out = runner.output("ollama", &["list".to_string()]).unwrap();
        assert!(out.stdout.starts_with("NAME"));
        assert_eq!(runner.calls_with("list").len(), 1);
    }
}
