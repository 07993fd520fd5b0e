use crate::runner::CommandRunner;
use crate::utils::truncate_output;
use anyhow::{anyhow, Context, Result};

/// Ollama's local model registry, driven through its CLI.
pub struct ModelRegistry {
    executable: String,
}

impl ModelRegistry {
    pub fn new(executable: &str) -> Self {
        Self { executable: executable.to_string() }
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    /// Names of installed models, from `ollama list`.
    pub fn list(&self, runner: &dyn CommandRunner) -> Result<Vec<String>> {
        let out = runner
            .output(&self.executable, &["list".to_string()])
            .with_context(|| format!("Failed to run {} list. Is Ollama installed?", self.executable))?;

        if !out.is_success() {
            return Err(anyhow!(
                "{} list failed: {}",
                self.executable,
                truncate_output(&out.stderr, 500)
            ));
        }
        Ok(parse_model_list(&out.stdout))
    }

    pub fn is_present(&self, runner: &dyn CommandRunner, model: &str) -> Result<bool> {
        Ok(contains_model(&self.list(runner)?, model))
    }

    /// `ollama pull <model>` with inherited stdio so download progress stays visible.
    pub fn pull(&self, runner: &dyn CommandRunner, model: &str) -> Result<()> {
        let out = runner
            .interactive(&self.executable, &["pull".to_string(), model.to_string()])
            .with_context(|| format!("Failed to run {} pull", self.executable))?;

        if out.is_success() {
            Ok(())
        } else {
            Err(anyhow!(
                "{} pull {} exited with {}",
                self.executable,
                model,
                out.exit_code.map_or("a signal".to_string(), |c| format!("code {c}"))
            ))
        }
    }
}

/// Parse `ollama list` output: first whitespace column of every row after the header.
pub fn parse_model_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !line.starts_with("NAME"))
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

/// Give an untagged model name the implicit `:latest` tag.
///
/// Only a colon after the last `/` is a tag, so `host:5000/model` stays untagged.
pub fn normalize_model_name(name: &str) -> String {
    let base = name.rsplit('/').next().unwrap_or(name);
    if base.contains(':') {
        name.to_string()
    } else {
        format!("{name}:latest")
    }
}

/// Exact match after tag normalization. `qwen2.5-coder` does not match `qwen2.5-coder:14b`.
pub fn contains_model(installed: &[String], model: &str) -> bool {
    let wanted = normalize_model_name(model);
    installed.iter().any(|name| normalize_model_name(name) == wanted)
}
