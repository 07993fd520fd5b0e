use crate::utils::is_valid_command_name;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Packages the Local AI CLI imports at runtime.
pub const DEFAULT_PACKAGES: &[&str] = &["rich", "httpx", "prompt_toolkit", "pyyaml"];

const CONFIG_FILE_NAME: &str = "localcli-setup.toml";

/// Setup configuration, loaded from `localcli-setup.toml` and `LOCALCLI_*` env vars.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SetupConfig {
    pub ollama_url: String,
    pub probe_timeout_ms: u64,
    pub model: String,
    pub ollama_executable: String,
    pub venv_dir: String,
    pub python_executable: String,
    pub packages: Vec<String>,
    pub cli_script: String,
    pub command_name: String,
    pub shell: Option<String>,
    pub profile_path: Option<String>,
    pub keep_going: bool,
    pub tool_check_timeout_secs: u64,
    pub log_dir: String,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            ollama_url: "http://localhost:11434".to_string(),
            probe_timeout_ms: 3000,
            model: "qwen2.5-coder:14b".to_string(),
            ollama_executable: "ollama".to_string(),
            venv_dir: ".venv".to_string(),
            python_executable: if cfg!(windows) { "python" } else { "python3" }.to_string(),
            packages: DEFAULT_PACKAGES.iter().map(|p| p.to_string()).collect(),
            cli_script: "cli.py".to_string(),
            command_name: "ai".to_string(),
            shell: None,
            profile_path: None,
            keep_going: false,
            tool_check_timeout_secs: 5,
            log_dir: config_dir().join("logs").to_string_lossy().into_owned(),
        }
    }
}

/// Directory holding the Local AI CLI's configuration.
///
/// `LOCALCLI_CONFIG_DIR` wins, then `$XDG_CONFIG_HOME/localcli` on Linux,
/// then `~/.config/localcli`.
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("LOCALCLI_CONFIG_DIR") {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    if cfg!(target_os = "linux") {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            if !xdg.is_empty() {
                return PathBuf::from(xdg).join("localcli");
            }
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("localcli")
}

impl SetupConfig {
    /// Load configuration with the chain: `explicit` -> `./localcli-setup.toml`
    /// -> `<config dir>/setup.toml` -> defaults, then apply env overrides.
    pub fn load(explicit: Option<&Path>) -> Self {
        let mut cfg = Self::from_files(&Self::config_paths(explicit));
        for warning in cfg.apply_env_overrides(|key| std::env::var(key).ok()) {
            eprintln!("Warning: {}", warning);
        }
        cfg
    }

    fn config_paths(explicit: Option<&Path>) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(path) = explicit {
            paths.push(path.to_path_buf());
        }
        paths.push(PathBuf::from(CONFIG_FILE_NAME));
        paths.push(config_dir().join("setup.toml"));
        paths
    }

    /// First readable and parseable file wins; unreadable ones are skipped.
    fn from_files(candidates: &[PathBuf]) -> Self {
        for path in candidates {
            if let Ok(contents) = fs::read_to_string(path) {
                match Self::from_toml(&contents) {
                    Ok((cfg, warnings)) => {
                        for warning in warnings {
                            eprintln!("Warning: {} in {}", warning, path.display());
                        }
                        return cfg;
                    }
                    Err(e) => {
                        eprintln!("Warning: failed to parse {}: {}", path.display(), e);
                    }
                }
            }
        }
        Self::default()
    }

    /// Parse a TOML document, resetting invalid values to their defaults.
    pub fn from_toml(contents: &str) -> Result<(Self, Vec<String>), toml::de::Error> {
        let mut cfg: SetupConfig = toml::from_str(contents)?;
        let warnings = cfg.sanitize();
        Ok((cfg, warnings))
    }

    /// Replace every invalid value with its default. Returns one message per reset.
    pub fn sanitize(&mut self) -> Vec<String> {
        let defaults = Self::default();
        let mut warnings = Vec::new();

        if !self.ollama_url.starts_with("http") {
            warnings.push(format!("invalid ollama_url {:?}, using default", self.ollama_url));
            self.ollama_url = defaults.ollama_url;
        }
        if self.model.trim().is_empty() {
            warnings.push("empty model, using default".to_string());
            self.model = defaults.model;
        }
        if !is_valid_command_name(&self.command_name) {
            warnings.push(format!("invalid command_name {:?}, using default", self.command_name));
            self.command_name = defaults.command_name;
        }
        if self.probe_timeout_ms == 0 {
            warnings.push("probe_timeout_ms must be > 0, using default".to_string());
            self.probe_timeout_ms = defaults.probe_timeout_ms;
        }
        if self.tool_check_timeout_secs == 0 {
            warnings.push("tool_check_timeout_secs must be > 0, using default".to_string());
            self.tool_check_timeout_secs = defaults.tool_check_timeout_secs;
        }
        if self.packages.iter().any(|p| p.trim().is_empty()) {
            warnings.push("empty package name in packages, dropping it".to_string());
            self.packages.retain(|p| !p.trim().is_empty());
        }

        warnings
    }

    /// Apply `LOCALCLI_*` overrides read through `lookup`.
    /// Invalid values are ignored individually; the returned messages describe them.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut warnings = Vec::new();

        if let Some(url) = lookup("LOCALCLI_OLLAMA_URL") {
            if url.starts_with("http") {
                self.ollama_url = url;
            } else {
                warnings.push(format!("env var LOCALCLI_OLLAMA_URL: invalid value {:?}", url));
            }
        }
        if let Some(model) = lookup("LOCALCLI_MODEL") {
            if model.trim().is_empty() {
                warnings.push("env var LOCALCLI_MODEL: empty value".to_string());
            } else {
                self.model = model;
            }
        }
        if let Some(dir) = lookup("LOCALCLI_VENV_DIR") {
            if !dir.is_empty() {
                self.venv_dir = dir;
            }
        }
        if let Some(name) = lookup("LOCALCLI_COMMAND_NAME") {
            if is_valid_command_name(&name) {
                self.command_name = name;
            } else {
                warnings.push(format!("env var LOCALCLI_COMMAND_NAME: invalid value {:?}", name));
            }
        }
        if let Some(shell) = lookup("LOCALCLI_SHELL") {
            if !shell.is_empty() {
                self.shell = Some(shell);
            }
        }
        if let Some(flag) = lookup("LOCALCLI_KEEP_GOING") {
            self.keep_going = parse_bool(&flag);
        }

        warnings
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}
