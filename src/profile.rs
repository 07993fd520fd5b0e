use crate::utils::{ensure_dir, quote_fish, quote_posix, quote_powershell};
use anyhow::{anyhow, Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Shells whose startup file we know how to extend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Bash,
    Zsh,
    Sh,
    Fish,
    PowerShell,
}

impl Shell {
    pub fn from_name(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "bash" => Ok(Self::Bash),
            "zsh" => Ok(Self::Zsh),
            "sh" | "dash" | "ksh" => Ok(Self::Sh),
            "fish" => Ok(Self::Fish),
            "powershell" | "pwsh" | "powershell.exe" | "pwsh.exe" => Ok(Self::PowerShell),
            other => Err(anyhow!(
                "Unknown shell '{}'. Supported: bash, zsh, sh, fish, powershell",
                other
            )),
        }
    }

    /// Pick a shell from the `$SHELL` value, falling back to the platform default.
    pub fn detect(shell_env: Option<&str>) -> Self {
        let fallback = if cfg!(windows) { Self::PowerShell } else { Self::Bash };
        shell_env
            .and_then(|path| Path::new(path).file_name())
            .and_then(|name| Self::from_name(&name.to_string_lossy()).ok())
            .unwrap_or(fallback)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Bash => "bash",
            Self::Zsh => "zsh",
            Self::Sh => "sh",
            Self::Fish => "fish",
            Self::PowerShell => "PowerShell",
        }
    }

    /// The startup file this shell reads for interactive sessions.
    pub fn default_profile(&self, home: &Path) -> PathBuf {
        match self {
            Self::Bash => home.join(".bashrc"),
            Self::Zsh => home.join(".zshrc"),
            Self::Sh => home.join(".profile"),
            Self::Fish => home.join(".config").join("fish").join("config.fish"),
            Self::PowerShell if cfg!(windows) => home
                .join("Documents")
                .join("PowerShell")
                .join("Microsoft.PowerShell_profile.ps1"),
            Self::PowerShell => home
                .join(".config")
                .join("powershell")
                .join("Microsoft.PowerShell_profile.ps1"),
        }
    }

    /// Prefix of the definition line; its presence means the alias exists.
    pub fn marker(&self, name: &str) -> String {
        match self {
            Self::Bash | Self::Zsh | Self::Sh => format!("{name}() {{"),
            Self::Fish => format!("function {name};"),
            Self::PowerShell => format!("function {name} {{"),
        }
    }

    /// Whether `contents` already defines `name` for this shell.
    /// PowerShell keywords and function names are case-insensitive.
    pub fn has_definition(&self, contents: &str, name: &str) -> bool {
        let marker = self.marker(name);
        match self {
            Self::PowerShell => contains_definition(&contents.to_lowercase(), &marker.to_lowercase()),
            _ => contains_definition(contents, &marker),
        }
    }

    /// One-line function forwarding every argument to `python script`.
    pub fn definition_line(&self, name: &str, python: &Path, script: &Path) -> String {
        let py = python.to_string_lossy();
        let cli = script.to_string_lossy();
        match self {
            Self::Bash | Self::Zsh | Self::Sh => {
                format!("{}() {{ {} {} \"$@\"; }}", name, quote_posix(&py), quote_posix(&cli))
            }
            Self::Fish => {
                format!("function {}; {} {} $argv; end", name, quote_fish(&py), quote_fish(&cli))
            }
            Self::PowerShell => format!(
                "function {} {{ & {} {} @args }}",
                name,
                quote_powershell(&py),
                quote_powershell(&cli)
            ),
        }
    }

    /// Command the user runs to load the profile into the current session.
    pub fn reload_hint(&self, profile: &Path) -> String {
        let p = profile.to_string_lossy();
        match self {
            Self::Bash | Self::Zsh => format!("source {}", quote_posix(&p)),
            Self::Sh => format!(". {}", quote_posix(&p)),
            Self::Fish => format!("source {}", quote_fish(&p)),
            Self::PowerShell => format!(". {}", quote_powershell(&p)),
        }
    }
}

/// True when a line, ignoring leading whitespace, starts with `marker`.
/// Commented-out definitions never count.
pub fn contains_definition(contents: &str, marker: &str) -> bool {
    contents
        .lines()
        .map(str::trim_start)
        .any(|line| line.starts_with(marker))
}

#[derive(Debug, Clone, PartialEq)]
pub enum AliasOutcome {
    AlreadyPresent,
    /// The line that was appended.
    Appended(String),
}

/// A shell startup file that may carry the alias definition.
pub struct ShellProfile {
    path: PathBuf,
    shell: Shell,
}

impl ShellProfile {
    pub fn new(path: PathBuf, shell: Shell) -> Self {
        Self { path, shell }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn shell(&self) -> Shell {
        self.shell
    }

    /// A missing profile reads as empty. Bytes that are not UTF-8 are replaced,
    /// the file itself is only ever appended to.
    fn read(&self) -> Result<String> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", self.path.display())),
        }
    }

    pub fn has_alias(&self, name: &str) -> Result<bool> {
        Ok(self.shell.has_definition(&self.read()?, name))
    }

    /// Append the definition for `name` unless one is already there.
    /// Creates the profile (and its parent directories) when missing.
    pub fn ensure_alias(&self, name: &str, python: &Path, script: &Path) -> Result<AliasOutcome> {
        let contents = self.read()?;
        if self.shell.has_definition(&contents, name) {
            return Ok(AliasOutcome::AlreadyPresent);
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                ensure_dir(parent)?;
            }
        }

        let line = self.shell.definition_line(name, python, script);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {} for writing", self.path.display()))?;

        // Keep the new definition on its own line
        let separator = if contents.is_empty() || contents.ends_with('\n') { "" } else { "\n" };
        writeln!(file, "{separator}{line}")
            .with_context(|| format!("Failed to append to {}", self.path.display()))?;

        Ok(AliasOutcome::Appended(line))
    }
}
