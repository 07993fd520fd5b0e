use crate::runner::CommandRunner;
use crate::utils::truncate_output;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// A Python virtual environment rooted at a fixed directory.
pub struct PythonEnv {
    dir: PathBuf,
    python_executable: String,
}

impl PythonEnv {
    /// `dir`: where the environment lives (relative paths resolve against the cwd).
    /// `python_executable`: interpreter used to run `-m venv`.
    pub fn new(dir: &str, python_executable: &str) -> Self {
        Self { dir: PathBuf::from(dir), python_executable: python_executable.to_string() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The environment counts as present when its directory exists.
    pub fn is_present(&self) -> bool {
        self.dir.is_dir()
    }

    /// Absolute environment directory, canonical once it exists.
    pub fn absolute_dir(&self) -> Result<PathBuf> {
        if self.dir.exists() {
            return fs::canonicalize(&self.dir)
                .with_context(|| format!("Failed to resolve {}", self.dir.display()));
        }
        std::path::absolute(&self.dir)
            .with_context(|| format!("Failed to resolve {}", self.dir.display()))
    }

    /// Create the environment with `<python> -m venv <dir>`.
    ///
    /// Tries the configured interpreter first, then the platform fallback.
    /// The first successful exit status wins.
    pub fn create(&self, runner: &dyn CommandRunner) -> Result<()> {
        let dir = self.dir.to_string_lossy().to_string();
        let args = vec!["-m".to_string(), "venv".to_string(), dir];
        let mut last_err: Option<anyhow::Error> = None;

        for cmd in self.interpreter_candidates() {
            match runner.output(&cmd, &args) {
                Ok(out) if out.is_success() => return Ok(()),
                Ok(out) => {
                    last_err = Some(anyhow!(
                        "venv creation failed with {}: {}",
                        cmd,
                        truncate_output(&out.stderr, 500)
                    ));
                }
                Err(e) => {
                    last_err = Some(e.context(format!("Failed to run {} -m venv", cmd)));
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow!("Could not create virtual environment with python/python3")))
    }

    fn interpreter_candidates(&self) -> Vec<String> {
        let fallback = if cfg!(windows) { "python" } else { "python3" };
        let mut cmds = vec![self.python_executable.clone()];
        for cmd in [fallback, "python"] {
            if !cmds.iter().any(|c| c == cmd) {
                cmds.push(cmd.to_string());
            }
        }
        cmds
    }

    /// Install `packages` with the environment's pip. No-op for an empty list.
    pub fn install(&self, runner: &dyn CommandRunner, packages: &[String]) -> Result<()> {
        if packages.is_empty() {
            return Ok(());
        }

        let pip = self.pip_path()?;
        let mut args = vec!["install".to_string()];
        args.extend(packages.iter().cloned());

        let out = runner
            .output(&pip.to_string_lossy(), &args)
            .with_context(|| format!("Failed to run pip in venv at {}", self.dir.display()))?;

        if out.is_success() {
            Ok(())
        } else {
            Err(anyhow!("pip install failed in venv: {}", truncate_output(&out.stderr, 500)))
        }
    }

    /// Absolute path of the interpreter inside the environment.
    pub fn python_path(&self) -> Result<PathBuf> {
        Ok(venv_python(&self.absolute_dir()?))
    }

    /// Absolute path of pip inside the environment.
    pub fn pip_path(&self) -> Result<PathBuf> {
        Ok(venv_pip(&self.absolute_dir()?))
    }
}

/// Return the Python interpreter path inside a venv.
fn venv_python(venv_path: &Path) -> PathBuf {
    if cfg!(windows) {
        venv_path.join("Scripts").join("python.exe")
    } else {
        // venv may create python3, python, or both; an env yet to be made gets python3
        let python3 = venv_path.join("bin").join("python3");
        let python = venv_path.join("bin").join("python");
        if !python3.exists() && python.exists() {
            return python;
        }
        python3
    }
}

/// Return the pip executable path inside a venv.
fn venv_pip(venv_path: &Path) -> PathBuf {
    if cfg!(windows) {
        venv_path.join("Scripts").join("pip.exe")
    } else {
        venv_path.join("bin").join("pip")
    }
}
