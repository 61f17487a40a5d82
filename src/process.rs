//! External command execution.
//!
//! Every command is echoed before it runs and awaited before the caller
//! continues. A non-zero exit status is an error carrying the command line.

use crate::cli::OutputManager;
use crate::error::{CliError, Result, TasksError};
use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;

/// Environment variables added to child processes.
///
/// The task runner's own environment is never modified.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ExecEnv {
    vars: BTreeMap<String, String>,
}

impl ExecEnv {
    /// Empty overlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a variable, replacing any earlier value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Adds all variables of `other`; `other` wins on conflicts.
    pub fn extend(&mut self, other: &ExecEnv) -> &mut Self {
        for (k, v) in &other.vars {
            self.vars.insert(k.clone(), v.clone());
        }
        self
    }

    /// Value of a variable in this overlay.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Value a child would see: the overlay, then the current process.
    pub fn resolve(&self, key: &str) -> Option<String> {
        self.get(key)
            .map(str::to_string)
            .or_else(|| std::env::var(key).ok())
    }

    /// Iterates variables in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn is_secret(key: &str) -> bool {
    let key = key.to_ascii_uppercase();
    key.contains("PASSWORD") || key.contains("TOKEN")
}

// Secrets are masked so the overlay can be logged.
impl std::fmt::Debug for ExecEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(k, v)| (k, if is_secret(k) { "********" } else { v })))
            .finish()
    }
}

/// A single external command.
#[derive(Clone, Debug)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<OsString>,
    env: ExecEnv,
    current_dir: Option<PathBuf>,
}

impl Invocation {
    /// Starts a command for `program`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: ExecEnv::new(),
            current_dir: None,
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Adds environment variables for the child.
    pub fn env(mut self, env: &ExecEnv) -> Self {
        self.env.extend(env);
        self
    }

    /// Runs the child in `dir`.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Command line as echoed to the terminal.
    pub fn command_line(&self) -> String {
        let program = self
            .program
            .file_stem()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy();
        let mut line = program.into_owned();
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            line.push(' ');
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                line.push('"');
                line.push_str(&arg);
                line.push('"');
            } else {
                line.push_str(&arg);
            }
        }
        line
    }

    fn command(&self) -> tokio::process::Command {
        let mut command = tokio::process::Command::new(&self.program);
        command.args(&self.args);
        for (k, v) in self.env.iter() {
            command.env(k, v);
        }
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        command
    }

    fn failed(&self, reason: String) -> TasksError {
        TasksError::Cli(CliError::ExecutionFailed {
            command: self.command_line(),
            reason,
        })
    }

    /// Echoes and runs the command with inherited stdio.
    pub async fn run(&self, output: &OutputManager) -> Result<()> {
        output.command(&self.command_line())?;
        log::debug!("Environment overlay: {:?}", self.env);

        let status = self
            .command()
            .stdin(Stdio::inherit())
            .status()
            .await
            .map_err(|e| self.failed(e.to_string()))?;

        if !status.success() {
            return Err(self.failed(format!("exited with {status}")));
        }
        Ok(())
    }

    /// Echoes and runs the command, returning its standard output.
    ///
    /// Standard error passes through to the terminal.
    pub async fn capture(&self, output: &OutputManager) -> Result<String> {
        output.command(&self.command_line())?;

        let result = self
            .command()
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .await
            .map_err(|e| self.failed(e.to_string()))?;

        if !result.status.success() {
            return Err(self.failed(format!("exited with {}", result.status)));
        }
        Ok(String::from_utf8_lossy(&result.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_quotes_spaces() {
        let inv = Invocation::new("/usr/bin/cmake")
            .args(["-G", "Unix Makefiles"])
            .arg("-S")
            .arg(".");
        assert_eq!(inv.command_line(), "cmake -G \"Unix Makefiles\" -S .");
    }

    #[test]
    fn env_overlay_later_wins() {
        let mut env = ExecEnv::new().with("A", "1").with("B", "2");
        env.extend(&ExecEnv::new().with("B", "3"));
        assert_eq!(env.get("A"), Some("1"));
        assert_eq!(env.get("B"), Some("3"));
    }

    #[test]
    fn debug_masks_passwords() {
        let env = ExecEnv::new()
            .with("CONAN_PASSWORD", "s3cret")
            .with("CONAN_USER_HOME", "/tmp/home");
        let shown = format!("{env:?}");
        assert!(!shown.contains("s3cret"));
        assert!(shown.contains("/tmp/home"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn run_reports_failure_with_command_line() {
        let output = OutputManager::new(false, true);
        let err = Invocation::new("false").run(&output).await.unwrap_err();
        assert!(err.to_string().contains("false"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn capture_sees_env_overlay() {
        let output = OutputManager::new(false, true);
        let out = Invocation::new("sh")
            .args(["-c", "echo $DL_TASKS_TEST"])
            .env(&ExecEnv::new().with("DL_TASKS_TEST", "hello"))
            .capture(&output)
            .await
            .unwrap();
        assert_eq!(out.trim(), "hello");
    }
}
