//! Command runners
//!
//! A runner executes a scenario's command once and reports whether the test
//! case passed. [`DirectRunner`] only checks the exit status.
//! [`InteractiveRunner`] wraps the command in a generated expect script and
//! lets the script decide the verdict.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command as TokioCommand;

use crate::common::{Error, Result};

use super::definition::RunnerKind;

/// Where and how subprocesses of one run are started
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Working directory for builds and test commands (the repository top)
    pub workdir: PathBuf,
    /// Echo subprocess output instead of discarding it
    pub echo: bool,
}

impl RunContext {
    pub fn new(workdir: impl Into<PathBuf>, echo: bool) -> Self {
        Self {
            workdir: workdir.into(),
            echo,
        }
    }
}

/// Settings baked into interactive runners when they are bound to a command
#[derive(Debug, Clone)]
pub struct RunnerSettings {
    /// Program that executes the generated script read from stdin
    pub automation_program: String,
    /// Idle time without a matching pattern before the script fails
    pub idle_timeout: Duration,
    /// Also fail when the spawned process closes its output early
    pub eof_guard: bool,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            automation_program: "expect".to_string(),
            idle_timeout: Duration::from_secs(5),
            eof_guard: true,
        }
    }
}

impl From<&crate::common::config::Config> for RunnerSettings {
    fn from(config: &crate::common::config::Config) -> Self {
        Self {
            automation_program: config.interactive.program.clone(),
            idle_timeout: config.idle_timeout(),
            eof_guard: config.interactive.eof_guard,
        }
    }
}

/// A single executable check
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Spawn exactly one subprocess and report whether it succeeded
    ///
    /// Returns `Err` only when the subprocess could not be started at all.
    async fn run(&self, ctx: &RunContext) -> Result<bool>;

    /// Text that reproduces exactly what `run` executed
    fn explain(&self) -> String;

    /// External program this runner needs on PATH, if any
    fn required_program(&self) -> Option<&str> {
        None
    }
}

/// Create the runner for `kind`, bound to `command`
pub fn bind_runner(
    kind: &RunnerKind,
    command: &str,
    settings: &RunnerSettings,
) -> Box<dyn CommandRunner> {
    match kind {
        RunnerKind::Direct => Box::new(DirectRunner::new(command)),
        RunnerKind::Interactive { script } => {
            Box::new(InteractiveRunner::new(command, script, settings))
        }
    }
}

/// `sh -c <command>` in the run's working directory with stdin closed
pub(crate) fn shell_command(command: &str, ctx: &RunContext) -> TokioCommand {
    let mut cmd = TokioCommand::new("sh");
    cmd.arg("-c")
        .arg(command)
        .current_dir(&ctx.workdir)
        .stdin(Stdio::null())
        .kill_on_drop(true);
    cmd
}

/// Inherit the stream when echoing, discard it otherwise
pub(crate) fn echo_stdio(echo: bool) -> Stdio {
    if echo {
        Stdio::inherit()
    } else {
        Stdio::null()
    }
}

/// Runs the command and expects a successful exit status
#[derive(Debug, Clone)]
pub struct DirectRunner {
    command: String,
}

impl DirectRunner {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl CommandRunner for DirectRunner {
    async fn run(&self, ctx: &RunContext) -> Result<bool> {
        tracing::debug!(command = %self.command, "running command");

        let status = shell_command(&self.command, ctx)
            .stdout(echo_stdio(ctx.echo))
            .stderr(echo_stdio(ctx.echo))
            .status()
            .await
            .map_err(|e| Error::spawn("sh", e))?;

        tracing::debug!(code = ?status.code(), "command finished");
        Ok(status.code() == Some(0))
    }

    fn explain(&self) -> String {
        self.command.clone()
    }
}

/// Runs the command inside a generated expect script
///
/// The script spawns the command, installs `expect_before` handlers that
/// exit 1 on idle timeout (and on early end of output when the eof guard is
/// on), then runs the caller's script verbatim. The automation program's
/// exit status is the verdict; the command's own exit status is ignored.
#[derive(Debug, Clone)]
pub struct InteractiveRunner {
    program: String,
    script: String,
}

impl InteractiveRunner {
    pub fn new(command: &str, script: &str, settings: &RunnerSettings) -> Self {
        Self {
            program: settings.automation_program.clone(),
            script: generate_script(command, script, settings),
        }
    }

    /// The full generated script fed to the automation program
    pub fn script(&self) -> &str {
        &self.script
    }
}

/// Build the expect script that wraps `command`
pub fn generate_script(command: &str, script: &str, settings: &RunnerSettings) -> String {
    let mut handlers = String::from("    timeout { exit 1 }\n");
    if settings.eof_guard {
        handlers.push_str("    eof { exit 1 }\n");
    }

    format!(
        "set timeout {timeout}\n\
         log_user 1\n\
         \n\
         spawn {command}\n\
         \n\
         expect_before {{\n\
         {handlers}\
         }}\n\
         \n\
         {script}\n",
        timeout = settings.idle_timeout.as_secs(),
        command = command,
        handlers = handlers,
        script = script.trim_end(),
    )
}

#[async_trait]
impl CommandRunner for InteractiveRunner {
    async fn run(&self, ctx: &RunContext) -> Result<bool> {
        tracing::debug!(program = %self.program, "running interactive script");

        let mut child = TokioCommand::new(&self.program)
            .current_dir(&ctx.workdir)
            .stdin(Stdio::piped())
            .stdout(echo_stdio(ctx.echo))
            .stderr(echo_stdio(ctx.echo))
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::spawn(&self.program, e))?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(self.script.as_bytes()).await {
                Ok(()) => {}
                // The script may finish before it has been fully read
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    tracing::debug!("automation program closed stdin early");
                }
                Err(e) => return Err(e.into()),
            }
            // Dropping stdin closes the pipe so the program sees end of script
        }

        let status = child.wait().await?;
        tracing::debug!(code = ?status.code(), "interactive script finished");
        Ok(status.code() == Some(0))
    }

    fn explain(&self) -> String {
        format!("{} <<'EOF'\n{}EOF", self.program, self.script)
    }

    fn required_program(&self) -> Option<&str> {
        Some(&self.program)
    }
}
