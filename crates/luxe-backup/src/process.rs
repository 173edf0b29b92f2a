//! Subprocess execution behind a swappable capability.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::io;
use std::process::Stdio;

use crate::error::BackupError;

/// A fully-resolved external tool call.
#[derive(Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
    /// Extra environment on top of the inherited process environment.
    pub env: BTreeMap<String, String>,
}

impl ToolInvocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

// Env carries PGPASSWORD; only the keys are printed.
impl fmt::Debug for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolInvocation")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("env", &self.env.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// What a finished tool run reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` when terminated by a signal.
    pub code: Option<i32>,
    pub stderr: String,
}

impl ToolOutput {
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.code, Some(0))
    }

    fn describe_exit(&self) -> String {
        self.code
            .map_or_else(|| "terminated by signal".to_string(), |code| format!("exit code {code}"))
    }
}

/// Runs external tools. The server uses [`SystemRunner`]; tests use fakes.
pub trait ProcessRunner: Send + Sync {
    /// Run to completion, capturing stderr.
    ///
    /// An `Err` means the process could not be started at all.
    fn run(
        &self,
        invocation: &ToolInvocation,
    ) -> impl Future<Output = io::Result<ToolOutput>> + Send;
}

/// Spawns real processes with `tokio::process`.
///
/// Children are not killed if the request future is dropped; a restore that
/// already started is left to finish.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    async fn run(&self, invocation: &ToolInvocation) -> io::Result<ToolOutput> {
        let output = tokio::process::Command::new(&invocation.program)
            .args(&invocation.args)
            .envs(&invocation.env)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        Ok(ToolOutput {
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Run `invocation` and turn a failed start or non-zero exit into
/// [`BackupError::ExternalTool`].
pub(crate) async fn run_checked<R: ProcessRunner>(
    runner: &R,
    invocation: &ToolInvocation,
) -> Result<ToolOutput, BackupError> {
    tracing::debug!(?invocation, "running external tool");

    let output = runner.run(invocation).await.map_err(|error| {
        tracing::warn!(tool = %invocation.program, %error, "failed to start external tool");
        BackupError::ExternalTool {
            tool: invocation.program.clone(),
            exit: "not started".to_string(),
            stderr: format!("failed to start {}: {error}", invocation.program),
        }
    })?;

    if !output.success() {
        let exit = output.describe_exit();
        tracing::warn!(
            tool = %invocation.program,
            %exit,
            stderr = %output.stderr.trim_end(),
            "external tool failed"
        );
        return Err(BackupError::ExternalTool {
            tool: invocation.program.clone(),
            exit,
            stderr: output.stderr,
        });
    }

    Ok(output)
}
