//! External command execution
//!
//! One process per call, no timeout, no retries. A hung command stalls the
//! operation that issued it; callers decide how failure propagates.

use async_trait::async_trait;
use tokio::process::Command;

use crate::errors::AppError;

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_ok: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Any stderr text is disqualifying on its own, independent of the exit
    /// code. Conservative but matches how the platform tools misbehave.
    pub fn success(&self) -> bool {
        self.exit_ok && self.stderr.trim().is_empty()
    }

    pub fn failure_detail(&self) -> String {
        if self.stderr.trim().is_empty() {
            "non-zero exit status".to_string()
        } else {
            self.stderr.trim().to_string()
        }
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, AppError>;
}

#[derive(Debug, Default)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, AppError> {
        let output = Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|err| AppError::command_spawn(program, err))?;

        Ok(CommandOutput {
            exit_ok: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
