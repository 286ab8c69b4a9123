// ── Host shutdown ──
//
// The critical alert is followed by a two-step protocol: wait out a grace
// delay so the alert can land, then power the host off. The delay and the
// action are separate so either can be swapped in tests.

use std::future::Future;
use std::time::Duration;

use tokio::process::Command;
use tracing::{info, warn};

use crate::error::CoreError;

/// Privileged host actions.
pub trait HostControl: Send + Sync {
    fn shutdown(&self) -> impl Future<Output = Result<(), CoreError>> + Send;
}

/// Runs the system `shutdown` command.
#[derive(Debug, Clone)]
pub struct SystemShutdown {
    program: String,
    args: Vec<String>,
}

impl Default for SystemShutdown {
    fn default() -> Self {
        Self::command("shutdown", ["-h", "now"])
    }
}

impl SystemShutdown {
    /// Use a different command (e.g. `systemctl poweroff`).
    pub fn command<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl HostControl for SystemShutdown {
    async fn shutdown(&self) -> Result<(), CoreError> {
        info!(program = %self.program, args = ?self.args, "invoking host shutdown");
        let status = Command::new(&self.program)
            .args(&self.args)
            .status()
            .await
            .map_err(|e| CoreError::Shutdown {
                message: format!("cannot run {}: {e}", self.program),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(CoreError::Shutdown {
                message: format!("{} exited with {status}", self.program),
            })
        }
    }
}

/// Grace delay followed by the host action.
#[derive(Debug, Clone)]
pub struct ShutdownSequence<H> {
    host: H,
    grace: Duration,
}

impl<H: HostControl> ShutdownSequence<H> {
    pub fn new(host: H, grace: Duration) -> Self {
        Self { host, grace }
    }

    /// Sleep for the grace delay, then invoke the host action once.
    ///
    /// A failure is logged and returned but never retried: the critical
    /// alert has already been recorded as sent.
    pub async fn execute(&self) -> Result<(), CoreError> {
        info!(grace = %humantime::format_duration(self.grace), "shutdown armed");
        tokio::time::sleep(self.grace).await;
        let result = self.host.shutdown().await;
        if let Err(ref e) = result {
            warn!(error = %e, "host shutdown failed");
        }
        result
    }
}
