use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::process::Command;

use crate::error::ToolError;

const STDERR_LIMIT: usize = 200;

/// Runs a command to completion, killing it if `timeout` elapses first.
/// A non-zero exit is reported as [`ToolError::Failed`].
pub async fn run_with_timeout(
    mut cmd: Command,
    tool: &'static str,
    timeout: Duration,
) -> Result<Output, ToolError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(result) => result.map_err(|source| ToolError::Spawn { tool, source })?,
        Err(_) => {
            return Err(ToolError::Timeout {
                tool,
                secs: timeout.as_secs(),
            })
        }
    };

    if !output.status.success() {
        return Err(ToolError::Failed {
            tool,
            status: output.status.to_string(),
            stderr: truncate(&String::from_utf8_lossy(&output.stderr), STDERR_LIMIT),
        });
    }

    Ok(output)
}

fn truncate(text: &str, limit: usize) -> String {
    text.trim().chars().take(limit).collect()
}
