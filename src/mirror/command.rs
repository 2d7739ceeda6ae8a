use std::process::Stdio;
use std::time::Duration;

use tokio::{process::Command, time::timeout};
use tracing::info;

use crate::error::CommandError;

/// Runs `program` to completion with stdout/stderr passed through to ours.
///
/// With `limit` set, the child is killed once it runs past it.
pub async fn run_command(
    program: &str,
    args: &[&str],
    limit: Option<Duration>,
) -> Result<(), CommandError> {
    info!(program, ?args, "Running");

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|source| CommandError::Spawn {
            program: program.to_string(),
            source,
        })?;

    let waited = match limit {
        Some(limit) => timeout(limit, child.wait()).await.map_err(|_| limit),
        None => Ok(child.wait().await),
    };

    let status = match waited {
        Ok(status) => status.map_err(|source| CommandError::Spawn {
            program: program.to_string(),
            source,
        })?,
        Err(limit) => {
            let _ = child.kill().await;
            return Err(CommandError::TimedOut {
                program: program.to_string(),
                timeout: limit,
            });
        }
    };

    if !status.success() {
        return Err(CommandError::Failed {
            program: program.to_string(),
            status,
        });
    }

    Ok(())
}
