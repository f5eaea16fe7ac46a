// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * External Tool Runner
 * Binary lookup, bounded execution and per-invocation scratch space
 * © 2026 Bountyy Oy
 */

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::errors::ScanFailure;

/// Locate `configured` on PATH (or as an explicit path).
///
/// `tool` is the name used in error messages.
pub fn resolve_binary(tool: &str, configured: &str) -> Result<PathBuf, ScanFailure> {
    which::which(configured).map_err(|e| {
        debug!("{} not found as {:?}: {}", tool, configured, e);
        ScanFailure::ToolNotFound {
            tool: tool.to_string(),
        }
    })
}

/// Reject targets that a tool could read as an option
pub fn check_target_arg(tool: &str, target: &str) -> Result<(), ScanFailure> {
    if target.is_empty() || target.starts_with('-') {
        return Err(ScanFailure::InvalidTarget(format!(
            "Invalid target for {}: {:?}",
            tool, target
        )));
    }
    Ok(())
}

#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Run `binary` with an explicit argument vector under a hard timeout.
///
/// The child is killed when the timeout fires or the future is dropped.
pub async fn run_tool<I, S>(
    tool: &str,
    binary: &Path,
    args: I,
    budget: Duration,
) -> Result<ToolOutput, ScanFailure>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let start = Instant::now();

    let mut cmd = TokioCommand::new(binary);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd
        .spawn()
        .map_err(|e| ScanFailure::tool_failed(tool, format!("could not start: {}", e)))?;

    match timeout(budget, child.wait_with_output()).await {
        Ok(Ok(output)) => {
            let elapsed = start.elapsed();
            debug!(
                "{} exited with {} after {}ms",
                tool,
                output.status,
                elapsed.as_millis()
            );
            Ok(ToolOutput {
                status: output.status,
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                elapsed,
            })
        }
        Ok(Err(e)) => Err(ScanFailure::tool_failed(tool, e.to_string())),
        Err(_) => {
            warn!("{} exceeded its {}s budget and was killed", tool, budget.as_secs());
            Err(ScanFailure::TimedOut {
                tool: tool.to_string(),
                duration: budget,
            })
        }
    }
}

/// Uniquely named scratch directory, removed when dropped
pub struct ScratchSpace {
    dir: TempDir,
}

impl ScratchSpace {
    pub fn create(root: &Path, prefix: &str) -> Result<Self, ScanFailure> {
        std::fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new().prefix(prefix).tempdir_in(root)?;
        debug!("Created scratch directory {:?}", dir.path());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

impl Drop for ScratchSpace {
    fn drop(&mut self) {
        debug!("Removing scratch directory {:?}", self.dir.path());
    }
}
