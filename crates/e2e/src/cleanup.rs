//! Server teardown: SIGTERM, bounded wait, SIGKILL, then a stray-process sweep

use futures::future::Either;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};
use crate::race::first_of;
use crate::server::ServerHandle;

/// Tear the server down. Safe to call repeatedly; only the first call acts.
///
/// Nothing in here escalates: every failure is logged as a warning and the
/// caller's exit decision is left alone.
pub async fn cleanup_server(handle: &mut ServerHandle) {
    if handle.is_terminated() {
        debug!("Server (pid: {:?}) already cleaned up", handle.pid());
        return;
    }

    info!("Cleaning up server process (pid: {:?})...", handle.pid());

    if let Err(e) = stop(handle).await {
        warn!("Warning during server cleanup: {}", e);
    }
    handle.mark_terminated();

    if let Some(pattern) = handle.sweep_pattern() {
        match sweep_processes(pattern).await {
            Ok(0) => debug!("No stray processes matched '{}'", pattern),
            Ok(n) => info!("Cleaned up {} remaining process(es) matching '{}'", n, pattern),
            Err(e) => debug!("Process sweep skipped: {}", e),
        }
    }
}

async fn stop(handle: &mut ServerHandle) -> E2eResult<()> {
    let grace = handle.grace_period();

    if let Err(e) = handle.terminate() {
        debug!("Graceful termination not delivered: {}", e);
    }

    let waited = first_of(handle.wait(), sleep(grace)).await;
    let exited = match waited {
        Either::Left(Ok(status)) => {
            info!("Server terminated gracefully ({})", status);
            true
        }
        Either::Left(Err(e)) => {
            warn!("Failed waiting for server exit: {}", e);
            false
        }
        Either::Right(()) => {
            info!("Server still running after {}ms", grace.as_millis());
            false
        }
    };

    // Unconditional: the group may still hold children even if the leader left.
    match handle.force_kill() {
        Ok(()) if !exited => info!("Server force-killed"),
        Ok(()) => debug!("SIGKILL delivered to leftover group members"),
        Err(e) => debug!("Forced termination skipped, process already gone: {}", e),
    }

    reap(handle, grace).await
}

async fn reap(handle: &mut ServerHandle, bound: Duration) -> E2eResult<()> {
    let waited = first_of(handle.wait(), sleep(bound)).await;
    match waited {
        Either::Left(Ok(_)) => Ok(()),
        Either::Left(Err(e)) => Err(E2eError::Cleanup(format!("reaping server: {}", e))),
        Either::Right(()) => Err(E2eError::Cleanup(format!(
            "server (pid: {:?}) did not exit after SIGKILL",
            handle.pid()
        ))),
    }
}

/// Send SIGTERM to every process whose command line matches `pattern`,
/// except this one. Returns how many were signalled.
pub async fn sweep_processes(pattern: &str) -> E2eResult<usize> {
    let output = Command::new("pgrep")
        .arg("-f")
        .arg("--")
        .arg(pattern)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .await?;

    // pgrep exits 1 when nothing matched
    if !output.status.success() {
        return Ok(0);
    }

    // Our own command line (or the one that launched us) may carry the
    // pattern as an argument.
    let spared = [std::process::id(), parent_pid()];
    let pids: Vec<u32> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter_map(|line| line.trim().parse().ok())
        .filter(|pid| !spared.contains(pid))
        .collect();

    let mut signalled = 0;
    for pid in pids {
        if terminate_pid(pid).is_ok() {
            signalled += 1;
        }
    }
    Ok(signalled)
}

#[cfg(unix)]
fn parent_pid() -> u32 {
    nix::unistd::getppid().as_raw() as u32
}

#[cfg(not(unix))]
fn parent_pid() -> u32 {
    0
}

#[cfg(unix)]
fn terminate_pid(pid: u32) -> E2eResult<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    kill(Pid::from_raw(pid as i32), Signal::SIGTERM)
        .map_err(|e| E2eError::Cleanup(format!("SIGTERM to pid {}: {}", pid, e)))
}

#[cfg(not(unix))]
fn terminate_pid(pid: u32) -> E2eResult<()> {
    Err(E2eError::Cleanup(format!(
        "process sweep is unix-only (pid {})",
        pid
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sweep_with_no_match_is_zero() {
        let swept = sweep_processes("fresh-e2e-pattern-that-matches-nothing-7f3a")
            .await
            .unwrap_or(0);
        assert_eq!(swept, 0);
    }
}
