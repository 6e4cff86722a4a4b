//! Process-wide SIGINT/SIGTERM interception
//!
//! The handlers never tear anything down themselves. They cancel the
//! supervisor's token; the supervisor's single cleanup path does the rest and
//! the run ends with exit code 1.

use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::E2eResult;

pub struct SignalInterceptor {
    token: CancellationToken,
    received: Arc<OnceLock<&'static str>>,
    task: JoinHandle<()>,
}

impl SignalInterceptor {
    /// Register the handlers now and start listening.
    ///
    /// Registration happens before this returns, so a signal delivered right
    /// after `install` is never lost to the default disposition.
    pub fn install(token: CancellationToken) -> E2eResult<Self> {
        let received = Arc::new(OnceLock::new());
        let task = spawn_listener(token.clone(), received.clone())?;

        Ok(Self {
            token,
            received,
            task,
        })
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Name of the first signal that fired, if any
    pub fn received(&self) -> Option<&'static str> {
        self.received.get().copied()
    }
}

impl Drop for SignalInterceptor {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(unix)]
fn spawn_listener(
    token: CancellationToken,
    received: Arc<OnceLock<&'static str>>,
) -> E2eResult<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    Ok(tokio::spawn(async move {
        loop {
            let name = tokio::select! {
                Some(()) = interrupt.recv() => "SIGINT",
                Some(()) = terminate.recv() => "SIGTERM",
                else => break,
            };
            record(&token, &received, name);
        }
    }))
}

#[cfg(not(unix))]
fn spawn_listener(
    token: CancellationToken,
    received: Arc<OnceLock<&'static str>>,
) -> E2eResult<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            record(&token, &received, "Ctrl-C");
        }
    }))
}

fn record(token: &CancellationToken, received: &OnceLock<&'static str>, name: &'static str) {
    if token.is_cancelled() {
        warn!("Received {} while already shutting down; cleanup in progress", name);
        return;
    }
    let _ = received.set(name);
    info!("Received {}, cleaning up...", name);
    token.cancel();
}
