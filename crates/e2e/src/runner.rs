//! Process supervisor: server up, wait for readiness, run tests, tear down

use futures::future::Either;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::{RunnerConfig, BASE_URL_ENV};
use crate::error::{E2eError, E2eResult};
use crate::probe::ReadinessProber;
use crate::race::first_of;
use crate::server::{ServerHandle, ServerSlot};

/// Result of the test process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub passed: bool,
    /// `None` when the process was ended by a signal
    pub exit_code: Option<i32>,
}

impl TestOutcome {
    pub fn from_status(status: ExitStatus) -> Self {
        Self {
            passed: status.success(),
            exit_code: status.code(),
        }
    }
}

/// Summary of one runner invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Present only if the test process ran to completion
    pub outcome: Option<TestOutcome>,
    /// Error that cut the run short, if any
    pub error: Option<String>,
    pub interrupted: bool,
    pub duration_ms: u64,
}

impl RunReport {
    pub fn passed(&self) -> bool {
        !self.interrupted
            && self.error.is_none()
            && self.outcome.map(|o| o.passed).unwrap_or(false)
    }

    /// Record that `signal` arrived during the run. An interrupted run never
    /// counts as passed, even if the test process had already succeeded.
    pub fn mark_interrupted(&mut self, signal: &str) {
        self.interrupted = true;
        if self.error.is_none() {
            self.error = Some(format!("Interrupted by {}", signal));
        }
    }

    /// 0 if the tests passed, 1 for anything else
    pub fn exit_code(&self) -> i32 {
        if self.passed() {
            0
        } else {
            1
        }
    }

    /// Write the report as JSON
    pub fn write(&self, path: &Path) -> E2eResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("Results written to: {}", path.display());
        Ok(())
    }
}

/// Main E2E test runner
pub struct TestRunner {
    config: RunnerConfig,
    slot: ServerSlot,
    token: CancellationToken,
}

impl TestRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self::with_token(config, CancellationToken::new())
    }

    /// Create a runner that stops when `token` is cancelled
    pub fn with_token(config: RunnerConfig, token: CancellationToken) -> Self {
        Self {
            config,
            slot: ServerSlot::new(),
            token,
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Shared slot holding the live server, for out-of-band cleanup
    pub fn slot(&self) -> &ServerSlot {
        &self.slot
    }

    /// Run the whole lifecycle. Never fails: every error becomes a failed
    /// report, and the server is cleaned up on every path.
    pub async fn run_tests(&self) -> RunReport {
        let start = Instant::now();
        info!("Starting test suite");

        let result = self.run_inner().await;

        self.slot.cleanup().await;

        let (outcome, error, interrupted) = match result {
            Ok(outcome) => {
                if outcome.passed {
                    info!("All tests passed!");
                } else {
                    error!("Some tests failed! (exit code: {:?})", outcome.exit_code);
                }
                (Some(outcome), None, false)
            }
            Err(e) => {
                error!("Error running tests: {}", e);
                let interrupted = e.is_interrupted();
                (None, Some(e.to_string()), interrupted)
            }
        };

        RunReport {
            outcome,
            error,
            interrupted,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    async fn run_inner(&self) -> E2eResult<TestOutcome> {
        if self.token.is_cancelled() {
            return Err(interrupted());
        }

        let handle = ServerHandle::spawn(&self.config.server_config())?;
        self.slot.install(handle).await?;

        let prober = ReadinessProber::new(self.config.probe_config())?;
        self.cancellable(prober.wait()).await??;

        self.run_test_process().await
    }

    async fn run_test_process(&self) -> E2eResult<TestOutcome> {
        info!("Running E2E tests: {}", self.config.test_command);

        let mut cmd = self.config.test_command.to_command();
        if let Some(dir) = &self.config.working_dir {
            cmd.current_dir(dir);
        }
        cmd.env(BASE_URL_ENV, self.config.base_url())
            .envs(&self.config.test_env)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            E2eError::TestStartup(format!("Failed to spawn {}: {}", self.config.test_command, e))
        })?;

        let status = self.cancellable(child.wait()).await??;
        Ok(TestOutcome::from_status(status))
    }

    /// Await `fut` unless the token is cancelled first
    async fn cancellable<F: Future>(&self, fut: F) -> E2eResult<F::Output> {
        match first_of(self.token.cancelled(), fut).await {
            Either::Left(()) => Err(interrupted()),
            Either::Right(output) => Ok(output),
        }
    }
}

fn interrupted() -> E2eError {
    E2eError::Interrupted("cancellation requested".into())
}
