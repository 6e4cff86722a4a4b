//! Server management - spawning the server subprocess and owning its handle

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::command::CommandLine;
use crate::error::{E2eError, E2eResult};

/// Handle to a running server process
pub struct ServerHandle {
    child: Child,
    pid: Option<u32>,
    process_group: bool,
    grace_period: Duration,
    sweep_pattern: Option<String>,
    terminated: bool,
}

impl ServerHandle {
    /// Spawn the server command with its output captured
    pub fn spawn(config: &ServerConfig) -> E2eResult<Self> {
        info!("Starting server: {}", config.command);

        let mut cmd = config.command.to_command();

        if let Some(dir) = &config.current_dir {
            cmd.current_dir(dir);
        }
        cmd.envs(config.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Own process group, so signals reach the grandchildren a task
        // runner like `cargo run` leaves behind.
        #[cfg(unix)]
        if config.process_group {
            cmd.process_group(0);
        }

        let mut child = cmd.spawn().map_err(|e| {
            E2eError::ServerStartup(format!("Failed to spawn {}: {}", config.command, e))
        })?;

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(drain_output(stdout, "stdout"));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(drain_output(stderr, "stderr"));
        }

        let pid = child.id();
        debug!("Server spawned (pid: {:?})", pid);

        Ok(Self {
            child,
            pid,
            process_group: cfg!(unix) && config.process_group,
            grace_period: config.grace_period,
            sweep_pattern: config.effective_sweep_pattern(),
            terminated: false,
        })
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    pub fn sweep_pattern(&self) -> Option<&str> {
        self.sweep_pattern.as_deref()
    }

    pub(crate) fn mark_terminated(&mut self) {
        self.terminated = true;
    }

    /// Wait for the direct child to exit
    pub async fn wait(&mut self) -> std::io::Result<ExitStatus> {
        self.child.wait().await
    }

    /// Non-blocking exit check
    pub fn try_wait(&mut self) -> std::io::Result<Option<ExitStatus>> {
        self.child.try_wait()
    }

    /// Ask the server (and its group) to exit
    pub(crate) fn terminate(&mut self) -> E2eResult<()> {
        #[cfg(unix)]
        {
            self.send_signal(nix::sys::signal::Signal::SIGTERM)
        }

        #[cfg(not(unix))]
        {
            self.child.start_kill().map_err(E2eError::from)
        }
    }

    /// Kill the server (and its group) immediately
    pub(crate) fn force_kill(&mut self) -> E2eResult<()> {
        #[cfg(unix)]
        {
            self.send_signal(nix::sys::signal::Signal::SIGKILL)
        }

        #[cfg(not(unix))]
        {
            self.child.start_kill().map_err(E2eError::from)
        }
    }

    #[cfg(unix)]
    fn send_signal(&self, signal: nix::sys::signal::Signal) -> E2eResult<()> {
        use nix::sys::signal::{kill, killpg};
        use nix::unistd::Pid;

        let pid = self
            .pid
            .ok_or_else(|| E2eError::Cleanup("server pid unknown".into()))?;
        let pid = Pid::from_raw(pid as i32);

        let sent = if self.process_group {
            killpg(pid, signal)
        } else {
            kill(pid, signal)
        };

        sent.map_err(|e| E2eError::Cleanup(format!("{} to pid {}: {}", signal, pid, e)))
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if !self.terminated {
            warn!("Server handle dropped without cleanup (pid: {:?}); killing", self.pid);
            let _ = self.force_kill();
        }
    }
}

async fn drain_output<R>(stream: R, name: &'static str)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!("[server {}] {}", name, line);
    }
}

/// Configuration for spawning a server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Command that starts the server
    pub command: CommandLine,

    /// Working directory for the command
    pub current_dir: Option<PathBuf>,

    /// Extra environment for the server
    pub env: Vec<(String, String)>,

    /// How long SIGTERM gets before SIGKILL
    pub grace_period: Duration,

    /// Spawn in a fresh process group (unix only)
    pub process_group: bool,

    /// `pgrep -f` pattern for the stray-process sweep.
    /// `None` falls back to the command line; an empty string disables it.
    pub sweep_pattern: Option<String>,
}

impl ServerConfig {
    pub fn new(command: CommandLine) -> Self {
        Self {
            command,
            current_dir: None,
            env: Vec::new(),
            grace_period: Duration::from_millis(5000),
            process_group: true,
            sweep_pattern: None,
        }
    }

    pub fn effective_sweep_pattern(&self) -> Option<String> {
        match &self.sweep_pattern {
            Some(p) if p.trim().is_empty() => None,
            Some(p) => Some(p.clone()),
            None => Some(self.command.to_string()),
        }
    }
}

/// The single live server handle, shared between the supervisor and every
/// path that may need to clean it up.
#[derive(Clone, Default)]
pub struct ServerSlot {
    inner: Arc<Mutex<Option<ServerHandle>>>,
}

impl ServerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the live handle. Fails if one is already held.
    pub async fn install(&self, handle: ServerHandle) -> E2eResult<()> {
        let mut slot = self.inner.lock().await;
        if slot.is_some() {
            return Err(E2eError::ServerStartup(
                "a server is already running for this runner".into(),
            ));
        }
        *slot = Some(handle);
        Ok(())
    }

    pub async fn is_occupied(&self) -> bool {
        self.inner.lock().await.is_some()
    }

    /// Remove the handle; only the first caller gets it.
    pub async fn take(&self) -> Option<ServerHandle> {
        self.inner.lock().await.take()
    }

    /// Clean up whatever server is held. A no-op once the slot is empty.
    pub async fn cleanup(&self) -> bool {
        match self.take().await {
            Some(mut handle) => {
                crate::cleanup::cleanup_server(&mut handle).await;
                true
            }
            None => false,
        }
    }
}
