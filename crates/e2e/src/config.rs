//! Runner configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::command::CommandLine;
use crate::error::{E2eError, E2eResult};
use crate::probe::ProbeConfig;
use crate::server::ServerConfig;

/// Environment variable the test process reads its target from
pub const BASE_URL_ENV: &str = "FRESH_E2E_BASE_URL";

/// Environment variable the web server reads its listen address from
pub const WEB_ADDR_ENV: &str = "FRESH_WEB_ADDR";

/// Configuration for a full runner invocation.
///
/// Every key is optional in the TOML file; missing keys keep their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Port the server listens on and the prober targets
    pub port: u16,

    /// Host used in the probe and base URL
    pub host: String,

    /// How long the server gets to answer its first probe
    pub startup_timeout_ms: u64,

    /// Pause between readiness probes
    pub poll_interval_ms: u64,

    /// SIGTERM grace period before SIGKILL
    pub grace_period_ms: u64,

    /// Command that starts the server
    pub server_command: CommandLine,

    /// Command that runs the browser tests
    pub test_command: CommandLine,

    /// Pattern for the stray-process sweep; empty disables it
    pub sweep_pattern: Option<String>,

    /// Put the server in its own process group
    pub process_group: bool,

    /// Working directory for both commands
    pub working_dir: Option<PathBuf>,

    /// Extra environment for the server
    pub server_env: BTreeMap<String, String>,

    /// Extra environment for the test process
    pub test_env: BTreeMap<String, String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            host: "localhost".to_string(),
            startup_timeout_ms: 30_000,
            poll_interval_ms: 1_000,
            grace_period_ms: 5_000,
            server_command: CommandLine::builtin(&["cargo", "run", "-p", "fresh-web"]),
            test_command: CommandLine::builtin(&["cargo", "test", "-p", "fresh-e2e", "--test", "browser"]),
            sweep_pattern: None,
            process_group: true,
            working_dir: None,
            server_env: BTreeMap::new(),
            test_env: BTreeMap::new(),
        }
    }
}

impl RunnerConfig {
    /// Load a TOML config file
    pub fn load(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> E2eResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> E2eResult<()> {
        if self.port == 0 {
            return Err(E2eError::Config("port must be non-zero".into()));
        }
        if self.host.trim().is_empty() {
            return Err(E2eError::Config("host must not be empty".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(E2eError::Config("poll_interval_ms must be non-zero".into()));
        }
        Ok(())
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    pub fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            url: self.base_url(),
            timeout: self.startup_timeout(),
            interval: self.poll_interval(),
        }
    }

    /// Server spawn settings; the listen address follows `port` unless
    /// `server_env` sets it explicitly.
    pub fn server_config(&self) -> ServerConfig {
        let mut env: Vec<(String, String)> = Vec::new();
        if !self.server_env.contains_key(WEB_ADDR_ENV) {
            env.push((WEB_ADDR_ENV.to_string(), format!("127.0.0.1:{}", self.port)));
        }
        env.extend(self.server_env.iter().map(|(k, v)| (k.clone(), v.clone())));

        ServerConfig {
            command: self.server_command.clone(),
            current_dir: self.working_dir.clone(),
            env,
            grace_period: self.grace_period(),
            process_group: self.process_group,
            sweep_pattern: self.sweep_pattern.clone(),
        }
    }
}
