//! Test runner entry point
//!
//! Starts the web server, waits for it, runs the browser suite and always
//! tears the server down. Exit code 0 means every test passed.

use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing_subscriber::EnvFilter;

use fresh_e2e::{CommandLine, E2eResult, RunnerConfig, SignalInterceptor, TestRunner};

#[derive(Parser, Debug)]
#[command(name = "fresh-test-runner")]
#[command(about = "Start the Fresh server, run the E2E suite, clean up")]
#[command(version)]
struct Args {
    /// TOML config file; flags below override it
    #[arg(short, long, env = "FRESH_E2E_CONFIG")]
    config: Option<PathBuf>,

    /// Port the server listens on
    #[arg(long, env = "FRESH_E2E_PORT")]
    port: Option<u16>,

    /// Readiness timeout in milliseconds
    #[arg(long, env = "FRESH_E2E_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Pause between readiness probes in milliseconds
    #[arg(long, env = "FRESH_E2E_POLL_INTERVAL_MS")]
    poll_interval_ms: Option<u64>,

    /// Grace period between SIGTERM and SIGKILL in milliseconds
    #[arg(long, env = "FRESH_E2E_GRACE_MS")]
    grace_ms: Option<u64>,

    /// Server start command (whitespace separated)
    #[arg(long, env = "FRESH_E2E_SERVER_COMMAND")]
    server_command: Option<CommandLine>,

    /// Test command (whitespace separated)
    #[arg(long, env = "FRESH_E2E_TEST_COMMAND")]
    test_command: Option<CommandLine>,

    /// Pattern for the stray-process sweep ("" disables it)
    #[arg(long, env = "FRESH_E2E_SWEEP_PATTERN")]
    sweep_pattern: Option<String>,

    /// Working directory for both commands
    #[arg(long)]
    working_dir: Option<PathBuf>,

    /// Write a JSON run report here
    #[arg(long)]
    report: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> E2eResult<(RunnerConfig, Option<PathBuf>)> {
        let mut config = match &self.config {
            Some(path) => RunnerConfig::load(path)?,
            None => RunnerConfig::default(),
        };

        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(ms) = self.timeout_ms {
            config.startup_timeout_ms = ms;
        }
        if let Some(ms) = self.poll_interval_ms {
            config.poll_interval_ms = ms;
        }
        if let Some(ms) = self.grace_ms {
            config.grace_period_ms = ms;
        }
        if let Some(cmd) = self.server_command {
            config.server_command = cmd;
        }
        if let Some(cmd) = self.test_command {
            config.test_command = cmd;
        }
        if self.sweep_pattern.is_some() {
            config.sweep_pattern = self.sweep_pattern;
        }
        if self.working_dir.is_some() {
            config.working_dir = self.working_dir;
        }

        config.validate()?;
        Ok((config, self.report))
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    let code = rt.block_on(async_main(args));
    drop(rt);
    std::process::exit(code);
}

async fn async_main(args: Args) -> i32 {
    let (config, report_path) = match args.into_config() {
        Ok(parts) => parts,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return 1;
        }
    };

    let token = CancellationToken::new();
    let interceptor = match SignalInterceptor::install(token.clone()) {
        Ok(interceptor) => interceptor,
        Err(e) => {
            error!("Failed to install signal handlers: {}", e);
            return 1;
        }
    };

    let runner = TestRunner::with_token(config, token);
    let mut report = runner.run_tests().await;
    if let Some(signal) = interceptor.received() {
        error!("Run interrupted by {}", signal);
        report.mark_interrupted(signal);
    }

    if let Some(path) = report_path {
        if let Err(e) = report.write(&path) {
            error!("Failed to write report: {}", e);
        }
    }

    report.exit_code()
}
