//! Browser suite entry point
//!
//! This is the test binary `fresh-test-runner` launches once the server
//! answers. It runs every YAML scenario in `specs/` against
//! `FRESH_E2E_BASE_URL`, optionally narrowed to one tag with `FRESH_E2E_TAG`.
//! Without a base URL it has no server to talk to and reports itself skipped, so a plain `cargo test` stays green.

use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use fresh_e2e::config::BASE_URL_ENV;
use fresh_e2e::playwright::{Browser, PlaywrightConfig, PlaywrightDriver};
use fresh_e2e::{E2eResult, TestSpec};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let Ok(base_url) = std::env::var(BASE_URL_ENV) else {
        println!("browser: skipped ({} not set; run through fresh-test-runner)", BASE_URL_ENV);
        return ExitCode::SUCCESS;
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(run(base_url)) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(base_url: String) -> E2eResult<bool> {
    let is_ci = ["CI", "GITHUB_ACTIONS"]
        .iter()
        .any(|var| std::env::var(var).map(|v| v == "true").unwrap_or(false));

    let config = PlaywrightConfig {
        base_url,
        browser: Browser::parse(&std::env::var("FRESH_E2E_BROWSER").unwrap_or_default()),
        no_sandbox: is_ci,
        node_modules: std::env::var_os("FRESH_E2E_NODE_MODULES").map(PathBuf::from),
        ..Default::default()
    };
    let driver = PlaywrightDriver::new(config)?;

    let specs_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("specs");
    let all = TestSpec::load_all(&specs_dir)?;
    let specs: Vec<&TestSpec> = match std::env::var("FRESH_E2E_TAG") {
        Ok(tag) if !tag.is_empty() => TestSpec::filter_by_tag(&all, &tag),
        _ => all.iter().collect(),
    };
    info!("Running {} scenario(s) from {}", specs.len(), specs_dir.display());

    let mut failed = 0;
    for spec in specs.iter().copied() {
        let result = driver.run_spec(spec).await?;
        if result.success {
            info!("✓ {} ({} ms)", result.name, result.duration_ms);
        } else {
            failed += 1;
            error!(
                "✗ {} - {}",
                result.name,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    info!(
        "Scenario results: {} passed, {} failed",
        specs.len() - failed,
        failed
    );
    Ok(failed == 0)
}
