//! Fresh E2E Test Runner
//!
//! This crate runs the browser suite for the Fresh counter page:
//! - Spawns the web server as a subprocess and polls it until it answers
//! - Runs the test process against it and reports pass/fail as the exit code
//! - Tears the server down on every path: SIGTERM, bounded wait, SIGKILL,
//!   then a sweep for stray processes
//! - Turns SIGINT/SIGTERM into cancellation of the run
//! - Drives Playwright from declarative YAML scenarios
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 fresh-test-runner (Rust)                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  SignalInterceptor ── cancels ──► CancellationToken          │
//! │  TestRunner::run_tests()                                     │
//! │    ├── ServerHandle::spawn() ──► ServerSlot                  │
//! │    ├── ReadinessProber::wait()        (cancellable)          │
//! │    ├── test process: wait()           (cancellable)          │
//! │    └── ServerSlot::cleanup() ──► cleanup_server()            │
//! │          SIGTERM ─ first_of(exit, grace) ─ SIGKILL ─ sweep   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  browser test target                                        │
//! │    TestSpec (YAML) ──► PlaywrightDriver::run_spec()          │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod cleanup;
pub mod command;
pub mod config;
pub mod error;
pub mod playwright;
pub mod probe;
pub mod race;
pub mod runner;
pub mod server;
pub mod signals;
pub mod spec;

pub use cleanup::cleanup_server;
pub use command::CommandLine;
pub use config::RunnerConfig;
pub use error::{E2eError, E2eResult};
pub use probe::{wait_for_server, ReadinessProber};
pub use race::first_of;
pub use runner::{RunReport, TestOutcome, TestRunner};
pub use server::{ServerHandle, ServerSlot};
pub use signals::SignalInterceptor;
pub use spec::{TestSpec, TestStep};
