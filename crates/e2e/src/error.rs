//! Error types for the E2E runner

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Server failed to start: {0}")]
    ServerStartup(String),

    #[error("Server did not start within {}ms", .timeout.as_millis())]
    ServerStartTimeout { timeout: Duration },

    #[error("Test process failed to start: {0}")]
    TestStartup(String),

    #[error("Interrupted by {0}")]
    Interrupted(String),

    #[error("Cleanup warning: {0}")]
    Cleanup(String),

    #[error("Playwright not found. Install with: npm install playwright && npx playwright install chromium")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Test spec parse error: {0}")]
    SpecParse(String),

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl E2eError {
    /// Whether this error came from the cancellation token rather than the run itself
    pub fn is_interrupted(&self) -> bool {
        matches!(self, E2eError::Interrupted(_))
    }
}

pub type E2eResult<T> = Result<T, E2eError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_carries_millis() {
        let err = E2eError::ServerStartTimeout {
            timeout: Duration::from_secs(30),
        };
        assert_eq!(err.to_string(), "Server did not start within 30000ms");
    }

    #[test]
    fn test_is_interrupted() {
        assert!(E2eError::Interrupted("SIGINT".into()).is_interrupted());
        assert!(!E2eError::Cleanup("gone".into()).is_interrupted());
    }
}
