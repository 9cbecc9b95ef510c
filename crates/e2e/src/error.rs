//! Error types for the test harness

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Fixture setup failed: {0}")]
    FixtureSetup(String),

    #[error("Server failed to start: {0}")]
    ServerStartup(String),

    #[error("Server health check failed after {0} attempts")]
    ServerHealthCheck(usize),

    #[error("Playwright not found. Install with: npx playwright install")]
    PlaywrightNotFound,

    #[error("Browser probe failed: {0}")]
    Browser(String),

    #[error("Scenario '{name}' failed: {reason}")]
    ScenarioFailed { name: String, reason: String },

    #[error("Store error: {0}")]
    Store(#[from] shopfront_common::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;
