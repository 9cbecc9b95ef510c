//! Scenario runner: sequential execution, bounded timeouts, one retry
//!
//! Scenarios run one at a time against a shared deployment, so two runs can
//! never race each other's session state. Each scenario gets a generous
//! ceiling (slow container starts) and a single automatic retry; the
//! database fixture never retries.

use std::path::PathBuf;
use std::time::{Duration, Instant};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::browser::BrowserConfig;
use crate::error::E2eResult;
use crate::report;
use crate::scenario::{self, PageState, Scenario};
use crate::server::{ServerConfig, ServerHandle};

/// Configuration for the scenario runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub browser: BrowserConfig,

    /// Used when no deployed target is configured via E2E_BASE_URL
    pub server: ServerConfig,

    /// Per-scenario ceiling, generous enough for slow container starts
    pub scenario_timeout: Duration,

    /// Automatic retries per scenario on failure
    pub retries: u32,

    pub output_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            browser: BrowserConfig::default(),
            server: ServerConfig::default(),
            scenario_timeout: Duration::from_secs(90),
            retries: 1,
            output_dir: PathBuf::from("test-results"),
        }
    }
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub success: bool,
    pub state: Option<PageState>,
    pub detail: String,
    pub duration_ms: u64,
    pub retried: bool,
    pub error: Option<String>,
}

/// Result of running the whole suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub retried: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

/// Drives scenarios sequentially against a deployed stack, spawning the
/// local backend when none is configured.
pub struct ScenarioRunner {
    config: RunnerConfig,
    server: Option<ServerHandle>,
}

impl ScenarioRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            config,
            server: None,
        }
    }

    /// Make sure something is listening at the target base URL. An explicit
    /// E2E_BASE_URL means an externally deployed stack; otherwise the local
    /// backend binary is spawned on a free port with a scratch database.
    pub async fn ensure_target(&mut self) -> E2eResult<()> {
        if std::env::var("E2E_BASE_URL").is_ok() {
            info!("Targeting deployed stack at {}", self.config.browser.base_url);
            return Ok(());
        }
        if self.server.is_some() {
            return Ok(());
        }

        let server = ServerHandle::spawn(self.config.server.clone()).await?;
        self.config.browser.base_url = server.base_url().to_string();
        self.server = Some(server);
        Ok(())
    }

    /// Stop the spawned backend, if any
    pub fn stop_server(&mut self) {
        if let Some(mut server) = self.server.take() {
            let _ = server.stop();
        }
    }

    /// Run scenarios in order, one at a time
    pub async fn run(&mut self, scenarios: &[Scenario]) -> E2eResult<SuiteResult> {
        self.ensure_target().await?;

        let start = Instant::now();
        let mut results = Vec::new();
        let mut passed = 0;
        let mut failed = 0;
        let mut retried = 0;

        info!("Running {} scenario(s) against {}", scenarios.len(), self.config.browser.base_url);

        for scenario in scenarios {
            let result = self.run_one(*scenario).await;
            if result.success {
                passed += 1;
                info!("✓ {} [{}] ({} ms)",
                    result.name,
                    result.state.map(|s| s.to_string()).unwrap_or_default(),
                    result.duration_ms);
            } else {
                failed += 1;
                error!("✗ {} - {}", result.name, result.error.as_deref().unwrap_or("unknown error"));
            }
            if result.retried {
                retried += 1;
            }
            results.push(result);
        }

        let duration_ms = start.elapsed().as_millis() as u64;

        info!("");
        info!("Scenario results: {} passed, {} failed, {} retried ({} ms)",
            passed, failed, retried, duration_ms);

        Ok(SuiteResult {
            total: scenarios.len(),
            passed,
            failed,
            retried,
            duration_ms,
            results,
        })
    }

    /// Run one scenario with the framework-level retry
    async fn run_one(&self, scenario: Scenario) -> ScenarioResult {
        let start = Instant::now();
        let mut last_error = None;
        let mut retried = false;

        for attempt in 0..=self.config.retries {
            if attempt > 0 {
                retried = true;
                info!("Retrying scenario {} (attempt {})", scenario.name(), attempt + 1);
            }

            let outcome = tokio::time::timeout(
                self.config.scenario_timeout,
                scenario::execute(scenario, &self.config.browser),
            )
            .await;

            match outcome {
                Ok(Ok(outcome)) => {
                    return ScenarioResult {
                        name: scenario.name().to_string(),
                        success: true,
                        state: Some(outcome.state),
                        detail: outcome.detail,
                        duration_ms: start.elapsed().as_millis() as u64,
                        retried,
                        error: None,
                    };
                }
                Ok(Err(e)) => {
                    last_error = Some(e.to_string());
                }
                Err(_) => {
                    last_error = Some(format!(
                        "scenario exceeded {}s ceiling",
                        self.config.scenario_timeout.as_secs()
                    ));
                }
            }
        }

        ScenarioResult {
            name: scenario.name().to_string(),
            success: false,
            state: None,
            detail: String::new(),
            duration_ms: start.elapsed().as_millis() as u64,
            retried,
            error: last_error,
        }
    }

    /// Write the list, JUnit, and HTML reports to the output directory
    pub fn write_reports(&self, suite: &SuiteResult) -> E2eResult<()> {
        report::print_list(suite);
        let junit = report::write_junit(suite, &self.config.output_dir)?;
        let html = report::write_html(suite, &self.config.output_dir)?;
        info!("Reports written: {} and {}", junit.display(), html.display());
        Ok(())
    }
}

impl Drop for ScenarioRunner {
    fn drop(&mut self) {
        self.stop_server();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Nothing listens on the discard port, so the api-health scenario fails
    // immediately with a connect error on every attempt.
    fn unreachable_config(retries: u32) -> RunnerConfig {
        RunnerConfig {
            browser: BrowserConfig {
                base_url: "http://127.0.0.1:9".to_string(),
                ..Default::default()
            },
            scenario_timeout: Duration::from_secs(30),
            retries,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_failed_scenario_is_retried_once() {
        let runner = ScenarioRunner::new(unreachable_config(1));
        let result = runner.run_one(Scenario::ApiHealth).await;

        assert!(!result.success);
        assert!(result.retried, "second attempt must have run");
        assert!(result.state.is_none());
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_no_retry_when_retries_disabled() {
        let runner = ScenarioRunner::new(unreachable_config(0));
        let result = runner.run_one(Scenario::ApiHealth).await;

        assert!(!result.success);
        assert!(!result.retried);
        assert!(result.error.is_some());
    }
}
