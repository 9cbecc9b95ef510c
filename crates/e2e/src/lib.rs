//! Shopfront Test Harness
//!
//! Two independent harness components, each consumed by a family of tests:
//!
//! - An ephemeral database fixture plus in-process application builder:
//!   [`TestContext`] provisions a throwaway SQLite database in a scratch
//!   directory, builds the storefront router once, and injects requests into
//!   it without binding a socket. [`seed`] constructs valid minimal fixture
//!   entities with relationships satisfied.
//! - A browser-driven scenario runner: [`ScenarioRunner`] targets a deployed
//!   stack (base URL from the environment) or spawns the local backend,
//!   drives headless Chromium through generated Playwright probe scripts,
//!   classifies what the page showed into a small set of known UI states,
//!   and writes list/HTML/JUnit reports.
//!
//! The two components share no state; scenarios go over HTTP against a live
//! deployment while the fixture talks to an in-process application instance.

pub mod browser;
pub mod context;
pub mod error;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod seed;
pub mod server;

pub use context::{CleanupReport, TestContext};
pub use error::{E2eError, E2eResult};
pub use runner::{RunnerConfig, ScenarioRunner, SuiteResult};
pub use scenario::{Credentials, PageState, Scenario};
