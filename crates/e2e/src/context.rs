//! Ephemeral database fixture and in-process application builder
//!
//! One [`TestContext`] per test file replaces the usual pile of module-level
//! singletons: it owns the throwaway database, the application router, and
//! the scratch directory, and is passed explicitly into seed helpers.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use tracing::{debug, warn};

use shopfront_common::{Database, Error};
use shopfront_web::{build_app, AppState};

use crate::error::{E2eError, E2eResult};

/// Signing secret for tokens issued by the app under test
pub const TEST_JWT_SECRET: &str = "shopfront-test-secret";

/// What a cleanup pass did. Callers may log this; nothing in it escalates.
#[derive(Debug)]
pub enum CleanupReport {
    /// The connection was already severed, nothing to do
    Skipped,
    /// The purge ran; per-table failures are recorded, not raised
    Completed {
        purged: Vec<(String, usize)>,
        failures: Vec<(String, String)>,
    },
}

impl CleanupReport {
    pub fn is_skipped(&self) -> bool {
        matches!(self, CleanupReport::Skipped)
    }

    /// Log the outcome at debug/warn level. Never panics.
    pub fn log(&self) {
        match self {
            CleanupReport::Skipped => debug!("Cleanup skipped: connection not live"),
            CleanupReport::Completed { purged, failures } => {
                let rows: usize = purged.iter().map(|(_, n)| n).sum();
                debug!("Cleanup purged {} row(s) across {} table(s)", rows, purged.len());
                for (table, err) in failures {
                    warn!("Cleanup of table {} failed: {}", table, err);
                }
            }
        }
    }
}

/// Per-test-file context: throwaway database plus one application instance
pub struct TestContext {
    db: Database,
    app: Router,
    db_uri: String,
    /// Scratch directory backing the database; removed on drop
    _dir: TempDir,
}

impl TestContext {
    /// Provision a fresh database in a scratch directory, apply the schema,
    /// and build the application router once. Intended to be called once per
    /// test file; a provisioning failure fails the whole file.
    pub fn start() -> E2eResult<Self> {
        let dir = TempDir::new()
            .map_err(|e| E2eError::FixtureSetup(format!("scratch dir: {}", e)))?;
        let db_path = dir.path().join("shopfront-test.db");

        let db = Database::open(&db_path)
            .map_err(|e| E2eError::FixtureSetup(format!("database: {}", e)))?;

        let app = build_app(AppState::new(db.clone(), TEST_JWT_SECRET.to_string()));
        let db_uri = format!("sqlite://{}", db_path.display());
        debug!("Test context started at {}", db_uri);

        Ok(Self {
            db,
            app,
            db_uri,
            _dir: dir,
        })
    }

    /// Connection URI of the throwaway database
    pub fn db_uri(&self) -> &str {
        &self.db_uri
    }

    /// Shared store handle for direct seeding and assertions
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Sever the database connection to simulate an outage mid-suite.
    /// The app instance keeps running; its routes respond with an error
    /// status instead of hanging.
    pub fn sever_connection(&self) {
        self.db.close();
    }

    /// Purge every table between tests. No-op when the connection was
    /// deliberately severed; per-table failures are swallowed into the
    /// report so one bad table cannot cascade.
    pub fn cleanup(&self) -> CleanupReport {
        if !self.db.is_connected() {
            return CleanupReport::Skipped;
        }
        match self.db.purge_all() {
            Ok(report) => CleanupReport::Completed {
                purged: report.purged,
                failures: report.failures,
            },
            // Lost the connection between the check and the purge
            Err(Error::ConnectionClosed) => CleanupReport::Skipped,
            Err(e) => CleanupReport::Completed {
                purged: vec![],
                failures: vec![("*".to_string(), e.to_string())],
            },
        }
    }

    /// Close the connection and release the scratch directory. Safe to call
    /// after the connection was already severed mid-test.
    pub fn teardown(self) {
        self.db.close();
        // _dir dropped here, removing the database file
    }

    // ========================================================================
    // Request injection
    // ========================================================================

    /// Inject a GET request into the in-process app
    pub async fn get(&self, path_and_query: &str) -> E2eResult<(StatusCode, Value)> {
        let req = Request::builder()
            .method("GET")
            .uri(path_and_query)
            .body(Body::empty())
            .map_err(|e| E2eError::FixtureSetup(format!("request build: {}", e)))?;
        self.inject(req).await
    }

    /// Inject a POST request with a JSON body into the in-process app
    pub async fn post_json(&self, path: &str, body: &Value) -> E2eResult<(StatusCode, Value)> {
        let req = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(body)?))
            .map_err(|e| E2eError::FixtureSetup(format!("request build: {}", e)))?;
        self.inject(req).await
    }

    async fn inject(&self, req: Request<Body>) -> E2eResult<(StatusCode, Value)> {
        let resp = self
            .app
            .clone()
            .oneshot(req)
            .await
            .map_err(|e| E2eError::FixtureSetup(format!("request injection: {}", e)))?;

        let status = resp.status();
        let bytes = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| E2eError::FixtureSetup(format!("body collect: {}", e)))?
            .to_bytes();

        // Non-JSON bodies (e.g. the health probe) come back as Null
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Ok((status, value))
    }
}
