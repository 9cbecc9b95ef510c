//! Server management: spawning and health checking the storefront backend
//!
//! Used by the scenario runner when no deployed target is configured; the
//! spawned process gets its own scratch database and a seeded admin so the
//! login scenario has credentials to submit.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{E2eError, E2eResult};
use crate::scenario::Credentials;

/// Handle to a running backend process
pub struct ServerHandle {
    child: Child,
    base_url: String,
    /// Scratch database directory; removed when the handle drops
    _db_dir: TempDir,
}

impl ServerHandle {
    /// Spawn the shopfront-web binary on a free port and wait for it to
    /// answer health checks.
    pub async fn spawn(config: ServerConfig) -> E2eResult<Self> {
        let port = config.port.unwrap_or_else(find_free_port);
        let base_url = format!("http://127.0.0.1:{}", port);

        let db_dir = TempDir::new()?;
        let db_path = db_dir.path().join("shopfront-e2e.db");

        info!("Spawning backend on port {}", port);

        let mut cmd = Command::new(&config.binary_path);
        cmd.env("SHOPFRONT_WEB_ADDR", format!("127.0.0.1:{}", port))
            .env("SHOPFRONT_DB_PATH", &db_path)
            .env("SHOPFRONT_JWT_SECRET", "shopfront-e2e-secret");

        if let Some(creds) = &config.seed_admin {
            cmd.env("SEED_ADMIN_EMAIL", &creds.email)
                .env("SEED_ADMIN_PASSWORD", &creds.password);
        }

        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

        let child = cmd.spawn().map_err(|e| {
            E2eError::ServerStartup(format!(
                "Failed to spawn {}: {}",
                config.binary_path.display(),
                e
            ))
        })?;

        let handle = ServerHandle {
            child,
            base_url,
            _db_dir: db_dir,
        };

        handle.wait_for_healthy(config.startup_timeout).await?;

        info!("Backend is healthy at {}", handle.base_url);
        Ok(handle)
    }

    /// Poll /health until the server answers or the timeout elapses
    async fn wait_for_healthy(&self, timeout_duration: Duration) -> E2eResult<()> {
        let health_url = format!("{}/health", self.base_url);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        let start = std::time::Instant::now();
        let mut attempts = 0;

        while start.elapsed() < timeout_duration {
            attempts += 1;

            match client.get(&health_url).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(()),
                Ok(resp) => {
                    warn!("Health check returned {}", resp.status());
                }
                Err(e) => {
                    if attempts == 1 {
                        info!("Waiting for backend to start...");
                    }
                    // Connection refused is expected while the server starts
                    if !e.is_connect() {
                        warn!("Health check error: {}", e);
                    }
                }
            }

            sleep(Duration::from_millis(100)).await;
        }

        Err(E2eError::ServerHealthCheck(attempts))
    }

    /// Base URL for this server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stop the server
    pub fn stop(&mut self) -> E2eResult<()> {
        info!("Stopping backend (pid: {})", self.child.id());

        // Try graceful shutdown first
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(self.child.id() as i32);
            if kill(pid, Signal::SIGTERM).is_ok() {
                std::thread::sleep(Duration::from_millis(500));
            }
        }

        // Force kill if still running
        let _ = self.child.kill();
        let _ = self.child.wait();

        Ok(())
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Configuration for spawning the backend
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Path to the shopfront-web binary
    pub binary_path: PathBuf,

    /// Port to listen on (None = find free port)
    pub port: Option<u16>,

    /// Timeout for server startup
    pub startup_timeout: Duration,

    /// Admin account to seed so the login scenario can authenticate
    pub seed_admin: Option<Credentials>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            binary_path: PathBuf::from("target/debug/shopfront-web"),
            port: None,
            startup_timeout: Duration::from_secs(30),
            seed_admin: Some(Credentials::from_env()),
        }
    }
}

/// Find a free port to use
fn find_free_port() -> u16 {
    use std::net::TcpListener;

    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to find free port")
        .local_addr()
        .expect("Failed to get local addr")
        .port()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_free_port() {
        let port1 = find_free_port();
        let port2 = find_free_port();

        assert!(port1 > 1024);
        assert!(port2 > 1024);
    }
}
