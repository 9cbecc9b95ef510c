//! E2E scenario runner entry point
//!
//! Runs the browser-driven scenarios against a deployed stack (E2E_BASE_URL)
//! or a locally spawned backend.
//! Run with: cargo test --package shopfront-e2e --test e2e

use std::path::PathBuf;
use std::time::Duration;
use clap::Parser;

use shopfront_e2e::browser::BrowserConfig;
use shopfront_e2e::server::ServerConfig;
use shopfront_e2e::{E2eResult, RunnerConfig, Scenario, ScenarioRunner};

#[derive(Parser, Debug)]
#[command(name = "shopfront-e2e")]
#[command(about = "Browser-driven scenario runner for Shopfront")]
struct Args {
    /// Run only this scenario (smoke, api-health, shop, login)
    #[arg(short, long)]
    name: Option<String>,

    /// Target base URL; overrides E2E_BASE_URL
    #[arg(long)]
    base_url: Option<String>,

    /// Path to the backend binary spawned when no base URL is configured
    #[arg(long, default_value = "target/debug/shopfront-web")]
    server_binary: PathBuf,

    /// Run the browser headless
    #[arg(long, default_value = "true")]
    headless: bool,

    /// Per-scenario timeout ceiling in seconds
    #[arg(long, default_value = "90")]
    timeout: u64,

    /// Automatic retries per scenario
    #[arg(long, default_value = "1")]
    retries: u32,

    /// Output directory for reports, failure screenshots, and videos
    #[arg(short, long, default_value = "test-results")]
    output: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    let result = rt.block_on(async_main(args));

    match result {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

async fn async_main(args: Args) -> E2eResult<bool> {
    if let Some(url) = &args.base_url {
        // The runner reads E2E_BASE_URL to decide whether to spawn a backend
        std::env::set_var("E2E_BASE_URL", url);
    }

    let scenarios = match &args.name {
        Some(name) => match Scenario::by_name(name) {
            Some(scenario) => vec![scenario],
            None => {
                eprintln!("Unknown scenario: {}", name);
                return Ok(false);
            }
        },
        None => Scenario::all(),
    };

    let config = RunnerConfig {
        browser: BrowserConfig {
            headless: args.headless,
            screenshot_dir: args.output.join("screenshots"),
            video_dir: args.output.join("videos"),
            ..Default::default()
        },
        server: ServerConfig {
            binary_path: args.server_binary,
            ..Default::default()
        },
        scenario_timeout: Duration::from_secs(args.timeout),
        retries: args.retries,
        output_dir: args.output,
    };

    let mut runner = ScenarioRunner::new(config);
    let suite = runner.run(&scenarios).await?;
    runner.write_reports(&suite)?;

    Ok(suite.failed == 0)
}
