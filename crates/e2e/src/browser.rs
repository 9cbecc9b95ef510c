//! Playwright browser probing
//!
//! Instead of cascading selector guesses inside each scenario, the harness
//! generates one Node/Playwright probe script per navigation. The script
//! visits a path, waits for the network to settle, records the response
//! status and the visibility of a fixed set of probe selectors, optionally
//! submits the login form, and prints a single JSON [`Observation`] line.
//! Classification of the observation into a page state happens in Rust
//! ([`crate::scenario::resolve_state`]).

use std::path::PathBuf;
use std::process::{Command, Stdio};
use serde::{Deserialize, Serialize};
use tokio::process::Command as TokioCommand;
use tracing::debug;

use crate::error::{E2eError, E2eResult};
use crate::scenario::Credentials;

/// Probe selectors for the storefront UI
pub mod selectors {
    pub const PRODUCT_LIST: &str = ".product-list";
    pub const ITEM_NAME: &str = ".product-list .item-name";
    pub const PRICE: &str = ".product-list .price";
    pub const EMPTY_STATE_TEXT: &str = "No products found";
    pub const LOGIN_FORM: &str = ".login-form";
    pub const ANY_FORM: &str = "form";
    pub const INLINE_ERROR: &str = ".alert, .error, .notification";
    pub const LANDMARK: &str = "main, #root, .app";
    pub const EMAIL_INPUT: &str = "input[name=\"email\"]";
    pub const PASSWORD_INPUT: &str = "input[name=\"password\"]";
    pub const SUBMIT_BUTTON: &str = "button[type=\"submit\"]";
}

/// Browser probe configuration
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Target deployment base URL
    pub base_url: String,

    pub headless: bool,

    /// Screenshots are captured here, only when a probe script fails
    pub screenshot_dir: PathBuf,

    /// Recordings land here; passing probes delete theirs on the way out
    pub video_dir: PathBuf,

    /// Ceiling for the initial navigation
    pub nav_timeout_ms: u64,

    /// Ceiling for individual selector waits after navigation
    pub settle_timeout_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("E2E_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            headless: true,
            screenshot_dir: PathBuf::from("test-results/screenshots"),
            video_dir: PathBuf::from("test-results/videos"),
            nav_timeout_ms: 30_000,
            settle_timeout_ms: 10_000,
        }
    }
}

/// Everything one probe run observed about a page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Observation {
    /// HTTP status of the navigation response, if any
    pub status: Option<u16>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub product_list: bool,
    #[serde(default)]
    pub item_names: u64,
    #[serde(default)]
    pub prices: u64,
    #[serde(default)]
    pub empty_state: bool,
    #[serde(default)]
    pub login_form: bool,
    #[serde(default)]
    pub any_form: bool,
    #[serde(default)]
    pub landmark: bool,
    #[serde(default)]
    pub inline_error: bool,
    /// Set when the probe submitted the login form
    #[serde(default)]
    pub submitted: bool,
    /// URL after the post-submit wait settled
    #[serde(default)]
    pub final_url: String,
    /// Script-level failure, when the probe itself blew up
    #[serde(default)]
    pub error: Option<String>,
}

const OBSERVATION_MARKER: &str = "OBS ";

/// Check if Playwright is installed
pub fn check_playwright_installed() -> E2eResult<()> {
    let output = Command::new("npx")
        .args(["playwright", "--version"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match output {
        Ok(status) if status.success() => Ok(()),
        _ => Err(E2eError::PlaywrightNotFound),
    }
}

/// Navigate to `path` and record what the page showed. When credentials are
/// given and a form is present, submit them and record the outcome.
pub async fn probe(
    config: &BrowserConfig,
    path: &str,
    probe_name: &str,
    login: Option<&Credentials>,
) -> E2eResult<Observation> {
    check_playwright_installed()?;
    std::fs::create_dir_all(&config.screenshot_dir)?;
    std::fs::create_dir_all(&config.video_dir)?;

    let script = build_probe_script(config, path, probe_name, login);

    let temp_dir = tempfile::tempdir()?;
    let script_path = temp_dir.path().join("probe.js");
    std::fs::write(&script_path, &script)?;

    debug!("Running browser probe {} -> {}", probe_name, path);

    let output = TokioCommand::new("node")
        .arg(&script_path)
        .current_dir(temp_dir.path())
        .output()
        .await?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let observation = stdout
        .lines()
        .rev()
        .find_map(|line| line.strip_prefix(OBSERVATION_MARKER))
        .map(serde_json::from_str::<Observation>);

    match observation {
        Some(Ok(obs)) => {
            debug!("Probe {}: {:?}", probe_name, obs);
            Ok(obs)
        }
        Some(Err(e)) => Err(E2eError::Browser(format!(
            "unparseable observation from {}: {}",
            probe_name, e
        ))),
        None => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(E2eError::Browser(format!(
                "probe {} produced no observation:\nstdout: {}\nstderr: {}",
                probe_name, stdout, stderr
            )))
        }
    }
}

/// Build the Playwright probe script for one navigation
pub fn build_probe_script(
    config: &BrowserConfig,
    path: &str,
    probe_name: &str,
    login: Option<&Credentials>,
) -> String {
    let screenshot_path = config
        .screenshot_dir
        .join(format!("{}.png", probe_name));

    let mut script = format!(
        r#"const {{ chromium }} = require('playwright');

(async () => {{
  const browser = await chromium.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    recordVideo: {{ dir: '{video_dir}' }},
  }});
  const page = await context.newPage();
  const obs = {{
    status: null, title: '', url: '', product_list: false, item_names: 0,
    prices: 0, empty_state: false, login_form: false, any_form: false,
    landmark: false, inline_error: false, submitted: false, final_url: '',
    error: null
  }};
  const visible = async (locator, timeout) => {{
    try {{
      await locator.first().waitFor({{ state: 'visible', timeout }});
      return true;
    }} catch (e) {{
      return false;
    }}
  }};
  try {{
    const response = await page.goto('{base_url}{path}', {{
      waitUntil: 'networkidle',
      timeout: {nav_timeout},
    }});
    if (response) obs.status = response.status();
    obs.title = await page.title();
    obs.url = page.url();

    obs.landmark = await visible(page.locator('{landmark}'), 2000);
    obs.product_list = await visible(page.locator('{product_list}'), {settle_timeout});
    if (obs.product_list) {{
      // Wait for at least one rendered name before counting
      await visible(page.locator('{item_name}'), {settle_timeout});
      obs.item_names = await page.locator('{item_name}').count();
      obs.prices = await page.locator('{price}').count();
    }}
    obs.empty_state = await visible(page.getByText('{empty_text}'), 2000);
    obs.login_form = await visible(page.locator('{login_form}'), 2000);
    obs.any_form = obs.login_form || await visible(page.locator('{any_form}'), 2000);
    obs.inline_error = await visible(page.locator('{inline_error}'), 1000);
"#,
        headless = config.headless,
        video_dir = config.video_dir.display(),
        base_url = config.base_url.trim_end_matches('/'),
        path = path,
        nav_timeout = config.nav_timeout_ms,
        settle_timeout = config.settle_timeout_ms,
        landmark = selectors::LANDMARK,
        product_list = selectors::PRODUCT_LIST,
        item_name = selectors::ITEM_NAME,
        price = selectors::PRICE,
        empty_text = selectors::EMPTY_STATE_TEXT,
        login_form = selectors::LOGIN_FORM,
        any_form = selectors::ANY_FORM,
        inline_error = selectors::INLINE_ERROR,
    );

    if let Some(creds) = login {
        script.push_str(&format!(
            r#"
    if (obs.login_form || obs.any_form) {{
      const scope = obs.login_form ? page.locator('{login_form}') : page;
      await scope.locator('{email_input}').fill({email});
      await scope.locator('{password_input}').fill({password});
      const signIn = page.getByRole('button', {{ name: 'Sign In' }});
      if (await signIn.count() > 0) {{
        await signIn.click();
      }} else {{
        await scope.locator('{submit_button}').first().click();
      }}
      obs.submitted = true;
      try {{
        await page.waitForURL('**/dashboard', {{ timeout: 15000 }});
      }} catch (e) {{
        // No redirect; an inline error is an accepted outcome
      }}
      obs.final_url = page.url();
      obs.inline_error = await visible(page.locator('{inline_error}'), 2000);
    }}
"#,
            login_form = selectors::LOGIN_FORM,
            email_input = selectors::EMAIL_INPUT,
            password_input = selectors::PASSWORD_INPUT,
            submit_button = selectors::SUBMIT_BUTTON,
            inline_error = selectors::INLINE_ERROR,
            // JSON string literals are valid JS string literals, so this
            // covers quotes, backslashes, and control characters alike
            email = serde_json::Value::String(creds.email.clone()),
            password = serde_json::Value::String(creds.password.clone()),
        ));
    }

    script.push_str(&format!(
        r#"
  }} catch (error) {{
    obs.error = error.message;
    try {{
      await page.screenshot({{ path: '{screenshot}', fullPage: true }});
    }} catch (e) {{
      // Screenshot capture is best effort
    }}
  }} finally {{
    console.log('{marker}' + JSON.stringify(obs));
    const video = page.video();
    await context.close();
    await browser.close();
    // Recordings are retained only for failed probes
    if (video && obs.error === null) {{
      try {{
        require('fs').unlinkSync(await video.path());
      }} catch (e) {{}}
    }}
  }}
}})();
"#,
        screenshot = screenshot_path.display(),
        marker = OBSERVATION_MARKER,
    ));

    script
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_script_contains_navigation_and_marker() {
        let config = BrowserConfig {
            base_url: "http://localhost:9999/".to_string(),
            ..Default::default()
        };
        let script = build_probe_script(&config, "/shop", "shop", None);

        assert!(script.contains("page.goto('http://localhost:9999/shop'"));
        assert!(script.contains("networkidle"));
        assert!(script.contains(OBSERVATION_MARKER));
        assert!(!script.contains("fill("));
    }

    #[test]
    fn test_probe_script_records_video_and_discards_on_success() {
        let config = BrowserConfig {
            video_dir: PathBuf::from("out/videos"),
            ..Default::default()
        };
        let script = build_probe_script(&config, "/shop", "shop", None);

        assert!(script.contains("recordVideo: { dir: 'out/videos' }"));
        // The recording is deleted unless the probe errored out
        assert!(script.contains("obs.error === null"));
        assert!(script.contains("unlinkSync"));
        assert!(script.contains("await context.close()"));
    }

    #[test]
    fn test_probe_script_login_section() {
        let config = BrowserConfig::default();
        let creds = Credentials {
            email: "admin@example.com".to_string(),
            password: "it's".to_string(),
        };
        let script = build_probe_script(&config, "/login", "login", Some(&creds));

        // Credentials land as quoted JSON literals, quotes intact
        assert!(script.contains(r#".fill("admin@example.com")"#));
        assert!(script.contains(r#".fill("it's")"#));
        assert!(script.contains("**/dashboard"));
    }

    #[test]
    fn test_probe_script_escapes_hostile_credentials() {
        let config = BrowserConfig::default();
        let creds = Credentials {
            email: "a@b.c".to_string(),
            password: "p\\q'r\"s\nt".to_string(),
        };
        let script = build_probe_script(&config, "/login", "login", Some(&creds));

        // Backslash, both quote kinds, and the newline all stay inside
        // one JS string literal instead of breaking out of it
        assert!(script.contains(r#".fill("p\\q'r\"s\nt")"#));
        assert!(!script.contains("fill('"));
    }

    #[test]
    fn test_observation_parses_with_missing_fields() {
        let obs: Observation = serde_json::from_str(r#"{"status":503}"#).unwrap();
        assert_eq!(obs.status, Some(503));
        assert!(!obs.submitted);
    }
}
