//! Scenario contracts and page-state resolution
//!
//! Each scenario navigates, lets the harness observe the page, and then
//! accepts or rejects a small set of known UI states. Transient 503s during
//! deployment cold start are an accepted state, not a failure.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

use crate::browser::{probe, BrowserConfig, Observation};
use crate::error::{E2eError, E2eResult};

/// Login credentials for the browser scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    /// Resolution order: explicit E2E overrides, then the deployment's seed
    /// variables, then the harness defaults.
    pub fn from_env() -> Self {
        let email = std::env::var("E2E_EMAIL")
            .or_else(|_| std::env::var("SEED_ADMIN_EMAIL"))
            .unwrap_or_else(|_| crate::seed::DEFAULT_ADMIN_EMAIL.to_string());
        let password = std::env::var("E2E_PASSWORD")
            .or_else(|_| std::env::var("SEED_ADMIN_PASSWORD"))
            .unwrap_or_else(|_| crate::seed::DEFAULT_ADMIN_PASSWORD.to_string());
        Self { email, password }
    }
}

/// The known UI states a probe can resolve to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageState {
    /// 503 during a startup race; accepted, scenario returns early
    ServiceUnavailable,
    /// Page answered 200 and a content landmark is visible
    PageReady,
    /// Product list rendered with at least one name and one price
    ProductListPopulated,
    /// Explicit "no products" affordance on an empty deployment
    EmptyState,
    /// Credentials form located but not submitted
    LoginForm,
    /// Authenticated redirect landed
    Dashboard,
    /// Visible inline error after a submit (acceptable on an unseeded store)
    InlineError,
    /// None of the above
    Unknown,
}

impl std::fmt::Display for PageState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PageState::ServiceUnavailable => "service-unavailable",
            PageState::PageReady => "page-ready",
            PageState::ProductListPopulated => "product-list-populated",
            PageState::EmptyState => "empty-state",
            PageState::LoginForm => "login-form",
            PageState::Dashboard => "dashboard",
            PageState::InlineError => "inline-error",
            PageState::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Single resolution function from an observation to a known UI state.
/// Replaces per-scenario cascading selector guesses.
pub fn resolve_state(obs: &Observation) -> PageState {
    if obs.status == Some(503) {
        return PageState::ServiceUnavailable;
    }
    if obs.error.is_some() {
        return PageState::Unknown;
    }
    if obs.submitted {
        if obs.final_url.trim_end_matches('/').ends_with("/dashboard") {
            return PageState::Dashboard;
        }
        if obs.inline_error {
            return PageState::InlineError;
        }
        return PageState::Unknown;
    }
    if obs.product_list && obs.item_names > 0 && obs.prices > 0 {
        return PageState::ProductListPopulated;
    }
    if obs.empty_state {
        return PageState::EmptyState;
    }
    if obs.login_form || obs.any_form {
        return PageState::LoginForm;
    }
    if obs.status == Some(200) && obs.landmark {
        return PageState::PageReady;
    }
    PageState::Unknown
}

/// The browser-driven scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Homepage loads with a title and a content landmark
    Smoke,
    /// Product list API answers with the expected envelope
    ApiHealth,
    /// Shop page shows products or an explicit empty state
    Shop,
    /// Credentials form submits to a dashboard redirect or an inline error
    Login,
}

impl Scenario {
    pub fn all() -> Vec<Scenario> {
        vec![
            Scenario::Smoke,
            Scenario::ApiHealth,
            Scenario::Shop,
            Scenario::Login,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::Smoke => "smoke",
            Scenario::ApiHealth => "api-health",
            Scenario::Shop => "shop",
            Scenario::Login => "login",
        }
    }

    pub fn by_name(name: &str) -> Option<Scenario> {
        Scenario::all().into_iter().find(|s| s.name() == name)
    }
}

/// What a scenario run resolved to
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub state: PageState,
    pub detail: String,
}

fn fail(scenario: Scenario, reason: impl Into<String>) -> E2eError {
    E2eError::ScenarioFailed {
        name: scenario.name().to_string(),
        reason: reason.into(),
    }
}

/// Titles the smoke scenario recognizes; a miss is logged, not fatal
const ACCEPTED_TITLE_WORDS: &[&str] = &["shopfront", "store", "shop", "home", "react", "ecommerce"];

/// Run one scenario against the configured deployment
pub async fn execute(scenario: Scenario, config: &BrowserConfig) -> E2eResult<ScenarioOutcome> {
    match scenario {
        Scenario::Smoke => run_smoke(config).await,
        Scenario::ApiHealth => run_api_health(config).await,
        Scenario::Shop => run_shop(config).await,
        Scenario::Login => run_login(config).await,
    }
}

async fn run_smoke(config: &BrowserConfig) -> E2eResult<ScenarioOutcome> {
    let obs = probe(config, "/", "smoke", None).await?;
    let state = resolve_state(&obs);

    match state {
        PageState::ServiceUnavailable => {
            info!("Homepage returned 503, deployment still starting");
            Ok(ScenarioOutcome {
                state,
                detail: "503 accepted during startup".into(),
            })
        }
        _ if obs.status == Some(200) && obs.landmark => {
            let title = obs.title.to_lowercase();
            if !ACCEPTED_TITLE_WORDS.iter().any(|w| title.contains(w)) {
                warn!("Unexpected page title {:?}, continuing", obs.title);
            }
            Ok(ScenarioOutcome {
                state: PageState::PageReady,
                detail: format!("title {:?}", obs.title),
            })
        }
        _ => Err(fail(
            Scenario::Smoke,
            format!("state {} (status {:?})", state, obs.status),
        )),
    }
}

async fn run_api_health(config: &BrowserConfig) -> E2eResult<ScenarioOutcome> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;
    let url = format!(
        "{}/api/product/list",
        config.base_url.trim_end_matches('/')
    );

    let resp = client.get(&url).send().await?;
    let status = resp.status().as_u16();

    if status == 503 {
        info!("API returned 503, deployment still starting");
        return Ok(ScenarioOutcome {
            state: PageState::ServiceUnavailable,
            detail: "503 accepted during startup".into(),
        });
    }
    if status != 200 {
        return Err(fail(Scenario::ApiHealth, format!("status {}", status)));
    }

    let body: serde_json::Value = resp.json().await?;
    for field in ["products", "totalPages", "currentPage", "count"] {
        if body.get(field).is_none() {
            return Err(fail(
                Scenario::ApiHealth,
                format!("response missing field {:?}", field),
            ));
        }
    }
    let count = body["products"].as_array().map(|a| a.len()).unwrap_or(0);

    Ok(ScenarioOutcome {
        state: PageState::PageReady,
        detail: format!("{} product(s) in envelope", count),
    })
}

async fn run_shop(config: &BrowserConfig) -> E2eResult<ScenarioOutcome> {
    let obs = probe(config, "/shop", "shop", None).await?;
    let state = resolve_state(&obs);

    match state {
        PageState::ServiceUnavailable => Ok(ScenarioOutcome {
            state,
            detail: "503 accepted during startup".into(),
        }),
        PageState::ProductListPopulated => Ok(ScenarioOutcome {
            state,
            detail: format!("{} name(s), {} price(s)", obs.item_names, obs.prices),
        }),
        PageState::EmptyState => {
            info!("Shop page shows the empty-state affordance");
            Ok(ScenarioOutcome {
                state,
                detail: "explicit empty state".into(),
            })
        }
        _ => Err(fail(
            Scenario::Shop,
            format!("state {} (status {:?})", state, obs.status),
        )),
    }
}

async fn run_login(config: &BrowserConfig) -> E2eResult<ScenarioOutcome> {
    let creds = Credentials::from_env();
    let obs = probe(config, "/login", "login", Some(&creds)).await?;
    let state = resolve_state(&obs);

    match state {
        PageState::ServiceUnavailable => Ok(ScenarioOutcome {
            state,
            detail: "503 accepted during startup".into(),
        }),
        PageState::Dashboard => Ok(ScenarioOutcome {
            state,
            detail: "redirected to dashboard".into(),
        }),
        PageState::InlineError => {
            // Acceptable when the backing store was not seeded
            info!("Login rejected with a visible error, store likely unseeded");
            Ok(ScenarioOutcome {
                state,
                detail: "inline error accepted".into(),
            })
        }
        PageState::LoginForm => Err(fail(
            Scenario::Login,
            "credentials form found but submission never settled",
        )),
        _ => Err(fail(
            Scenario::Login,
            format!("state {} (final url {:?})", state, obs.final_url),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_obs() -> Observation {
        Observation {
            status: Some(200),
            landmark: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_503_wins() {
        let obs = Observation {
            status: Some(503),
            product_list: true,
            item_names: 3,
            prices: 3,
            ..Default::default()
        };
        assert_eq!(resolve_state(&obs), PageState::ServiceUnavailable);
    }

    #[test]
    fn test_resolve_populated_list() {
        let obs = Observation {
            product_list: true,
            item_names: 2,
            prices: 2,
            ..base_obs()
        };
        assert_eq!(resolve_state(&obs), PageState::ProductListPopulated);
    }

    #[test]
    fn test_resolve_list_without_prices_is_not_populated() {
        let obs = Observation {
            product_list: true,
            item_names: 2,
            prices: 0,
            ..base_obs()
        };
        assert_ne!(resolve_state(&obs), PageState::ProductListPopulated);
    }

    #[test]
    fn test_resolve_empty_state() {
        let obs = Observation {
            empty_state: true,
            ..base_obs()
        };
        assert_eq!(resolve_state(&obs), PageState::EmptyState);
    }

    #[test]
    fn test_resolve_submit_outcomes() {
        let dashboard = Observation {
            submitted: true,
            final_url: "http://localhost:8080/dashboard".into(),
            ..base_obs()
        };
        assert_eq!(resolve_state(&dashboard), PageState::Dashboard);

        let rejected = Observation {
            submitted: true,
            final_url: "http://localhost:8080/login".into(),
            inline_error: true,
            ..base_obs()
        };
        assert_eq!(resolve_state(&rejected), PageState::InlineError);

        let stuck = Observation {
            submitted: true,
            final_url: "http://localhost:8080/login".into(),
            ..base_obs()
        };
        assert_eq!(resolve_state(&stuck), PageState::Unknown);
    }

    #[test]
    fn test_resolve_fallback_form_counts_as_login_form() {
        let obs = Observation {
            any_form: true,
            ..base_obs()
        };
        assert_eq!(resolve_state(&obs), PageState::LoginForm);
    }

    #[test]
    fn test_resolve_plain_page() {
        assert_eq!(resolve_state(&base_obs()), PageState::PageReady);
        assert_eq!(resolve_state(&Observation::default()), PageState::Unknown);
    }

    #[test]
    fn test_scenario_names_round_trip() {
        for scenario in Scenario::all() {
            assert_eq!(Scenario::by_name(scenario.name()), Some(scenario));
        }
        assert_eq!(Scenario::by_name("nope"), None);
    }
}
