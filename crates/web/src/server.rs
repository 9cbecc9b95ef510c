//! Web server implementation

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use shopfront_common::{Database, Error, ProductSort, User};

use crate::auth::AuthService;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub auth: AuthService,
}

impl AppState {
    pub fn new(db: Database, jwt_secret: String) -> Self {
        Self {
            db,
            auth: AuthService::new(jwt_secret),
        }
    }
}

/// Build the application router. Pure function of the state; binds no socket,
/// so tests can drive it with injected requests.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/product/list", get(product_list_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .with_state(state)
}

/// Serve the application on the given address until the task is cancelled
pub async fn serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// Error mapping
// ============================================================================

/// API-level error carrying the status code the route responds with
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        // Store failures (including a severed connection) surface as 400 so
        // clients get a terminal response instead of a hang.
        let status = match e {
            Error::ConnectionClosed | Error::Database(_) | Error::NotFound { .. } => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        warn!("Request failed: {}", e);
        Self {
            status,
            message: "Your request could not be processed. Please try again.".into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    success: bool,
    token: String,
    user: User,
}

async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = match body.email.as_deref().map(str::trim) {
        Some(email) if !email.is_empty() => email,
        _ => return Err(ApiError::bad_request("You must enter an email address.")),
    };
    let password = match body.password.as_deref() {
        Some(password) if !password.is_empty() => password,
        _ => return Err(ApiError::bad_request("You must enter a password.")),
    };

    let user = state
        .db
        .find_user_by_email(email)?
        .ok_or_else(|| ApiError::bad_request("No user found for this email address."))?;

    if !state.auth.verify_password(password, &user.password_hash)? {
        return Err(ApiError::bad_request("Password Incorrect"));
    }

    let token = state.auth.create_token(&user)?;
    debug!("User {} logged in", user.email);

    Ok(Json(LoginResponse {
        success: true,
        token,
        user,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    /// JSON-encoded single-key sort map, e.g. `{"created":-1}`
    #[serde(default)]
    sort_order: Option<String>,
    #[serde(default)]
    page: Option<u64>,
    #[serde(default)]
    limit: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProductListResponse {
    products: Vec<shopfront_common::Product>,
    total_pages: u64,
    current_page: u64,
    count: u64,
}

fn parse_sort(raw: Option<&str>) -> ProductSort {
    let Some(raw) = raw else {
        return ProductSort::CreatedDesc;
    };
    match serde_json::from_str::<HashMap<String, i64>>(raw) {
        Ok(map) => map
            .into_iter()
            .next()
            .map(|(key, dir)| ProductSort::from_key(&key, dir))
            .unwrap_or(ProductSort::CreatedDesc),
        Err(_) => {
            debug!("Unparseable sortOrder {:?}, using default", raw);
            ProductSort::CreatedDesc
        }
    }
}

async fn product_list_handler(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ProductListResponse>, ApiError> {
    let sort = parse_sort(params.sort_order.as_deref());
    let page = state
        .db
        .list_products(sort, params.page.unwrap_or(1), params.limit.unwrap_or(10))?;

    Ok(Json(ProductListResponse {
        products: page.products,
        total_pages: page.total_pages,
        current_page: page.current_page,
        count: page.count,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sort() {
        assert_eq!(parse_sort(None), ProductSort::CreatedDesc);
        assert_eq!(parse_sort(Some(r#"{"created":-1}"#)), ProductSort::CreatedDesc);
        assert_eq!(parse_sort(Some(r#"{"price":1}"#)), ProductSort::PriceAsc);
        assert_eq!(parse_sort(Some("not-json")), ProductSort::CreatedDesc);
    }
}
