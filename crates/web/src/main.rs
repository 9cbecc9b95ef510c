use std::net::SocketAddr;

use tracing::{info, warn};

use shopfront_common::{new_id, Database, Provider, Role, User};
use shopfront_web::{AppState, AuthService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let addr: SocketAddr = std::env::var("SHOPFRONT_WEB_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
        .parse()?;

    let db_path = std::env::var("SHOPFRONT_DB_PATH").unwrap_or_else(|_| "shopfront.db".to_string());

    // An unset secret gets a random one; fine for local runs, tokens won't
    // survive a restart.
    let jwt_secret = std::env::var("SHOPFRONT_JWT_SECRET").unwrap_or_else(|_| {
        warn!("SHOPFRONT_JWT_SECRET not set, using a random secret");
        new_id()
    });

    let db = Database::open(&db_path)?;
    seed_admin_from_env(&db, &AuthService::new(jwt_secret.clone()))?;

    let state = AppState::new(db, jwt_secret);

    info!("Starting Shopfront API on http://{} (db: {})", addr, db_path);
    shopfront_web::serve(addr, state).await
}

/// Seed the admin account when SEED_ADMIN_EMAIL/SEED_ADMIN_PASSWORD are set,
/// so a fresh deployment has a login for the E2E scenarios.
fn seed_admin_from_env(db: &Database, auth: &AuthService) -> anyhow::Result<()> {
    let (Ok(email), Ok(password)) = (
        std::env::var("SEED_ADMIN_EMAIL"),
        std::env::var("SEED_ADMIN_PASSWORD"),
    ) else {
        return Ok(());
    };

    if db.find_user_by_email(&email)?.is_some() {
        return Ok(());
    }

    let user = User {
        id: new_id(),
        email: email.clone(),
        password_hash: auth.hash_password(&password)?,
        role: Role::Admin,
        provider: Provider::Email,
        first_name: "Admin".into(),
        last_name: "User".into(),
    };
    db.insert_user(&user)?;
    info!("Seeded admin account {}", email);
    Ok(())
}
