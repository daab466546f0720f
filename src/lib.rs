pub mod appresult;
pub mod config;
pub mod db;
pub mod profiles;
pub mod res;
pub mod servers;
pub mod session;
pub mod setup;

use std::sync::Arc;

use axum::{extract::FromRef, routing::get, Router};
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};

pub use appresult::{AppError, AppResult};
use config::Config;
use profiles::{ProfileResolver, SessionProfileResolver};
use servers::{ServerRepository, SqliteServerRepository};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub config: Arc<Config>,
    pub profiles: Arc<dyn ProfileResolver>,
    pub servers: Arc<dyn ServerRepository>,
}

impl AppState {
    pub fn new(config: Config, db_pool: SqlitePool) -> Self {
        AppState {
            config: Arc::new(config),
            profiles: Arc::new(SessionProfileResolver::new(db_pool.clone())),
            servers: Arc::new(SqliteServerRepository::new(db_pool)),
        }
    }
}

/// Every route, minus the session layer.
pub fn app(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(setup::setup))
        .nest("/servers", servers::router())
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
}

pub fn session_layer(config: &Config) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_secure(config.cookie_secure)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(config.session_inactivity_minutes)))
}
