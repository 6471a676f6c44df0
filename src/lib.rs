pub mod auth;
pub mod categories;
pub mod client;
pub mod config;
pub mod constants;
pub mod database;
pub mod debts_credits;
pub mod entries;
pub mod models;
pub mod profile;
pub mod reports;
pub mod session;
pub mod store;
pub mod utils;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post, put},
};
use reqwest::Client;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use tracing::info;

// Re-export types at crate root for convenient importing
pub use crate::config::{Config, Mode};
pub use crate::database::Db;
pub use crate::session::SessionSigner;
pub use crate::store::{LocalStore, Store, SupabaseStore};

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Backend chosen from the configured mode
    pub store: Store,
    /// Mints and verifies session cookies
    pub sessions: SessionSigner,
}

impl AppState {
    pub fn new(store: Store, sessions: SessionSigner) -> Self {
        Self { store, sessions }
    }

    /// Builds the store for `config.mode`; demo mode opens and seeds the local database.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let sessions = SessionSigner::new(&config.session_secret, config.production)
            .map_err(anyhow::Error::msg)?;

        let store = match &config.mode {
            Mode::Demo { demo_password } => {
                let db = database::init_local_db(&config.data_path).await?;
                let local = LocalStore::new(db);
                let demo_user = local.seed_demo(demo_password).await?;
                info!(email = %demo_user.email, "demo account ready");
                Store::Local(local)
            }
            Mode::Live {
                supabase_url,
                service_role_key,
            } => Store::Supabase(SupabaseStore::new(
                Client::new(),
                supabase_url,
                service_role_key,
            )),
        };

        Ok(Self::new(store, sessions))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/api/profile", get(profile::get_profile))
        .route("/api/transactions", get(entries::get_entries))
        .route(
            "/api/entries",
            post(entries::create_entry).get(entries::get_entries),
        )
        .route(
            "/api/entries/{id}",
            put(entries::update_entry).delete(entries::delete_entry),
        )
        .route(
            "/api/categories",
            post(categories::create_category).get(categories::get_categories),
        )
        .route(
            "/api/categories/{id}",
            put(categories::update_category).delete(categories::delete_category),
        )
        .route(
            "/api/debts-credits",
            post(debts_credits::create_debt_credit).get(debts_credits::get_debts_credits),
        )
        .route(
            "/api/debts-credits/{id}",
            put(debts_credits::update_debt_credit).delete(debts_credits::delete_debt_credit),
        )
        .route(
            "/api/debts-credits/{id}/status",
            put(debts_credits::toggle_status),
        )
        .route("/api/dashboard", get(reports::dashboard))
        .route("/api/reports/monthly", get(reports::monthly_report))
        .route("/api/reports/export", get(reports::export_report))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root(State(app_state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": "Welcome to Rieno API",
        "status": "running",
        "mode": app_state.store.mode_name(),
    }))
}
