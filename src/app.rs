//! Application Assembly
//! Mission: Shared state construction and router wiring

use crate::auth::{api as auth_api, auth_middleware, JwtHandler, UserStore};
use crate::config::Config;
use crate::market::{api as market_api, MarketStore};
use crate::middleware::request_logging;
use anyhow::Result;
use axum::{
    middleware,
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Shared application state, built once at startup and injected into every
/// handler. The JWT secret lives inside the handler; nothing here is mutable
/// across requests.
#[derive(Clone)]
pub struct AppState {
    pub user_store: Arc<UserStore>,
    pub market_store: Arc<MarketStore>,
    pub jwt_handler: Arc<JwtHandler>,
}

/// Build the full application router from configuration.
pub fn build_app(config: &Config) -> Result<Router> {
    let user_store = Arc::new(UserStore::new(&config.database_path)?);
    let market_store = Arc::new(MarketStore::new(&config.database_path)?);
    let jwt_handler = Arc::new(JwtHandler::new(config.jwt_secret.clone(), config.token_ttl));

    info!("Stores initialized at: {}", config.database_path);

    let state = AppState {
        user_store,
        market_store,
        jwt_handler: jwt_handler.clone(),
    };

    // Public routes: health plus the two credential endpoints
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/register", post(auth_api::register))
        .route("/api/login", post(auth_api::login));

    // Everything else sits behind the access gate. Role checks happen in
    // the handlers, after authentication has already succeeded.
    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth_api::get_current_user))
        .route("/api/profile", get(auth_api::get_profile))
        .route("/api/profile", put(auth_api::update_profile))
        .route("/api/stalls", get(market_api::list_stalls))
        .route("/api/stalls", post(market_api::create_stall))
        .route("/api/stalls/:id", get(market_api::get_stall))
        .route("/api/stalls/:id", put(market_api::update_stall))
        .route("/api/stalls/:id", delete(market_api::delete_stall))
        .route("/api/bookings", post(market_api::create_booking))
        .route("/api/bookings", get(market_api::list_bookings))
        .route("/api/bookings/me", get(market_api::my_bookings))
        .route(
            "/api/bookings/:id/status",
            patch(market_api::update_booking_status),
        )
        .route("/api/admin/users", get(auth_api::list_users))
        .route("/api/admin/users", post(auth_api::create_user))
        .route("/api/admin/users/:id", delete(auth_api::delete_user))
        .route_layer(middleware::from_fn_with_state(
            jwt_handler,
            auth_middleware,
        ));

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(middleware::from_fn(request_logging))
        .layer(CorsLayer::permissive());

    Ok(app)
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
