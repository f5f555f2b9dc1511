pub mod auth;
pub mod error;
pub mod middleware;
pub mod polls;
pub mod session;

use std::sync::Arc;

use axum::{
    Json, Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use serde_json::{Value, json};

use chainpoll_chain::PollContract;

use crate::middleware::require_auth;
use crate::session::AuthService;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub auth: AuthService,
    pub chain: Arc<dyn PollContract>,
}

/// All HTTP routes. CORS and tracing layers are added by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/health", get(health));

    let protected_routes = Router::new()
        .route("/create_poll", post(polls::create_poll))
        .route("/get_polls", get(polls::get_polls))
        .route("/vote", post(polls::vote))
        .layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
