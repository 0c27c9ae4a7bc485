//! # Routes

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};

use super::handlers;
use super::server::AppState;
use crate::session::session_layer;

/// Account routes behind the session middleware, plus the liveness probe.
pub fn create_routes(state: AppState) -> Router {
    let accounts = Router::new()
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/{provider}/prepare", get(handlers::prepare))
        .route("/{provider}/authenticate", get(handlers::authenticate))
        .route("/{provider}/deauthenticate", post(handlers::deauthenticate))
        .route(
            "/{provider}/setup",
            get(handlers::setup_form).post(handlers::setup),
        )
        .layer(from_fn_with_state(state.sessions.clone(), session_layer));

    Router::new()
        .nest("/accounts", accounts)
        .route("/ping", get(handlers::ping))
        .with_state(state)
}
