//! Route definitions for the SessionHub HTTP API.
//!
//! Routes are grouped by the rate-limit budget they are charged against
//! and mounted under `/api`. The WebSocket endpoint lives at `/ws`.

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

use sessionhub_auth::OperationClass;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(limited(auth_routes(), &state, OperationClass::Auth))
        .merge(limited(token_routes(), &state, OperationClass::Mutation))
        .merge(limited(read_routes(), &state, OperationClass::General))
        .merge(limited(
            session_routes(),
            &state,
            OperationClass::SessionManagement,
        ))
        .merge(health_routes());

    let ws_routes = limited(
        Router::new().route("/ws", get(handlers::ws::ws_upgrade)),
        &state,
        OperationClass::General,
    );

    let cors = middleware::cors::build_cors_layer(&state.config.server);

    Router::new()
        .nest("/api", api_routes)
        .merge(ws_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Charges every route of `routes` to `class`.
fn limited(routes: Router<AppState>, state: &AppState, class: OperationClass) -> Router<AppState> {
    routes.route_layer(axum_middleware::from_fn_with_state(
        (state.clone(), class),
        middleware::rate_limit::rate_limit,
    ))
}

/// Credential entry points, keyed by address
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(handlers::auth::signup))
        .route("/auth/login", post(handlers::auth::login))
}

/// Token rotation and logout
fn token_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route("/auth/logout", post(handlers::auth::logout))
}

/// Reads: session status and account
fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/session-status", get(handlers::auth::session_status))
        .route("/account", get(handlers::account::get_account))
        .route("/account/export", get(handlers::account::export_account))
}

/// Device session management
fn session_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/sessions",
            get(handlers::sessions::list_sessions).delete(handlers::sessions::delete_other_sessions),
        )
        .route(
            "/sessions/{session_id}",
            delete(handlers::sessions::delete_session),
        )
}

/// Liveness
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
