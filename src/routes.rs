//! Route definitions and router setup
//!
//! Configures all API routes, their role declarations and middleware.

mod auth;
mod home;
mod user;

use crate::auth::{Role, RoleSet, RouteScope};
use crate::config::Settings;
use crate::state::SharedState;
use axum::{
    http::{header, Method},
    routing::{delete, get, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::MakeRequestUuid,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
    ServiceBuilderExt,
};
use tracing::Level;

/// Create the application router with all routes and middleware
pub fn create_router(state: SharedState, settings: &Settings) -> Router {
    // Build CORS layer
    let cors = build_cors_layer(settings);

    // Build tracing/logging layer
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    // Build middleware stack
    let middleware = ServiceBuilder::new()
        .set_x_request_id(MakeRequestUuid)
        .layer(trace_layer)
        .layer(TimeoutLayer::new(settings.server.request_timeout()))
        .layer(CompressionLayer::new())
        .layer(cors)
        .propagate_x_request_id();

    Router::new()
        // Health check
        .route("/health", get(health_check))
        .merge(auth_routes(&state))
        .merge(home_routes(&state))
        .merge(user_routes(&state))
        // Apply middleware and state
        .layer(middleware)
        .with_state(state)
}

/// Signup, signin, product keys and the current user
fn auth_routes(state: &SharedState) -> Router<SharedState> {
    let scope = RouteScope::open(state.guard.clone());
    let any_user = RoleSet::of([Role::Buyer, Role::Realtor, Role::Admin]);

    Router::new()
        .route("/auth/signup/{user_type}", scope.route(post(auth::signup)))
        .route("/auth/signin", scope.route(post(auth::signin)))
        .route(
            "/auth/key",
            scope.route_with(RoleSet::of([Role::Admin]), post(auth::generate_product_key)),
        )
        .route("/auth/me", scope.route_with(any_user, get(auth::me)))
}

/// Listings are public to read; writes belong to realtors, inquiries to buyers
fn home_routes(state: &SharedState) -> Router<SharedState> {
    let scope = RouteScope::open(state.guard.clone());
    let listers = RoleSet::of([Role::Realtor, Role::Admin]);
    let buyers = RoleSet::of([Role::Buyer]);

    Router::new()
        .route("/home", scope.route(get(home::get_homes)))
        .route("/home", scope.route_with(listers.clone(), post(home::create_home)))
        .route("/home/{id}", scope.route(get(home::get_home)))
        .route("/home/{id}", scope.route_with(listers.clone(), put(home::update_home)))
        .route("/home/{id}", scope.route_with(listers.clone(), delete(home::delete_home)))
        .route("/home/{id}/inquire", scope.route_with(buyers, post(home::inquire)))
        .route("/home/{id}/messages", scope.route_with(listers, get(home::get_messages)))
}

/// User administration, admin only
fn user_routes(state: &SharedState) -> Router<SharedState> {
    let scope = RouteScope::restricted(state.guard.clone(), RoleSet::of([Role::Admin]));

    Router::new()
        .route("/user", scope.route(get(user::list_users)))
        .route("/user/{id}", scope.route(get(user::get_user)))
}

/// Build CORS layer from settings
fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<_> = settings
        .cors
        .allowed_origins
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    let cors = if origins.is_empty() {
        CorsLayer::new().allow_origin(Any)
    } else {
        CorsLayer::new().allow_origin(origins)
    };

    cors.allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .max_age(Duration::from_secs(3600))
}

/// Health check endpoint
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "success": true,
        "message": "Server is running fine.",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}
