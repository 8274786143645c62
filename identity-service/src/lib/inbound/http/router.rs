use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::login::login;
use super::handlers::me::me;
use super::handlers::register::register;
use super::middleware::authenticate as auth_middleware;
use crate::domain::credential::ports::AuthServicePort;

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthServicePort>,
}

pub fn create_router(auth_service: Arc<dyn AuthServicePort>) -> Router {
    let state = AppState { auth_service };

    let authentication_routes = Router::new()
        .route("/me", get(me))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        // Registered after route_layer, so left unguarded.
        .route("/register", post(register))
        .route("/login", post(login));

    // No headers in the span: Authorization carries the bearer token.
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
            )
        })
        .on_response(|response: &Response<Body>, latency: Duration, _span: &Span| {
            tracing::info!(
                status = response.status().as_u16(),
                latency_ms = latency.as_millis(),
                "Request completed"
            );
        });

    Router::new()
        .nest("/api/authentication", authentication_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
