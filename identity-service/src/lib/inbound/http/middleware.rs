use axum::extract::Request;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::{self};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde_json::json;

use crate::domain::credential::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

/// Extension type to store the authenticated identity in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub username: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Middleware that validates bearer tokens and adds the identity to request extensions
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_token_from_header(&req)?;

    let claims = state.auth_service.validate_token(token).map_err(|e| {
        tracing::warn!(error = %e, "Token validation failed");
        unauthorized("Invalid or expired token")
    })?;

    req.extensions_mut().insert(AuthenticatedUser {
        expires_at: claims.expires_at(),
        username: claims.sub,
    });

    Ok(next.run(req).await)
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": message
        })),
    )
        .into_response()
}

fn extract_token_from_header(req: &Request) -> Result<&str, Response> {
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .ok_or_else(|| unauthorized("Missing Authorization header"))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| unauthorized("Invalid Authorization header"))?;

    auth_str.strip_prefix("Bearer ").ok_or_else(|| {
        unauthorized("Invalid Authorization header format. Expected: Bearer <token>")
    })
}
