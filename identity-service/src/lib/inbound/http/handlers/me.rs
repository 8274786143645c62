use axum::http::StatusCode;
use axum::Extension;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use super::ApiSuccess;
use crate::inbound::http::middleware::AuthenticatedUser;

/// Echo the identity the bearer token was issued for.
pub async fn me(Extension(user): Extension<AuthenticatedUser>) -> ApiSuccess<MeResponseData> {
    ApiSuccess::new(
        StatusCode::OK,
        MeResponseData {
            username: user.username,
            expires_at: user.expires_at,
        },
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeResponseData {
    pub username: String,
    pub expires_at: Option<DateTime<Utc>>,
}
