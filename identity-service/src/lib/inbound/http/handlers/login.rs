use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::credential::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequestBody>,
) -> Result<ApiSuccess<LoginResponseData>, ApiError> {
    let result = state
        .auth_service
        .login(&body.username, &body.password)
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        LoginResponseData {
            expires_at: result.claims.expires_at(),
            token: result.access_token,
        },
    ))
}

#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequestBody {
    username: String,
    // Older clients send the plaintext under `passwordHash`.
    #[serde(alias = "passwordHash")]
    password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResponseData {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}
