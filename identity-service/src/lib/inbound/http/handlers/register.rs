use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::credential::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequestBody>,
) -> Result<ApiSuccess<RegisterResponseData>, ApiError> {
    state
        .auth_service
        .register(&body.username, &body.password)
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(
        StatusCode::CREATED,
        RegisterResponseData {
            message: "User registered successfully.".to_string(),
        },
    ))
}

#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterRequestBody {
    username: String,
    #[serde(alias = "passwordHash")]
    password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterResponseData {
    pub message: String,
}
