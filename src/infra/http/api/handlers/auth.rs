//! Registration, login and token refresh handlers

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use libris_api_types::{LoginRequest, RegisterRequest, TokenResponse, UserResponse};
use tracing::info;

use crate::application::auth::IssuedToken;
use crate::domain::entities::UserRecord;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::middleware::extract_bearer;
use crate::infra::http::api::state::ApiState;
use crate::infra::http::api::validation::{login_command, register_command};

use super::ApiJson;

pub async fn register(
    State(state): State<ApiState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = register_command(payload)?;
    let user = state.auth.register_user(command).await?;

    info!(
        target = "libris::auth",
        user_id = user.id,
        username = %user.username,
        "user registered"
    );
    Ok((StatusCode::CREATED, Json(user_response(&user))))
}

pub async fn login(
    State(state): State<ApiState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = login_command(payload)?;
    let issued = state.auth.login_user(command).await?;
    Ok(Json(token_response(issued)))
}

pub async fn refresh_token(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token =
        extract_bearer(headers.get(header::AUTHORIZATION)).ok_or_else(ApiError::unauthorized)?;
    let issued = state.auth.refresh_token(&token).await?;
    Ok(Json(token_response(issued)))
}

fn user_response(user: &UserRecord) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        role: user.role,
    }
}

fn token_response(issued: IssuedToken) -> TokenResponse {
    TokenResponse {
        token: issued.token,
        token_type: "Bearer".to_string(),
        expires_at: issued.expires_at.unix_timestamp(),
    }
}
