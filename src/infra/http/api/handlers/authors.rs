//! Authors handlers

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use libris_api_types::{CreateAuthorRequest, UpdateAuthorRequest};

use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::state::ApiState;
use crate::infra::http::api::validation::{
    create_author_command, path_id, today_utc, update_author_command,
};

use super::ApiJson;

pub async fn list_authors(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let authors = state.authors.list_authors().await?;
    Ok(Json(authors))
}

pub async fn get_author(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = path_id(&id)?;
    let author = state.authors.get_author(id).await?;
    Ok(Json(author))
}

pub async fn create_author(
    State(state): State<ApiState>,
    ApiJson(payload): ApiJson<CreateAuthorRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = create_author_command(payload, today_utc())?;
    let author = state.authors.create_author(command).await?;
    Ok((StatusCode::CREATED, Json(author)))
}

pub async fn update_author(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateAuthorRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = path_id(&id)?;
    let command = update_author_command(payload, today_utc())?;
    let author = state.authors.update_author(id, command).await?;
    Ok(Json(author))
}

pub async fn delete_author(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = path_id(&id)?;
    state.authors.delete_author(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
