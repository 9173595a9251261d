//! Books handlers

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use libris_api_types::{CreateBookRequest, UpdateBookRequest};

use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::state::ApiState;
use crate::infra::http::api::validation::{
    create_book_command, path_id, today_utc, update_book_command,
};

use super::ApiJson;

pub async fn list_books(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let books = state.books.list_books().await?;
    Ok(Json(books))
}

pub async fn get_book(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = path_id(&id)?;
    let book = state.books.get_book(id).await?;
    Ok(Json(book))
}

pub async fn create_book(
    State(state): State<ApiState>,
    ApiJson(payload): ApiJson<CreateBookRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = create_book_command(payload, today_utc())?;
    let book = state.books.create_book(command).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

pub async fn update_book(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateBookRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = path_id(&id)?;
    let command = update_book_command(payload, today_utc())?;
    let book = state.books.update_book(id, command).await?;
    Ok(Json(book))
}

pub async fn delete_book(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = path_id(&id)?;
    state.books.delete_book(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
