//! Reviews handlers. Reviews are listed and created under their book.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use libris_api_types::{CreateReviewRequest, UpdateReviewRequest};

use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::state::ApiState;
use crate::infra::http::api::validation::{
    create_review_command, path_id, today_utc, update_review_command,
};

use super::ApiJson;

pub async fn list_book_reviews(
    State(state): State<ApiState>,
    Path(book_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let book_id = path_id(&book_id)?;
    let reviews = state.reviews.list_reviews_for_book(book_id).await?;
    Ok(Json(reviews))
}

pub async fn create_review(
    State(state): State<ApiState>,
    Path(book_id): Path<String>,
    ApiJson(payload): ApiJson<CreateReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let book_id = path_id(&book_id)?;
    let command = create_review_command(payload, today_utc())?;
    let review = state.reviews.create_review(book_id, command).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn update_review(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = path_id(&id)?;
    let command = update_review_command(payload)?;
    let review = state.reviews.update_review(id, command).await?;
    Ok(Json(review))
}

pub async fn delete_review(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = path_id(&id)?;
    state.reviews.delete_review(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
