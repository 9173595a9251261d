//! API handlers organized by resource type.

mod auth;
mod authors;
mod books;
mod health;
mod reviews;

pub use auth::*;
pub use authors::*;
pub use books::*;
pub use health::*;
pub use reviews::*;

use axum::extract::FromRequest;

use super::error::ApiError;

/// `Json` whose rejections render as API errors (400 with the parse reason).
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
