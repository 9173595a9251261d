use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use metrics::counter;
use tracing::{debug, warn};

use crate::application::auth::Principal;
use super::error::ApiError;
use super::rate_limit::METRIC_RATE_LIMIT_REJECTED;
use super::state::ApiState;

/// Global token bucket in front of every API route, authenticated or not.
pub async fn rate_limit(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.rate_limiter.allow() {
        counter!(METRIC_RATE_LIMIT_REJECTED).increment(1);
        debug!(
            target = "libris::api::ratelimit",
            path = %request.uri().path(),
            "request rejected by rate limiter"
        );
        return ApiError::rate_limited(state.rate_limiter.retry_after_secs());
    }

    next.run(request).await
}

/// Resolve the bearer token into a [`Principal`] stored in request extensions.
pub async fn require_auth(
    State(state): State<ApiState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = extract_bearer(request.headers().get(header::AUTHORIZATION)) else {
        return ApiError::unauthorized().into_response();
    };

    let principal = match state.auth.verify_token(&token) {
        Ok(principal) => principal,
        Err(err) => return ApiError::from(err).into_response(),
    };

    request.extensions_mut().insert(principal.clone());
    let mut response = next.run(request).await;
    // Lets the outer response logger attribute failures to a user.
    response.extensions_mut().insert(principal);
    response
}

/// Must run inside [`require_auth`].
pub async fn require_admin(request: Request<Body>, next: Next) -> Response {
    let Some(principal) = request.extensions().get::<Principal>() else {
        warn!(
            target = "libris::api::auth",
            "missing principal in admin gate"
        );
        return ApiError::unauthorized().into_response();
    };

    if !principal.is_admin() {
        return ApiError::forbidden().into_response();
    }

    next.run(request).await
}

pub(crate) fn extract_bearer(header: Option<&HeaderValue>) -> Option<String> {
    let raw = header?.to_str().ok()?;
    let bearer = raw.strip_prefix("Bearer ")?.trim();
    if bearer.is_empty() {
        return None;
    }
    Some(bearer.to_string())
}
