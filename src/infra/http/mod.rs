pub mod api;
mod middleware;

pub use api::rate_limit::TokenBucket;
pub use api::{ApiState, build_api_router};
pub use middleware::RequestContext;

use axum::{Router, middleware as axum_middleware, routing::get};

use middleware::{log_responses, set_request_context};

/// Full application router: the versioned API plus the unthrottled database
/// health probe.
pub fn build_router(state: ApiState) -> Router {
    let health = Router::new()
        .route("/_health/db", get(api::handlers::db_health))
        .with_state(state.clone());

    Router::new()
        .nest("/api/v1", build_api_router(state))
        .merge(health)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
