pub mod error;
pub mod handlers;
pub mod middleware;
pub mod rate_limit;
pub mod state;
pub mod validation;

pub use state::ApiState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{MethodRouter, get, post, put},
};

/// Routes mounted under `/api/v1`. Every request passes the rate limiter;
/// everything except the auth endpoints also needs a valid bearer token, and
/// mutations additionally need the admin role.
pub fn build_api_router(state: ApiState) -> Router {
    let public = Router::new()
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/refresh-token", post(handlers::refresh_token));

    let protected = Router::new()
        .route(
            "/authors",
            get(handlers::list_authors).merge(admin_only(post(handlers::create_author))),
        )
        .route(
            "/authors/{id}",
            get(handlers::get_author).merge(admin_only(
                put(handlers::update_author).delete(handlers::delete_author),
            )),
        )
        .route(
            "/books",
            get(handlers::list_books).merge(admin_only(post(handlers::create_book))),
        )
        .route(
            "/books/{id}",
            get(handlers::get_book).merge(admin_only(
                put(handlers::update_book).delete(handlers::delete_book),
            )),
        )
        .route(
            "/books/{id}/reviews",
            get(handlers::list_book_reviews).merge(admin_only(post(handlers::create_review))),
        )
        .route(
            "/reviews/{id}",
            admin_only(
                put(handlers::update_review).delete(handlers::delete_review),
            ),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    public
        .merge(protected)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit,
        ))
        .with_state(state)
}

fn admin_only(route: MethodRouter<ApiState>) -> MethodRouter<ApiState> {
    route.route_layer(axum_middleware::from_fn(middleware::require_admin))
}
