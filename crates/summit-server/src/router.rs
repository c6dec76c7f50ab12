//! Router setup.

use axum::{
    Json, Router,
    error_handling::HandleErrorLayer,
    extract::OriginalUri,
    http::{Method, StatusCode},
    middleware,
};
use tower::{ServiceBuilder, limit::ConcurrencyLimitLayer, timeout::TimeoutLayer};
use tower_http::trace::TraceLayer;

use crate::{
    context::context_middleware,
    error::{ApiError, ErrorResponse},
    routes,
    state::AppState,
};

/// Build the HTTP router.
pub fn router(state: AppState) -> Router {
    let request_timeout = state.config.request_timeout;
    let concurrency_limit = state.config.concurrency_limit;

    let router = Router::new()
        .merge(routes::conferences::routes())
        .merge(routes::sessions::routes())
        .merge(routes::speakers::routes())
        .merge(routes::profile::routes())
        .merge(routes::announcements::routes())
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(not_found)
        .layer(middleware::from_fn(context_middleware))
        .layer(TraceLayer::new_for_http());

    let router = match concurrency_limit {
        Some(limit) => router.layer(ConcurrencyLimitLayer::new(limit)),
        None => router,
    };

    let router = match request_timeout {
        Some(timeout) => router.layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout_error))
                .layer(TimeoutLayer::new(timeout)),
        ),
        None => router,
    };

    router.with_state(state)
}

async fn not_found(uri: OriginalUri) -> ApiError {
    ApiError::NotFound(format!("not found: {}", uri.0.path()))
}

async fn method_not_allowed(method: Method, uri: OriginalUri) -> (StatusCode, Json<ErrorResponse>) {
    let message = format!("{method} is not allowed on {}", uri.0.path());
    (StatusCode::METHOD_NOT_ALLOWED, Json(ErrorResponse::new("METHOD_NOT_ALLOWED", message)))
}

async fn handle_timeout_error(_err: tower::BoxError) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse::new("SERVICE_UNAVAILABLE", "Request timed out")),
    )
}
