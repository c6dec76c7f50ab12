//! Session and wishlist endpoints.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::Deserialize;
use summit_proto::{BooleanMessage, SessionForm, SessionForms};

use crate::{
    context::Authenticated,
    error::ApiResult,
    extract::{ApiJson, ApiPath, ApiQuery},
    state::AppState,
};

/// Session route group.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/conference/:key/sessions", get(conference_sessions).post(create_session))
        .route("/conference/:key/sessions/type/:type_of_session", get(sessions_by_type))
        .route("/conference/:key/sessions/before/:start_time", get(sessions_before))
        .route("/speaker/:key/sessions", get(sessions_by_speaker))
        .route("/wishlist", get(wishlist))
        .route("/wishlist/:session_key", post(add_to_wishlist).delete(remove_from_wishlist))
}

/// Query string of `sessions/before`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeforeParams {
    /// Session type to leave out
    pub exclude_type: Option<String>,
}

/// `GET /conference/{key}/sessions`
pub async fn conference_sessions(
    State(state): State<AppState>,
    ApiPath(key): ApiPath<String>,
) -> ApiResult<Json<SessionForms>> {
    state.api.conference_sessions(&key).map(Json)
}

/// `POST /conference/{key}/sessions`
pub async fn create_session(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiPath(key): ApiPath<String>,
    ApiJson(form): ApiJson<SessionForm>,
) -> ApiResult<Json<SessionForm>> {
    state.api.create_session(&caller, &key, form).map(Json)
}

/// `GET /conference/{key}/sessions/type/{type}`
pub async fn sessions_by_type(
    State(state): State<AppState>,
    ApiPath((key, type_of_session)): ApiPath<(String, String)>,
) -> ApiResult<Json<SessionForms>> {
    state.api.conference_sessions_by_type(&key, &type_of_session).map(Json)
}

/// `GET /conference/{key}/sessions/before/{HH:MM}`
pub async fn sessions_before(
    State(state): State<AppState>,
    ApiPath((key, start_time)): ApiPath<(String, String)>,
    ApiQuery(params): ApiQuery<BeforeParams>,
) -> ApiResult<Json<SessionForms>> {
    state.api.sessions_before(&key, &start_time, params.exclude_type.as_deref()).map(Json)
}

/// `GET /speaker/{key}/sessions`
pub async fn sessions_by_speaker(
    State(state): State<AppState>,
    ApiPath(key): ApiPath<String>,
) -> ApiResult<Json<SessionForms>> {
    state.api.sessions_by_speaker(&key).map(Json)
}

/// `GET /wishlist`
pub async fn wishlist(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
) -> ApiResult<Json<SessionForms>> {
    state.api.sessions_in_wishlist(&caller).map(Json)
}

/// `POST /wishlist/{session key}`
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiPath(session_key): ApiPath<String>,
) -> ApiResult<Json<BooleanMessage>> {
    state.api.add_session_to_wishlist(&caller, &session_key).map(Json)
}

/// `DELETE /wishlist/{session key}`
pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiPath(session_key): ApiPath<String>,
) -> ApiResult<Json<BooleanMessage>> {
    state.api.remove_session_from_wishlist(&caller, &session_key).map(Json)
}
