//! Speaker endpoints.

use axum::{
    Json, Router,
    extract::State,
    routing::get,
};
use summit_proto::{SpeakerForm, SpeakerForms};

use crate::{
    context::Authenticated,
    error::ApiResult,
    extract::{ApiJson, ApiPath},
    state::AppState,
};

/// Speaker route group.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/speaker", get(speakers_created).post(create_speaker))
        .route("/speaker/:key", get(get_speaker))
}

/// `POST /speaker`
pub async fn create_speaker(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiJson(form): ApiJson<SpeakerForm>,
) -> ApiResult<Json<SpeakerForm>> {
    state.api.create_speaker(&caller, form).map(Json)
}

/// `GET /speaker`
pub async fn speakers_created(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
) -> ApiResult<Json<SpeakerForms>> {
    state.api.speakers_created(&caller).map(Json)
}

/// `GET /speaker/{key}`
pub async fn get_speaker(
    State(state): State<AppState>,
    ApiPath(key): ApiPath<String>,
) -> ApiResult<Json<SpeakerForm>> {
    state.api.get_speaker(&key).map(Json)
}
