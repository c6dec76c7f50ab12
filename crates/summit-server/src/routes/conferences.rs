//! Conference and registration endpoints.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use summit_proto::{BooleanMessage, ConferenceForm, ConferenceForms, ConferenceQueryForms};

use crate::{
    context::Authenticated,
    error::ApiResult,
    extract::{ApiJson, ApiPath},
    state::AppState,
};

/// Conference route group.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/conference", post(create_conference))
        .route("/conference/:key", get(get_conference).put(update_conference))
        .route("/conference/:key/registration", post(register).delete(unregister))
        .route("/queryConferences", post(query_conferences))
        .route("/conferences/created", get(conferences_created))
        .route("/conferences/attending", get(conferences_to_attend))
}

/// `POST /conference`
pub async fn create_conference(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiJson(form): ApiJson<ConferenceForm>,
) -> ApiResult<Json<ConferenceForm>> {
    state.api.create_conference(&caller, form).map(Json)
}

/// `GET /conference/{key}`
pub async fn get_conference(
    State(state): State<AppState>,
    ApiPath(key): ApiPath<String>,
) -> ApiResult<Json<ConferenceForm>> {
    state.api.get_conference(&key).map(Json)
}

/// `PUT /conference/{key}`
pub async fn update_conference(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiPath(key): ApiPath<String>,
    ApiJson(form): ApiJson<ConferenceForm>,
) -> ApiResult<Json<ConferenceForm>> {
    state.api.update_conference(&caller, &key, form).map(Json)
}

/// `POST /conference/{key}/registration`
pub async fn register(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiPath(key): ApiPath<String>,
) -> ApiResult<Json<BooleanMessage>> {
    state.api.register_for_conference(&caller, &key).map(Json)
}

/// `DELETE /conference/{key}/registration`
pub async fn unregister(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiPath(key): ApiPath<String>,
) -> ApiResult<Json<BooleanMessage>> {
    state.api.unregister_from_conference(&caller, &key).map(Json)
}

/// `POST /queryConferences`
pub async fn query_conferences(
    State(state): State<AppState>,
    ApiJson(forms): ApiJson<ConferenceQueryForms>,
) -> ApiResult<Json<ConferenceForms>> {
    state.api.query_conferences(&forms).map(Json)
}

/// `GET /conferences/created`
pub async fn conferences_created(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
) -> ApiResult<Json<ConferenceForms>> {
    state.api.conferences_created(&caller).map(Json)
}

/// `GET /conferences/attending`
pub async fn conferences_to_attend(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
) -> ApiResult<Json<ConferenceForms>> {
    state.api.conferences_to_attend(&caller).map(Json)
}
