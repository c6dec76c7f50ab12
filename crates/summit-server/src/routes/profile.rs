//! Profile endpoints.

use axum::{Json, Router, extract::State, routing::get};
use summit_proto::{ProfileForm, ProfileMiniForm};

use crate::{context::Authenticated, error::ApiResult, extract::ApiJson, state::AppState};

/// Profile route group.
pub fn routes() -> Router<AppState> {
    Router::new().route("/profile", get(get_profile).post(save_profile))
}

/// `GET /profile`
pub async fn get_profile(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
) -> ApiResult<Json<ProfileForm>> {
    state.api.get_profile(&caller).map(Json)
}

/// `POST /profile`
pub async fn save_profile(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiJson(form): ApiJson<ProfileMiniForm>,
) -> ApiResult<Json<ProfileForm>> {
    state.api.save_profile(&caller, form).map(Json)
}
