//! Announcement endpoints. Public; they only read the cache.

use axum::{Json, Router, extract::State, routing::get};
use summit_proto::StringMessage;

use crate::state::AppState;

/// Announcement route group.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/announcement", get(announcement))
        .route("/featuredSpeaker", get(featured_speaker))
}

/// `GET /announcement`
pub async fn announcement(State(state): State<AppState>) -> Json<StringMessage> {
    Json(state.api.announcement())
}

/// `GET /featuredSpeaker`
pub async fn featured_speaker(State(state): State<AppState>) -> Json<StringMessage> {
    Json(state.api.featured_speaker())
}
