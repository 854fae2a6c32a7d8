pub mod auth;
pub mod polls;

use axum::{Json, extract::State, response::IntoResponse};

use crate::state::AppState;

pub async fn root() -> &'static str {
    "Pollboard backend (Supabase Auth) - Use /health to check status"
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let store = if !state.polls.is_configured() {
        "not configured"
    } else if state.polls.is_healthy().await {
        "connected"
    } else {
        "disconnected"
    };
    let auth = if state.auth.is_some() {
        "configured"
    } else {
        "not configured"
    };

    Json(serde_json::json!({
        "status": if store == "connected" { "ok" } else { "degraded" },
        "store": store,
        "auth": auth
    }))
}
