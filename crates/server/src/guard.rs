use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::session::session_token;
use crate::state::AppState;

pub const LOGIN_PATH: &str = "/auth/login";

/// Runs before every handler. Protected paths need a token the provider
/// accepts; anything else is redirected to the login page.
pub async fn require_session(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    if !state.is_protected(req.uri().path()) {
        return next.run(req).await;
    }

    let Some(validator) = state.validator.as_ref() else {
        tracing::warn!("Auth provider not configured, route guard disabled");
        return next.run(req).await;
    };

    let Some(token) = session_token(req.headers()) else {
        tracing::debug!(path = %req.uri().path(), "no session token");
        return Redirect::temporary(LOGIN_PATH).into_response();
    };

    match validator.validate(&token).await {
        Ok(principal) => {
            req.extensions_mut().insert(principal);
            next.run(req).await
        }
        Err(err) => {
            tracing::debug!(path = %req.uri().path(), "token rejected: {}", err);
            Redirect::temporary(LOGIN_PATH).into_response()
        }
    }
}
