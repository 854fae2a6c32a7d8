use axum::{
    Json,
    extract::State,
    http::HeaderMap,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::{Value, json};

use crate::error::AppError;
use crate::models::{
    CurrentSessionResponse, CurrentUserView, SessionResponse, SignInRequest, SignUpRequest,
};
use crate::session::{CurrentUser, session_token, with_session_cookies, without_session_cookies};
use crate::state::AppState;

pub async fn login_page() -> Json<Value> {
    Json(json!({
        "message": "Sign in required. POST {\"email\", \"password\"} to /auth/login or register at /auth/signup."
    }))
}

fn require_credentials(email: &str, password: &str) -> Result<(), AppError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(AppError::Validation("Email and password are required".into()));
    }
    Ok(())
}

pub async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<SignInRequest>,
) -> Result<(CookieJar, Json<SessionResponse>), AppError> {
    let auth = state.auth.as_ref().ok_or(AppError::NotConfigured("auth provider"))?;
    require_credentials(&req.email, &req.password)?;

    let session = auth.sign_in(req.email.trim(), &req.password).await?;
    tracing::info!(user_id = %session.user.id, "signed in");

    let jar = with_session_cookies(jar, &session);
    Ok((
        jar,
        Json(SessionResponse {
            user: Some(session.user.clone()),
            session: Some(session),
        }),
    ))
}

/// Registration may succeed without a session when the provider wants the
/// email confirmed first; cookies are only set when a session was issued.
pub async fn sign_up(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<SignUpRequest>,
) -> Result<(CookieJar, Json<SessionResponse>), AppError> {
    let auth = state.auth.as_ref().ok_or(AppError::NotConfigured("auth provider"))?;
    require_credentials(&req.email, &req.password)?;
    if req.confirm_password.as_ref().is_some_and(|c| *c != req.password) {
        return Err(AppError::Validation("Passwords do not match".into()));
    }

    let name = req.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let outcome = auth.sign_up(req.email.trim(), &req.password, name).await?;
    tracing::info!(
        user_id = ?outcome.user.as_ref().map(|u| &u.id),
        session = outcome.session.is_some(),
        "signed up"
    );

    let jar = match &outcome.session {
        Some(session) => with_session_cookies(jar, session),
        None => jar,
    };
    Ok((
        jar,
        Json(SessionResponse {
            user: outcome.user,
            session: outcome.session,
        }),
    ))
}

/// Clears both session cookies even when the provider call fails.
pub async fn sign_out(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> (CookieJar, Json<Value>) {
    if let (Some(auth), Some(token)) = (state.auth.as_ref(), session_token(&headers)) {
        if let Err(err) = auth.sign_out(&token).await {
            tracing::warn!("Provider sign-out failed: {}", err);
        }
    }
    (without_session_cookies(jar), Json(json!({ "signedOut": true })))
}

pub async fn current_session(CurrentUser(principal): CurrentUser) -> Json<CurrentSessionResponse> {
    Json(CurrentSessionResponse {
        user: principal.map(CurrentUserView::from),
    })
}
