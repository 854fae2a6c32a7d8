//! Session propagation between the auth handlers and the route guard.
//!
//! After sign-in/up the access and refresh tokens travel as two cookies; the
//! guard and the [`CurrentUser`] extractor read them back (or a bearer
//! header) on later requests.

use std::convert::Infallible;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::models::{Principal, Session};
use crate::state::AppState;

pub const ACCESS_COOKIE: &str = "sb-auth-token";
pub const REFRESH_COOKIE: &str = "sb-refresh-token";
/// Name used by other Supabase clients; accepted but never written.
pub const ALT_ACCESS_COOKIE: &str = "sb-access-token";

/// Token lookup order: our cookie, the common Supabase cookie, then the
/// `Authorization` header with or without a `Bearer` prefix.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    for name in [ACCESS_COOKIE, ALT_ACCESS_COOKIE] {
        if let Some(cookie) = jar.get(name) {
            if !cookie.value().is_empty() {
                return Some(cookie.value().to_string());
            }
        }
    }

    let header = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = strip_bearer(header).trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

fn strip_bearer(value: &str) -> &str {
    match value.get(..6) {
        Some(scheme) if scheme.eq_ignore_ascii_case("bearer") => {
            let rest = &value[6..];
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                rest.trim_start()
            } else {
                value
            }
        }
        _ => value,
    }
}

fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub fn with_session_cookies(jar: CookieJar, session: &Session) -> CookieJar {
    let jar = jar.add(session_cookie(ACCESS_COOKIE, session.access_token.clone()));
    match &session.refresh_token {
        Some(refresh) => jar.add(session_cookie(REFRESH_COOKIE, refresh.clone())),
        None => jar,
    }
}

/// Expires both session cookies whether or not the request carried them.
pub fn without_session_cookies(jar: CookieJar) -> CookieJar {
    [ACCESS_COOKIE, REFRESH_COOKIE]
        .into_iter()
        .fold(jar, |jar, name| {
            let mut cookie = session_cookie(name, String::new());
            cookie.make_removal();
            jar.add(cookie)
        })
}

/// The principal behind the request, if any.
///
/// Reuses the principal attached by the route guard; on open paths it
/// resolves the token itself.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<Principal>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts.extensions.get::<Principal>() {
            return Ok(CurrentUser(Some(principal.clone())));
        }
        let (Some(validator), Some(token)) = (state.validator.as_ref(), session_token(&parts.headers))
        else {
            return Ok(CurrentUser(None));
        };
        match validator.validate(&token).await {
            Ok(principal) => Ok(CurrentUser(Some(principal))),
            Err(err) => {
                tracing::debug!("Ignoring session token: {}", err);
                Ok(CurrentUser(None))
            }
        }
    }
}
