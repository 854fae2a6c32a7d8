//! Test doubles shared by the handler and guard tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, header},
};
use tower::ServiceExt;

use crate::auth::{AuthError, AuthProvider, SignUpOutcome, TokenValidator};
use crate::models::{Principal, Session, User};
use crate::polls::PollService;
use crate::state::AppState;
use crate::store::MemoryPollStore;

pub const PASSWORD: &str = "correct horse";

/// Auth provider backed by a fixed token table.
#[derive(Default)]
pub struct StaticAuth {
    tokens: Mutex<HashMap<String, User>>,
    pub signed_out: Mutex<Vec<String>>,
    confirm_signups: bool,
}

pub fn user(id: &str) -> User {
    User {
        id: id.to_string(),
        email: Some(format!("{}@example.com", id)),
        user_metadata: serde_json::json!({ "name": id }),
        created_at: Some(Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()),
    }
}

impl StaticAuth {
    pub fn with_token(self, token: &str, user_id: &str) -> Self {
        self.tokens
            .lock()
            .unwrap()
            .insert(token.to_string(), user(user_id));
        self
    }

    /// Sign-ups return a user but no session, as when email confirmation
    /// is switched on.
    pub fn confirming_signups(mut self) -> Self {
        self.confirm_signups = true;
        self
    }

    fn issue(&self, email: &str) -> Session {
        let id = email.split('@').next().unwrap_or(email).to_string();
        let token = format!("access-{}", id);
        let user = user(&id);
        self.tokens.lock().unwrap().insert(token.clone(), user.clone());
        Session {
            access_token: token,
            refresh_token: Some(format!("refresh-{}", id)),
            expires_in: Some(3600),
            user,
        }
    }
}

#[async_trait]
impl AuthProvider for StaticAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        if password != PASSWORD {
            return Err(AuthError::Rejected("Invalid login credentials".into()));
        }
        Ok(self.issue(email))
    }

    async fn sign_up(
        &self,
        email: &str,
        _password: &str,
        _name: Option<&str>,
    ) -> Result<SignUpOutcome, AuthError> {
        let session = self.issue(email);
        if self.confirm_signups {
            return Ok(SignUpOutcome {
                user: Some(session.user),
                session: None,
            });
        }
        Ok(SignUpOutcome {
            user: Some(session.user.clone()),
            session: Some(session),
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        self.tokens.lock().unwrap().remove(access_token);
        self.signed_out.lock().unwrap().push(access_token.to_string());
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<User, AuthError> {
        self.tokens
            .lock()
            .unwrap()
            .get(access_token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}

#[async_trait]
impl TokenValidator for StaticAuth {
    async fn validate(&self, token: &str) -> Result<Principal, AuthError> {
        let user = self.get_user(token).await?;
        Ok(Principal::from(&user))
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryPollStore>,
    pub auth: Arc<StaticAuth>,
}

pub fn test_app(auth: StaticAuth, protected_prefixes: &[&str]) -> TestApp {
    let store = Arc::new(MemoryPollStore::new());
    let auth = Arc::new(auth);
    let state = AppState::new(
        PollService::new(store.clone()),
        Some(auth.clone()),
        Some(auth.clone()),
        protected_prefixes.iter().map(|p| p.to_string()).collect(),
    );
    TestApp {
        router: crate::app(state),
        store,
        auth,
    }
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("sb-auth-token={}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn send(router: &Router, req: Request<Body>) -> Response<Body> {
    router.clone().oneshot(req).await.unwrap()
}

pub async fn body_json(resp: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn set_cookies(resp: &Response<Body>) -> Vec<String> {
    resp.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}
