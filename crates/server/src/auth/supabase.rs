use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;

use super::{AuthError, AuthProvider, SignUpOutcome, TokenValidator};
use crate::models::{Principal, Session, User};

/// GoTrue REST client for one Supabase project.
#[derive(Debug, Clone)]
pub struct SupabaseAuth {
    http: Client,
    url: String,
    anon_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(Session),
    User(User),
}

#[derive(Debug, Default, Deserialize)]
struct ProviderErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl ProviderErrorBody {
    fn into_message(self, status: StatusCode) -> String {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
            .unwrap_or_else(|| format!("auth provider returned {}", status))
    }
}

impl SupabaseAuth {
    pub fn new(url: &str, anon_key: &str) -> Self {
        Self {
            http: Client::new(),
            url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.url, path)
    }

    async fn error_from(resp: Response) -> AuthError {
        let status = resp.status();
        let body: ProviderErrorBody = resp.json().await.unwrap_or_default();
        let message = body.into_message(status);
        if status.is_client_error() {
            AuthError::Rejected(message)
        } else {
            AuthError::Unavailable(message)
        }
    }
}

fn unreachable_provider(err: reqwest::Error) -> AuthError {
    AuthError::Unavailable(err.to_string())
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let resp = self
            .http
            .post(self.endpoint("token?grant_type=password"))
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(unreachable_provider)?;

        if !resp.status().is_success() {
            return Err(Self::error_from(resp).await);
        }
        resp.json().await.map_err(unreachable_provider)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<SignUpOutcome, AuthError> {
        let resp = self
            .http
            .post(self.endpoint("signup"))
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password, "data": { "name": name } }))
            .send()
            .await
            .map_err(unreachable_provider)?;

        if !resp.status().is_success() {
            return Err(Self::error_from(resp).await);
        }

        let outcome = match resp.json::<SignUpResponse>().await.map_err(unreachable_provider)? {
            SignUpResponse::Session(session) => SignUpOutcome {
                user: Some(session.user.clone()),
                session: Some(session),
            },
            SignUpResponse::User(user) => SignUpOutcome {
                user: Some(user),
                session: None,
            },
        };
        Ok(outcome)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let resp = self
            .http
            .post(self.endpoint("logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(unreachable_provider)?;

        if !resp.status().is_success() {
            return Err(Self::error_from(resp).await);
        }
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<User, AuthError> {
        let resp = self
            .http
            .get(self.endpoint("user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(unreachable_provider)?;

        match resp.status() {
            s if s.is_success() => resp.json().await.map_err(unreachable_provider),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AuthError::InvalidToken),
            _ => Err(Self::error_from(resp).await),
        }
    }
}

#[async_trait]
impl TokenValidator for SupabaseAuth {
    async fn validate(&self, token: &str) -> Result<Principal, AuthError> {
        let user = self.get_user(token).await?;
        Ok(Principal::from(&user))
    }
}
