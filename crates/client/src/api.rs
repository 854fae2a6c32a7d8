use reqwest::{Client, RequestBuilder, Response, StatusCode, header, redirect};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::models::{
    AuthResponse, CreatePollRequest, CurrentSession, ErrorBody, Poll, VoteRequest,
};
use crate::session::SessionTokens;

pub struct ApiClient {
    http: Client,
    base_url: String,
    pub tokens: SessionTokens,
}

impl ApiClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        // The guard answers with a redirect to the login page; surface that
        // as an error instead of following it.
        let http = Client::builder().redirect(redirect::Policy::none()).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens: SessionTokens::default(),
        })
    }

    pub fn poll_url(&self, id: &str) -> String {
        format!("{}/polls/{}", self.base_url, id)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let req = self.http.request(method, format!("{}{}", self.base_url, path));
        match self.tokens.cookie_header() {
            Some(cookie) => req.header(header::COOKIE, cookie),
            None => req,
        }
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> anyhow::Result<T> {
        let status = response.status();
        if status.is_redirection() || status == StatusCode::UNAUTHORIZED {
            anyhow::bail!("Please log in first");
        }
        if !status.is_success() {
            let text = response.text().await?;
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.error)
                .unwrap_or(text);
            anyhow::bail!("API error ({}): {}", status, message);
        }
        Ok(response.json().await?)
    }

    pub async fn current_session(&self) -> anyhow::Result<CurrentSession> {
        let response = self.request(reqwest::Method::GET, "/auth/session").send().await?;
        Self::parse(response).await
    }

    pub async fn list_polls(&self, query: Option<&str>) -> anyhow::Result<Vec<Poll>> {
        let mut req = self.request(reqwest::Method::GET, "/polls");
        if let Some(q) = query {
            req = req.query(&[("q", q)]);
        }
        Self::parse(req.send().await?).await
    }

    pub async fn my_polls(&self) -> anyhow::Result<Vec<Poll>> {
        let response = self.request(reqwest::Method::GET, "/polls/mine").send().await?;
        Self::parse(response).await
    }

    pub async fn get_poll(&self, id: &str) -> anyhow::Result<Poll> {
        let response = self
            .request(reqwest::Method::GET, &format!("/polls/{}", id))
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn vote(&self, id: &str, option_ids: Vec<String>) -> anyhow::Result<Poll> {
        let response = self
            .request(reqwest::Method::POST, &format!("/polls/{}/vote", id))
            .json(&VoteRequest { option_ids })
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn create_poll(&self, poll: &CreatePollRequest) -> anyhow::Result<Poll> {
        let response = self
            .request(reqwest::Method::POST, "/polls")
            .json(poll)
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> anyhow::Result<SessionTokens> {
        let response = self
            .request(reqwest::Method::POST, "/auth/login")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let auth: AuthResponse = Self::parse(response).await?;
        Ok(tokens_from(auth))
    }

    /// `None` when the account still needs its email confirmed.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        confirm_password: &str,
        name: &str,
    ) -> anyhow::Result<Option<SessionTokens>> {
        let response = self
            .request(reqwest::Method::POST, "/auth/signup")
            .json(&json!({
                "email": email,
                "password": password,
                "confirmPassword": confirm_password,
                "name": name
            }))
            .send()
            .await?;
        let auth: AuthResponse = Self::parse(response).await?;
        Ok(auth.session.is_some().then(|| tokens_from(auth)))
    }

    pub async fn sign_out(&self) -> anyhow::Result<()> {
        let response = self.request(reqwest::Method::POST, "/auth/logout").send().await?;
        let _: serde_json::Value = Self::parse(response).await?;
        Ok(())
    }
}

fn tokens_from(auth: AuthResponse) -> SessionTokens {
    match auth.session {
        Some(session) => SessionTokens {
            access_token: Some(session.access_token),
            refresh_token: session.refresh_token,
        },
        None => SessionTokens::default(),
    }
}
