use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::api::ApiClient;
use crate::models::CurrentUser;

const DEFAULT_SESSION_FILE: &str = ".pollboard-session.json";

/// Tokens as the server hands them out in its two session cookies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl SessionTokens {
    pub fn cookie_header(&self) -> Option<String> {
        let access = self.access_token.as_ref()?;
        Some(match &self.refresh_token {
            Some(refresh) => format!("sb-auth-token={}; sb-refresh-token={}", access, refresh),
            None => format!("sb-auth-token={}", access),
        })
    }

    pub fn clear(&mut self) {
        self.access_token = None;
        self.refresh_token = None;
    }
}

pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn from_env() -> Self {
        let path = std::env::var("POLLBOARD_SESSION").unwrap_or_else(|_| DEFAULT_SESSION_FILE.to_string());
        Self { path: path.into() }
    }

    pub fn load(&self) -> SessionTokens {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    pub fn save(&self, tokens: &SessionTokens) -> anyhow::Result<()> {
        let raw = serde_json::to_string_pretty(tokens)?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

/// Who is signed in, resolved once at startup and updated by login/logout.
pub struct SessionState {
    pub user: Option<CurrentUser>,
    file: SessionFile,
}

impl SessionState {
    pub async fn init(file: SessionFile, api: &mut ApiClient) -> Self {
        api.tokens = file.load();
        let user = if api.tokens.access_token.is_some() {
            match api.current_session().await {
                Ok(session) => session.user,
                Err(_) => None,
            }
        } else {
            None
        };
        if user.is_none() {
            api.tokens.clear();
        }
        Self { user, file }
    }

    pub async fn signed_in(&mut self, api: &mut ApiClient, tokens: SessionTokens) -> anyhow::Result<()> {
        api.tokens = tokens;
        self.file.save(&api.tokens)?;
        self.user = api.current_session().await?.user;
        Ok(())
    }

    pub fn signed_out(&mut self, api: &mut ApiClient) -> anyhow::Result<()> {
        api.tokens.clear();
        self.user = None;
        self.file.save(&api.tokens)
    }
}
