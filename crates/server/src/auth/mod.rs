//! Authentication adapter over the Supabase auth provider.

mod jwks;
mod supabase;

pub use jwks::JwksValidator;
pub use supabase::SupabaseAuth;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Principal, Session, User};

#[derive(Debug, Error)]
pub enum AuthError {
    /// The provider refused the request, e.g. bad credentials.
    #[error("{0}")]
    Rejected(String),

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("{0}")]
    Unavailable(String),
}

/// Result of a registration. `session` is absent when the provider wants the
/// address confirmed before the first login.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub user: Option<User>,
    pub session: Option<Session>,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<SignUpOutcome, AuthError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;

    async fn get_user(&self, access_token: &str) -> Result<User, AuthError>;
}

/// Resolves a session token to the principal it belongs to.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate(&self, token: &str) -> Result<Principal, AuthError>;
}
