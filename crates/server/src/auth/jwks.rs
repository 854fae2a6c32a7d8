use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use supabase_jwt::{Claims, JwksCache};

use super::{AuthError, TokenValidator};
use crate::models::Principal;

/// Verifies access tokens locally against the project's published signing
/// keys instead of asking the provider on every request.
pub struct JwksValidator {
    jwks_cache: Arc<JwksCache>,
}

impl JwksValidator {
    pub fn new(supabase_url: &str) -> Self {
        let url = format!(
            "{}/auth/v1/.well-known/jwks.json",
            supabase_url.trim_end_matches('/')
        );
        Self {
            jwks_cache: Arc::new(JwksCache::new(&url)),
        }
    }
}

pub(crate) fn is_expired(exp: i64) -> bool {
    Utc::now().timestamp() > exp
}

#[async_trait]
impl TokenValidator for JwksValidator {
    async fn validate(&self, token: &str) -> Result<Principal, AuthError> {
        let claims = Claims::from_token(token, &self.jwks_cache)
            .await
            .map_err(|_| AuthError::InvalidToken)?;

        if is_expired(claims.exp as i64) {
            return Err(AuthError::InvalidToken);
        }
        Ok(Principal::from_subject(claims.sub))
    }
}
