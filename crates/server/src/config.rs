use std::env;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_PROTECTED_PREFIXES: &[&str] = &["/polls", "/polls/create"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenValidation {
    /// One `GET /auth/v1/user` per protected request.
    Provider,
    /// Local signature check against the project's JWKS.
    Jwks,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub supabase: Option<SupabaseConfig>,
    pub database_url: Option<String>,
    pub store: Option<StoreKind>,
    pub token_validation: TokenValidation,
    pub protected_prefixes: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Missing backend settings disable the matching component rather than
    /// failing startup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let supabase_url = get("SUPABASE_URL");
        let anon_key = get("SUPABASE_ANON_KEY").or_else(|| get("SUPABASE_PUBLISHABLE_DEFAULT_KEY"));
        let supabase = match (supabase_url, anon_key) {
            (Some(url), Some(anon_key)) => Some(SupabaseConfig { url, anon_key }),
            _ => None,
        };

        let database_url = get("DATABASE_URL");
        let store = match get("POLL_STORE").map(|s| s.to_lowercase()).as_deref() {
            Some("memory") => Some(StoreKind::Memory),
            Some("postgres") => database_url.as_ref().map(|_| StoreKind::Postgres),
            Some(other) => {
                tracing::warn!("Unknown POLL_STORE value `{}`, ignoring", other);
                database_url.as_ref().map(|_| StoreKind::Postgres)
            }
            None => database_url.as_ref().map(|_| StoreKind::Postgres),
        };

        let token_validation = match get("TOKEN_VALIDATION").map(|s| s.to_lowercase()).as_deref() {
            Some("jwks") => TokenValidation::Jwks,
            _ => TokenValidation::Provider,
        };

        let protected_prefixes = match get("PROTECTED_PREFIXES") {
            Some(raw) => raw
                .split(',')
                .map(|p| p.trim().trim_end_matches('/').to_string())
                .filter(|p| !p.is_empty())
                .collect(),
            None => DEFAULT_PROTECTED_PREFIXES.iter().map(|p| p.to_string()).collect(),
        };

        Config {
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            supabase,
            database_url,
            store,
            token_validation,
            protected_prefixes,
        }
    }
}
