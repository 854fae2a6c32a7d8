use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use pollboard::{
    AppState, app,
    auth::{AuthProvider, JwksValidator, SupabaseAuth, TokenValidator},
    config::{Config, StoreKind, TokenValidation},
    polls::PollService,
    store::{MemoryPollStore, PgPollStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pollboard=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env();

    let polls = match config.store {
        Some(StoreKind::Postgres) => {
            let database_url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set for the postgres store")?;
            let db = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            tracing::info!("Connected to database");
            PollService::new(Arc::new(PgPollStore::new(db)))
        }
        Some(StoreKind::Memory) => {
            tracing::info!("Using in-memory poll store");
            PollService::new(Arc::new(MemoryPollStore::new()))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, poll operations are disabled");
            PollService::disabled()
        }
    };

    let (auth, validator): (Option<Arc<dyn AuthProvider>>, Option<Arc<dyn TokenValidator>>) =
        match &config.supabase {
            Some(supabase) => {
                let provider = Arc::new(SupabaseAuth::new(&supabase.url, &supabase.anon_key));
                let validator: Arc<dyn TokenValidator> = match config.token_validation {
                    TokenValidation::Jwks => Arc::new(JwksValidator::new(&supabase.url)),
                    TokenValidation::Provider => provider.clone(),
                };
                let provider: Arc<dyn AuthProvider> = provider;
                (Some(provider), Some(validator))
            }
            None => {
                tracing::warn!("SUPABASE_URL or SUPABASE_ANON_KEY not set, auth is disabled");
                (None, None)
            }
        };

    let state = AppState::new(polls, auth, validator, config.protected_prefixes.clone());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server running on http://{}", config.bind_addr);

    axum::serve(listener, app(state)).await?;
    Ok(())
}
