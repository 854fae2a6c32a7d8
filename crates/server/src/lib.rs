//! Pollboard: a polling service layered over Supabase.
//!
//! Authentication is delegated to the Supabase auth provider and polls live
//! in a single `polls` table. This crate adds the route guard, the poll
//! domain rules and the JSON API around them.

pub mod auth;
pub mod config;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod models;
pub mod polls;
pub mod session;
pub mod state;
pub mod store;

#[cfg(test)]
mod testing;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route(
            guard::LOGIN_PATH,
            get(handlers::auth::login_page).post(handlers::auth::sign_in),
        )
        .route("/auth/signup", post(handlers::auth::sign_up))
        .route("/auth/logout", post(handlers::auth::sign_out))
        .route("/auth/session", get(handlers::auth::current_session))
        .route(
            "/polls",
            get(handlers::polls::list_polls).post(handlers::polls::create_poll),
        )
        .route("/polls/mine", get(handlers::polls::my_polls))
        .route("/polls/:id", get(handlers::polls::get_poll))
        .route("/polls/:id/vote", post(handlers::polls::submit_vote))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            guard::require_session,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
