//! Gateway to the poll table.
//!
//! Reads and writes are whole-record. Vote counting is the only mutation and
//! every implementation applies it as one serialized read-modify-write per
//! poll.

mod memory;
mod postgres;

pub use memory::MemoryPollStore;
pub use postgres::{CREATE_TABLE_SQL, PgPollStore};

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{NewPoll, Poll, PollOption};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("table `polls` not found")]
    TableMissing,

    #[error("{0}")]
    Backend(String),
}

#[async_trait]
pub trait PollStore: Send + Sync {
    /// All polls, newest first.
    async fn list(&self) -> Result<Vec<Poll>, StoreError>;

    async fn get(&self, id: &str) -> Result<Poll, StoreError>;

    async fn insert(&self, poll: NewPoll) -> Result<Poll, StoreError>;

    /// Increments every option listed in `option_ids` and returns how many
    /// options were incremented.
    async fn record_vote(&self, id: &str, option_ids: &[String]) -> Result<usize, StoreError>;

    /// Cheap connectivity check for `/health`.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Each option is counted at most once per ballot; unknown ids are ignored.
pub(crate) fn apply_vote(options: &mut [PollOption], option_ids: &[String]) -> usize {
    let mut matched = 0;
    for option in options.iter_mut() {
        if option_ids.iter().any(|id| *id == option.id) {
            option.votes = option.votes.saturating_add(1);
            matched += 1;
        }
    }
    matched
}
