use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{PollStore, StoreError, apply_vote};
use crate::models::{NewPoll, Poll};

/// Process-local poll table. Used for local development and tests.
#[derive(Debug, Default)]
pub struct MemoryPollStore {
    polls: Mutex<Vec<Poll>>,
}

impl MemoryPollStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Poll>>, StoreError> {
        self.polls
            .lock()
            .map_err(|_| StoreError::Backend("poll table lock poisoned".into()))
    }
}

#[async_trait]
impl PollStore for MemoryPollStore {
    async fn list(&self) -> Result<Vec<Poll>, StoreError> {
        let mut polls = self.lock()?.clone();
        // Newest first; equal timestamps keep reverse insertion order.
        polls.reverse();
        polls.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(polls)
    }

    async fn get(&self, id: &str) -> Result<Poll, StoreError> {
        self.lock()?
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn insert(&self, poll: NewPoll) -> Result<Poll, StoreError> {
        let poll = Poll {
            id: Uuid::new_v4().to_string(),
            question: poll.question,
            description: poll.description,
            options: poll.options,
            author: poll.author,
            created_by: poll.created_by,
            created_at: Utc::now(),
            settings: poll.settings,
        };
        self.lock()?.push(poll.clone());
        Ok(poll)
    }

    async fn record_vote(&self, id: &str, option_ids: &[String]) -> Result<usize, StoreError> {
        let mut polls = self.lock()?;
        let poll = polls
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StoreError::NotFound)?;
        Ok(apply_vote(&mut poll.options, option_ids))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }
}
