//! Poll domain operations.
//!
//! Reads never fail from the caller's point of view: a broken or missing
//! store reads as "no polls". Writes report structured errors.

mod ballot;
mod draft;

pub use ballot::check_ballot;
pub use draft::validate_draft;

use std::sync::Arc;

use crate::error::AppError;
use crate::models::{NewPoll, Poll, PollDraft, PollOption, Principal};
use crate::store::{PollStore, StoreError};

/// Options get ids `"1".."n"` in draft order and start at zero votes.
pub fn new_poll(draft: PollDraft, created_by: &str) -> NewPoll {
    let options = draft
        .options
        .into_iter()
        .enumerate()
        .map(|(idx, text)| PollOption {
            id: (idx + 1).to_string(),
            text,
            votes: 0,
        })
        .collect();

    NewPoll {
        question: draft.question,
        description: draft.description,
        options,
        author: Some(draft.author),
        created_by: created_by.to_string(),
        settings: draft.settings,
    }
}

#[derive(Clone)]
pub struct PollService {
    store: Option<Arc<dyn PollStore>>,
}

fn log_read_error(context: &str, err: &StoreError) {
    tracing::error!("Error fetching {}: {}", context, err);
    if matches!(err, StoreError::TableMissing) {
        tracing::error!("Table `polls` not found. Run the load_polls binary against your database.");
    }
}

impl PollService {
    pub fn new(store: Arc<dyn PollStore>) -> Self {
        Self { store: Some(store) }
    }

    /// Service with no backing store: reads are empty, writes are refused.
    pub fn disabled() -> Self {
        Self { store: None }
    }

    pub fn is_configured(&self) -> bool {
        self.store.is_some()
    }

    pub async fn is_healthy(&self) -> bool {
        match &self.store {
            Some(store) => store.ping().await.is_ok(),
            None => false,
        }
    }

    pub async fn fetch_polls(&self) -> Vec<Poll> {
        let Some(store) = &self.store else {
            return Vec::new();
        };
        match store.list().await {
            Ok(polls) => polls,
            Err(err) => {
                log_read_error("polls", &err);
                Vec::new()
            }
        }
    }

    pub async fn fetch_poll(&self, id: &str) -> Option<Poll> {
        let store = self.store.as_ref()?;
        match store.get(id).await {
            Ok(poll) => Some(poll),
            Err(StoreError::NotFound) => None,
            Err(err) => {
                log_read_error("poll", &err);
                None
            }
        }
    }

    /// Case-insensitive match on question or description. A blank query
    /// matches everything.
    pub async fn search_polls(&self, query: &str) -> Vec<Poll> {
        let needle = query.trim().to_lowercase();
        let polls = self.fetch_polls().await;
        if needle.is_empty() {
            return polls;
        }
        polls
            .into_iter()
            .filter(|p| {
                p.question.to_lowercase().contains(&needle)
                    || p
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
            })
            .collect()
    }

    pub async fn polls_created_by(&self, user_id: &str) -> Vec<Poll> {
        self.fetch_polls()
            .await
            .into_iter()
            .filter(|p| p.created_by == user_id)
            .collect()
    }

    /// The creator is always the session principal, never caller input.
    pub async fn create_poll(
        &self,
        session: Option<&Principal>,
        draft: PollDraft,
    ) -> Result<Poll, AppError> {
        let store = self.store.as_ref().ok_or(AppError::NotConfigured("poll store"))?;
        let principal = session.ok_or(AppError::AuthenticationRequired)?;

        let poll = store
            .insert(new_poll(draft, &principal.id))
            .await
            .inspect_err(|err| tracing::error!("Error creating poll: {}", err))?;

        tracing::info!(poll_id = %poll.id, created_by = %poll.created_by, "poll created");
        Ok(poll)
    }

    /// Does not look at the poll settings; callers run [`check_ballot`] first.
    pub async fn vote_poll(&self, id: &str, option_ids: &[String]) -> Result<usize, AppError> {
        let store = self.store.as_ref().ok_or(AppError::NotConfigured("poll store"))?;
        let matched = store
            .record_vote(id, option_ids)
            .await
            .inspect_err(|err| tracing::error!("Error voting on poll {}: {}", id, err))?;
        tracing::debug!(poll_id = %id, matched, "vote recorded");
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PollSettings;
    use crate::store::MemoryPollStore;

    fn draft(question: &str, options: &[&str]) -> PollDraft {
        PollDraft {
            question: question.into(),
            description: None,
            options: options.iter().map(|o| o.to_string()).collect(),
            author: "Anonymous".into(),
            settings: PollSettings::default(),
        }
    }

    fn principal(id: &str) -> Principal {
        Principal::from_subject(id)
    }

    fn service() -> (PollService, Arc<MemoryPollStore>) {
        let store = Arc::new(MemoryPollStore::new());
        (PollService::new(store.clone()), store)
    }

    #[tokio::test]
    async fn created_poll_has_sequential_zeroed_options() {
        let (polls, _) = service();
        let poll = polls
            .create_poll(Some(&principal("u1")), draft("Lunch?", &["Pizza", "Sushi", "Tacos"]))
            .await
            .unwrap();
        let ids: Vec<&str> = poll.options.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert!(poll.options.iter().all(|o| o.votes == 0));
        assert_eq!(poll.total_votes(), 0);
        assert_eq!(poll.created_by, "u1");
    }

    #[tokio::test]
    async fn create_without_session_fails_and_writes_nothing() {
        let (polls, store) = service();
        let err = polls.create_poll(None, draft("Lunch?", &["A", "B"])).await.unwrap_err();
        assert!(matches!(err, AppError::AuthenticationRequired));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn vote_increments_selected_option_and_total() {
        let (polls, _) = service();
        let poll = polls
            .create_poll(Some(&principal("u1")), draft("A or B?", &["A", "B"]))
            .await
            .unwrap();
        assert_eq!(polls.vote_poll(&poll.id, &["1".to_string()]).await.unwrap(), 1);
        let poll = polls.fetch_poll(&poll.id).await.unwrap();
        assert_eq!(poll.options[0].votes, 1);
        assert_eq!(poll.options[1].votes, 0);
        assert_eq!(poll.total_votes(), 1);
    }

    #[tokio::test]
    async fn unknown_poll_reads_as_none() {
        let (polls, _) = service();
        assert!(polls.fetch_poll("does-not-exist").await.is_none());
        assert!(matches!(
            polls.vote_poll("does-not-exist", &["1".into()]).await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn disabled_service_degrades_to_empty() {
        let polls = PollService::disabled();
        assert!(polls.fetch_polls().await.is_empty());
        assert!(polls.fetch_poll("x").await.is_none());
        assert!(matches!(
            polls.create_poll(Some(&principal("u1")), draft("q", &["a", "b"])).await,
            Err(AppError::NotConfigured(_))
        ));
    }

    #[tokio::test]
    async fn search_and_creator_filters() {
        let (polls, _) = service();
        let ada = principal("ada");
        let bob = principal("bob");
        let mut with_description = draft("Best editor?", &["vim", "emacs"]);
        with_description.description = Some("Settle the LUNCH debate".into());
        polls.create_poll(Some(&ada), with_description).await.unwrap();
        polls.create_poll(Some(&bob), draft("Lunch spot?", &["deli", "cafe"])).await.unwrap();
        polls.create_poll(Some(&bob), draft("Standup time?", &["9", "10"])).await.unwrap();

        assert_eq!(polls.search_polls("lunch").await.len(), 2);
        assert_eq!(polls.search_polls("  ").await.len(), 3);
        assert!(polls.search_polls("weather").await.is_empty());
        assert_eq!(polls.polls_created_by("bob").await.len(), 2);
        assert_eq!(polls.polls_created_by("carol").await.len(), 0);
    }
}
