use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::{Poll, Principal};

/// Applies the poll settings to a ballot before it reaches the store.
///
/// Returns the option ids that should actually be counted.
pub fn check_ballot(
    poll: &Poll,
    voter: Option<&Principal>,
    now: DateTime<Utc>,
    mut selected: Vec<String>,
) -> Result<Vec<String>, AppError> {
    if poll.settings.has_ended(now) {
        return Err(AppError::PollEnded);
    }
    if poll.settings.require_login && voter.is_none() {
        return Err(AppError::AuthenticationRequired);
    }
    if !poll.settings.allow_multiple {
        selected.truncate(1);
    }
    if selected.is_empty() {
        return Err(AppError::Validation("Please select an option".into()));
    }
    if let Some(unknown) = selected.iter().find(|id| !poll.has_option(id)) {
        return Err(AppError::Validation(format!("Unknown option: {}", unknown)));
    }
    Ok(selected)
}
