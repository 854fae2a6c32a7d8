use crate::error::AppError;
use crate::models::{CreatePollRequest, PollDraft};

pub const MIN_OPTIONS: usize = 2;
const DEFAULT_AUTHOR: &str = "Anonymous";

pub fn validate_draft(req: CreatePollRequest) -> Result<PollDraft, AppError> {
    let question = req.question.trim().to_string();
    if question.is_empty() {
        return Err(AppError::Validation("Please enter a poll question".into()));
    }

    let options: Vec<String> = req
        .options
        .iter()
        .map(|o| o.trim())
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();
    if options.len() < MIN_OPTIONS {
        return Err(AppError::Validation(format!(
            "Please provide at least {} options",
            MIN_OPTIONS
        )));
    }

    let description = req
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    let author = req
        .author
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| DEFAULT_AUTHOR.to_string());

    Ok(PollDraft {
        question,
        description,
        options,
        author,
        settings: req.settings,
    })
}
