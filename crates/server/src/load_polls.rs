use std::env;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use pollboard::{
    models::{CreatePollRequest, PollDraft, PollSettings},
    polls::{new_poll, validate_draft},
    store::{PgPollStore, PollStore},
};

const SEED_AUTHOR: &str = "Seed";

/// One poll per line: `question | option | option ...`. Comment and blank
/// lines yield `None`; everything else goes through the same draft checks as
/// a poll created over the API.
fn parse_line(line: &str) -> Option<anyhow::Result<PollDraft>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let mut parts = line.split('|').map(str::trim);
    let question = parts.next().unwrap_or_default().to_string();
    let request = CreatePollRequest {
        question,
        description: None,
        options: parts.map(String::from).collect(),
        author: Some(SEED_AUTHOR.to_string()),
        settings: PollSettings::default(),
    };
    Some(validate_draft(request).map_err(anyhow::Error::from))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let created_by = env::var("SEED_USER_ID").context("SEED_USER_ID must be set")?;
    let path = env::args().nth(1).unwrap_or_else(|| "polls.txt".to_string());

    let db = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;
    println!("Connected to database!");

    let store = PgPollStore::new(db);
    store.create_table().await?;

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {} - make sure it exists!", path))?;

    let mut count = 0;
    let mut skipped = 0;

    for (lineno, line) in content.lines().enumerate() {
        let draft = match parse_line(line) {
            None => continue,
            Some(Ok(draft)) => draft,
            Some(Err(err)) => {
                println!("⊘ Skipped (line {}): {}", lineno + 1, err);
                skipped += 1;
                continue;
            }
        };
        if store.question_exists(&draft.question).await? {
            println!("⊘ Skipped (duplicate): {}", draft.question);
            skipped += 1;
            continue;
        }

        let poll = store.insert(new_poll(draft, &created_by)).await?;
        count += 1;
        println!("✓ Loaded: {}", poll.question);
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✓ Successfully loaded {} new polls!", count);
    if skipped > 0 {
        println!("⊘ Skipped {} polls", skipped);
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::parse_line;

    #[test]
    fn parses_question_and_options() {
        let draft = parse_line(" Tabs or spaces? | Tabs |  Spaces | ").unwrap().unwrap();
        assert_eq!(draft.question, "Tabs or spaces?");
        assert_eq!(draft.options, vec!["Tabs", "Spaces"]);
        assert_eq!(draft.author, "Seed");
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        assert!(parse_line("   ").is_none());
        assert!(parse_line("# seed file").is_none());
    }

    #[test]
    fn rejects_lines_that_would_break_poll_invariants() {
        let err = parse_line("| a | b").unwrap().unwrap_err();
        assert!(err.to_string().contains("question"));
        let err = parse_line("Lonely? | only").unwrap().unwrap_err();
        assert!(err.to_string().contains("at least 2"));
    }
}
