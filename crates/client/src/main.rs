mod api;
mod models;
mod session;

use std::env;
use std::io::{self, Write};

use chrono::Utc;
use colored::*;

use api::ApiClient;
use models::{CreatePollRequest, Poll, PollSettings};
use session::{SessionFile, SessionState};

const DEFAULT_BACKEND_URL: &str = "http://localhost:3000";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let backend_url = env::var("BACKEND_URL").unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string());

    println!("{}", "=".repeat(60).bright_cyan());
    println!("{}", "    🗳️  POLLBOARD 🗳️".bright_yellow().bold());
    println!("{}", "=".repeat(60).bright_cyan());
    println!();

    let mut api = ApiClient::new(&backend_url)?;
    let mut session = SessionState::init(SessionFile::from_env(), &mut api).await;
    match &session.user {
        Some(user) => println!("{} {}", "✅ Signed in as".green(), display_user(user).bold()),
        None => println!("{}", "Not signed in.".bright_black()),
    }

    menu_loop(&mut api, &mut session).await
}

fn display_user(user: &models::CurrentUser) -> String {
    user.display_name().to_string()
}

fn show_profile(session: &SessionState) -> anyhow::Result<()> {
    let Some(user) = &session.user else {
        anyhow::bail!("Please log in first");
    };
    println!("{}", "━".repeat(60).bright_black());
    println!("{}", "MY PROFILE".bright_yellow().bold());
    println!();
    for (label, value) in user.profile_lines() {
        println!("{:>16}  {}", label.bright_black(), value.bright_white());
    }
    Ok(())
}

fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{} ", label.bright_green().bold());
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

// ===== Menu =====

async fn menu_loop(api: &mut ApiClient, session: &mut SessionState) -> anyhow::Result<()> {
    let mut last: Vec<Poll> = Vec::new();
    loop {
        println!();
        println!(
            "{}",
            "[L]ist  [S]earch  [M]ine  [O]pen #  [C]reate  [P]rofile  [I]n  [U]p  [X] out  [Q]uit".bright_black()
        );
        let input = prompt(">")?;
        let mut words = input.splitn(2, ' ');
        let command = words.next().unwrap_or_default().to_lowercase();
        let arg = words.next().map(str::trim).unwrap_or_default().to_string();

        let result = match command.as_str() {
            "l" | "list" => api.list_polls(None).await.map(|polls| last = polls),
            "s" | "search" => {
                let q = if arg.is_empty() { prompt("Search:")? } else { arg };
                api.list_polls(Some(&q)).await.map(|polls| last = polls)
            }
            "m" | "mine" => api.my_polls().await.map(|polls| last = polls),
            "o" | "open" => match pick(&last, &arg) {
                Some(id) => open_poll(api, session, &id).await,
                None => Err(anyhow::anyhow!("List polls first, then open one by number")),
            },
            "c" | "create" => create_poll(api, session).await,
            "p" | "profile" => show_profile(session),
            "i" | "login" => login(api, session).await,
            "u" | "signup" => signup(api, session).await,
            "x" | "logout" => logout(api, session).await,
            "q" | "quit" => {
                println!();
                println!("{}", "Thanks for voting! 👋".bright_cyan().bold());
                return Ok(());
            }
            _ => {
                println!("{}", "Invalid choice. Please try again.".red());
                continue;
            }
        };

        match result {
            Ok(()) if matches!(command.as_str(), "l" | "list" | "s" | "search" | "m" | "mine") => {
                print_list(&last)
            }
            Ok(()) => {}
            Err(e) => eprintln!("{} {}", "❌".red(), e),
        }
    }
}

fn pick(polls: &[Poll], arg: &str) -> Option<String> {
    let n: usize = arg.parse().ok()?;
    polls.get(n.checked_sub(1)?).map(|p| p.id.clone())
}

fn print_list(polls: &[Poll]) {
    if polls.is_empty() {
        println!("{}", "No polls found.".yellow());
        return;
    }
    println!("{}", "━".repeat(60).bright_black());
    for (i, poll) in polls.iter().enumerate() {
        let status = if poll.settings.has_ended(Utc::now()) {
            " (ended)".red().to_string()
        } else {
            String::new()
        };
        println!(
            "{}. {}{} {}",
            (i + 1).to_string().bright_cyan(),
            poll.question.bright_white().bold(),
            status,
            format!("[{} votes]", poll.total_votes).bright_black()
        );
    }
}

fn print_poll(poll: &Poll) {
    println!("{}", "━".repeat(60).bright_black());
    println!("{}", poll.question.bright_white().bold());
    if let Some(description) = &poll.description {
        println!("{}", description);
    }
    println!(
        "{} {}  {} {}",
        "by".bright_black(),
        poll.author.as_deref().unwrap_or("Anonymous"),
        "created".bright_black(),
        poll.created_at.format("%Y-%m-%d")
    );
    if let Some(end) = poll.settings.end_date {
        println!("{} {}", "ends".bright_black(), end.format("%Y-%m-%d %H:%M UTC"));
    }
    println!();
    for option in &poll.options {
        println!(
            "  {}) {:<30} {:>4} ({}%)",
            option.id.bright_cyan(),
            option.text,
            option.votes,
            poll.percent(option)
        );
    }
    println!("{} {}", "Total votes:".bright_black(), poll.total_votes);
}

// ===== Polls =====

async fn open_poll(api: &ApiClient, session: &SessionState, id: &str) -> anyhow::Result<()> {
    let poll = api.get_poll(id).await?;
    print_poll(&poll);

    if poll.settings.has_ended(Utc::now()) {
        println!("{}", "This poll has ended.".yellow());
    } else if poll.settings.require_login && session.user.is_none() {
        println!("{}", "Log in to vote on this poll.".yellow());
    } else {
        let hint = if poll.settings.allow_multiple {
            "Vote (option ids separated by spaces, empty to skip):"
        } else {
            "Vote (option id, empty to skip):"
        };
        let input = prompt(hint)?;
        let mut choices: Vec<String> = input.split_whitespace().map(String::from).collect();
        if !poll.settings.allow_multiple {
            choices.truncate(1);
        }
        if !choices.is_empty() {
            let updated = api.vote(&poll.id, choices).await?;
            println!("{}", "✓ Vote recorded".green());
            print_poll(&updated);
        }
    }

    if prompt("Share on X? [y/N]")?.eq_ignore_ascii_case("y") {
        share(&api.poll_url(&poll.id), &poll.question)?;
    }
    Ok(())
}

fn share_url(poll_url: &str, question: &str) -> anyhow::Result<reqwest::Url> {
    let text = format!("Vote on: {}", question);
    Ok(reqwest::Url::parse_with_params(
        "https://twitter.com/intent/tweet",
        &[("text", text.as_str()), ("url", poll_url)],
    )?)
}

fn share(poll_url: &str, question: &str) -> anyhow::Result<()> {
    let url = share_url(poll_url, question)?;
    if let Err(e) = webbrowser::open(url.as_str()) {
        eprintln!("{} {}", "⚠️  Could not open browser automatically:".yellow(), e);
        println!("{}", url.as_str().bright_blue().underline());
    }
    Ok(())
}

async fn create_poll(api: &ApiClient, session: &SessionState) -> anyhow::Result<()> {
    if session.user.is_none() {
        anyhow::bail!("You must be logged in to create a poll");
    }
    let question = prompt("Question:")?;
    let description = prompt("Description (optional):")?;
    let author = prompt("Your name (optional):")?;

    println!("{}", "Options, one per line, empty line to finish:".bright_black());
    let mut options = Vec::new();
    loop {
        let option = prompt(&format!("  {}.", options.len() + 1))?;
        if option.is_empty() {
            break;
        }
        options.push(option);
    }
    if options.len() < 2 {
        anyhow::bail!("Please provide at least 2 options");
    }

    let allow_multiple = prompt("Allow multiple choices? [y/N]")?.eq_ignore_ascii_case("y");
    let require_login = prompt("Require login to vote? [y/N]")?.eq_ignore_ascii_case("y");
    let end_date = prompt("End date (YYYY-MM-DD, optional):")?;
    let end_date = if end_date.is_empty() {
        None
    } else {
        let date = chrono::NaiveDate::parse_from_str(&end_date, "%Y-%m-%d")?;
        date.and_hms_opt(23, 59, 59).map(|dt| dt.and_utc())
    };

    let poll = api
        .create_poll(&CreatePollRequest {
            question,
            description: Some(description).filter(|d| !d.is_empty()),
            options,
            author: Some(author).filter(|a| !a.is_empty()),
            settings: PollSettings {
                allow_multiple,
                require_login,
                end_date,
            },
        })
        .await?;
    println!("{}", "✓ Poll created".green());
    print_poll(&poll);
    Ok(())
}

// ===== Auth =====

async fn login(api: &mut ApiClient, session: &mut SessionState) -> anyhow::Result<()> {
    let email = prompt("Email:")?;
    let password = prompt("Password:")?;
    let tokens = api.sign_in(&email, &password).await?;
    session.signed_in(api, tokens).await?;
    println!("{}", "✅ Authentication successful!".green().bold());
    Ok(())
}

async fn signup(api: &mut ApiClient, session: &mut SessionState) -> anyhow::Result<()> {
    let name = prompt("Name:")?;
    let email = prompt("Email:")?;
    let password = prompt("Password:")?;
    let confirm = prompt("Confirm password:")?;
    if password != confirm {
        anyhow::bail!("Passwords do not match");
    }
    match api.sign_up(&email, &password, &confirm, &name).await? {
        Some(tokens) => {
            session.signed_in(api, tokens).await?;
            println!("{}", "✅ Account created, you are signed in".green().bold());
        }
        None => println!("{}", "Check your email to confirm your account, then log in.".yellow()),
    }
    Ok(())
}

async fn logout(api: &mut ApiClient, session: &mut SessionState) -> anyhow::Result<()> {
    if let Err(e) = api.sign_out().await {
        eprintln!("{} {}", "⚠️  Server sign-out failed:".yellow(), e);
    }
    session.signed_out(api)?;
    println!("{}", "Signed out.".cyan());
    Ok(())
}
