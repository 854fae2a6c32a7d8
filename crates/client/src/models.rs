use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollOption {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub votes: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PollSettings {
    pub allow_multiple: bool,
    pub require_login: bool,
    pub end_date: Option<DateTime<Utc>>,
}

impl PollSettings {
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.end_date.is_some_and(|end| now > end)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub id: String,
    pub question: String,
    pub description: Option<String>,
    pub options: Vec<PollOption>,
    pub author: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub settings: PollSettings,
    #[serde(default)]
    pub total_votes: u64,
}

impl Poll {
    /// Share of the total for one option, in whole percent.
    pub fn percent(&self, option: &PollOption) -> u64 {
        if self.total_votes == 0 {
            0
        } else {
            option.votes * 100 / self.total_votes
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl CurrentUser {
    /// Metadata name, then email, then a generic label.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("User")
    }

    pub fn profile_lines(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Name", self.display_name().to_string()),
            ("Email", self.email.clone().unwrap_or_default()),
            ("User ID", self.id.clone()),
            (
                "Account Created",
                self.created_at
                    .map(|at| at.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "Unknown".to_string()),
            ),
        ]
    }
}

#[derive(Debug, Deserialize)]
pub struct CurrentSession {
    pub user: Option<CurrentUser>,
}

#[derive(Debug, Deserialize)]
pub struct IssuedSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub session: Option<IssuedSession>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePollRequest {
    pub question: String,
    pub description: Option<String>,
    pub options: Vec<String>,
    pub author: Option<String>,
    pub settings: PollSettings,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub option_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
