use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub votes: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PollSettings {
    pub allow_multiple: bool,
    pub require_login: bool,
    #[serde(deserialize_with = "lenient_end_date")]
    pub end_date: Option<DateTime<Utc>>,
}

impl PollSettings {
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.end_date.is_some_and(|end| now > end)
    }
}

/// Accepts RFC 3339, the `datetime-local` form shape and bare dates. Naive
/// values are read as UTC. Anything else reads as no end date so a single
/// malformed row cannot break a listing.
fn lenient_end_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let parsed = parse_end_date(&raw);
    if parsed.is_none() {
        tracing::warn!("Ignoring unparseable endDate `{}`", raw);
    }
    Ok(parsed)
}

pub fn parse_end_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
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
}

impl Poll {
    /// Sum of the option counters. There is no separately stored total.
    pub fn total_votes(&self) -> u64 {
        self.options.iter().map(|o| u64::from(o.votes)).sum()
    }

    pub fn has_option(&self, id: &str) -> bool {
        self.options.iter().any(|o| o.id == id)
    }
}

/// A poll ready to be written: ids assigned, counters zeroed, creator known.
#[derive(Debug, Clone)]
pub struct NewPoll {
    pub question: String,
    pub description: Option<String>,
    pub options: Vec<PollOption>,
    pub author: Option<String>,
    pub created_by: String,
    pub settings: PollSettings,
}

/// Validated creation input, before the creator is known.
#[derive(Debug, Clone, PartialEq)]
pub struct PollDraft {
    pub question: String,
    pub description: Option<String>,
    pub options: Vec<String>,
    pub author: String,
    pub settings: PollSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn display_name(&self) -> Option<&str> {
        metadata_name(&self.user_metadata)
    }
}

fn metadata_name(metadata: &serde_json::Value) -> Option<&str> {
    metadata
        .get("name")
        .and_then(|v| v.as_str())
        .filter(|name| !name.trim().is_empty())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: User,
}

/// Identity a valid token resolves to.
///
/// Metadata and creation time are only known when the provider resolved the
/// token; a locally verified JWT carries just the subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
    pub email: Option<String>,
    pub user_metadata: serde_json::Value,
    pub created_at: Option<DateTime<Utc>>,
}

impl Principal {
    pub fn from_subject(id: impl Into<String>) -> Self {
        Principal {
            id: id.into(),
            email: None,
            user_metadata: serde_json::Value::Null,
            created_at: None,
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        metadata_name(&self.user_metadata)
    }
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Principal {
            id: user.id.clone(),
            email: user.email.clone(),
            user_metadata: user.user_metadata.clone(),
            created_at: user.created_at,
        }
    }
}

// ===== Requests =====

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePollRequest {
    pub question: String,
    #[serde(default)]
    pub description: Option<String>,
    pub options: Vec<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub settings: PollSettings,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub option_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub confirm_password: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

// ===== Responses =====

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResponse {
    #[serde(flatten)]
    pub poll: Poll,
    pub total_votes: u64,
}

impl From<Poll> for PollResponse {
    fn from(poll: Poll) -> Self {
        let total_votes = poll.total_votes();
        PollResponse { poll, total_votes }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: Option<User>,
    pub session: Option<Session>,
}

#[derive(Debug, Serialize)]
pub struct CurrentSessionResponse {
    pub user: Option<CurrentUserView>,
}

/// Session projection: identity, metadata and account creation time.
#[derive(Debug, Serialize)]
pub struct CurrentUserView {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub user_metadata: serde_json::Value,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<Principal> for CurrentUserView {
    fn from(principal: Principal) -> Self {
        CurrentUserView {
            name: principal.display_name().map(str::to_string),
            id: principal.id,
            email: principal.email,
            user_metadata: principal.user_metadata,
            created_at: principal.created_at,
        }
    }
}
