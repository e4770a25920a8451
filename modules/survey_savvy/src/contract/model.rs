use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Privilege tier of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    Default,
    Admin,
    Surveyor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Admin => "admin",
            Self::Surveyor => "surveyor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            // "user" is what older clients send for a plain account
            "default" | "user" => Ok(Self::Default),
            "admin" => Ok(Self::Admin),
            "surveyor" => Ok(Self::Surveyor),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

/// Decoded bearer token contents.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Identity {
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Data for creating a new account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
}

/// Result of an account creation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountCreation {
    Created(Uuid),
    AlreadyExists,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voter {
    pub voter_email: String,
    pub voter_name: String,
    pub voted: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub text: String,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub reason: String,
    pub reported_by: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Survey {
    pub id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub deadline: Option<String>,
    pub creator_name: Option<String>,
    pub creator_email: Option<String>,
    pub status: String,
    pub feedback: Option<String>,
    pub vote_yes: i64,
    pub vote_no: i64,
    pub likes: i64,
    pub dislikes: i64,
    pub voters: Vec<Voter>,
    pub comments: Vec<Comment>,
    pub reports: Vec<Report>,
    /// Caller-supplied fields without a dedicated column.
    pub attributes: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

/// Data for creating a new survey
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewSurvey {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub deadline: Option<String>,
    pub creator_name: Option<String>,
    pub creator_email: Option<String>,
    pub status: Option<String>,
    pub feedback: Option<String>,
    pub vote_yes: Option<i64>,
    pub vote_no: Option<i64>,
    pub likes: Option<i64>,
    pub dislikes: Option<i64>,
    pub voters: Vec<Voter>,
    pub comments: Vec<Comment>,
    pub reports: Vec<Report>,
    pub attributes: Map<String, Value>,
}

/// Sparse survey update as sent by callers. `None` means "leave untouched".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SurveyPatch {
    pub status: Option<String>,
    pub feedback: Option<String>,
    pub vote_yes: Option<i64>,
    pub vote_no: Option<i64>,
    pub likes: Option<i64>,
    pub dislikes: Option<i64>,
    pub reason: Option<String>,
    pub reported_by: Option<String>,
    pub comment_text: Option<String>,
    pub user_id: Option<String>,
    pub voter_name: Option<String>,
    pub voter_email: Option<String>,
    pub voted: Option<String>,
    pub date: Option<String>,
}

/// Resolved write for one survey: scalar assignments plus list appends.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SurveyUpdate {
    pub status: Option<String>,
    pub feedback: Option<String>,
    pub vote_yes: Option<i64>,
    pub vote_no: Option<i64>,
    pub likes: Option<i64>,
    pub dislikes: Option<i64>,
    pub report: Option<Report>,
    pub comment: Option<Comment>,
    pub voter: Option<Voter>,
}

impl SurveyUpdate {
    pub fn has_appends(&self) -> bool {
        self.report.is_some() || self.comment.is_some() || self.voter.is_some()
    }
}

/// Matched/modified counters of a single-record update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

impl UpdateOutcome {
    pub fn unmatched() -> Self {
        Self::default()
    }

    pub fn matched(modified: bool) -> Self {
        Self {
            matched: 1,
            modified: u64::from(modified),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    pub id: Uuid,
    pub email: Option<String>,
    pub price: Option<f64>,
    pub transaction_id: Option<String>,
    pub date: Option<String>,
    pub survey_id: Option<String>,
    pub attributes: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

/// Data for recording a completed payment
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewPayment {
    pub email: Option<String>,
    pub price: Option<f64>,
    pub transaction_id: Option<String>,
    pub date: Option<String>,
    pub survey_id: Option<String>,
    pub attributes: Map<String, Value>,
}
