//! Poll Types
//!
//! Core data types for the poll lifecycle: poll definitions, vote
//! outcomes, aggregated results, and the poll error taxonomy.

use crate::store::StoreError;
use serde::{Deserialize, Serialize};

/// A single voting round with a topic and fixed ordered options.
///
/// The option index within `options` is the stable option identifier
/// used by votes; options are never reordered after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poll {
    /// Poll ID (uuid, generated at creation)
    pub id: String,
    /// Poll topic/question
    pub topic: String,
    /// Ordered option labels; index is the option identifier
    pub options: Vec<String>,
    /// Whether a user may hold votes on multiple options at once
    pub allow_multiple: bool,
    /// Whether the poll has been closed (monotonic false -> true)
    pub is_closed: bool,
    /// User ID of the poll creator
    pub creator_id: String,
    /// Channel the poll was opened in
    pub channel_id: String,
    /// When the poll was created (Unix ms)
    pub created_at: i64,
    /// When the poll is due to close (Unix ms)
    pub closes_at: i64,
    /// Binding to the posted poll message, absent until the initial
    /// post succeeds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<MessageRef>,
}

/// Reference to a posted chat message (channel + platform timestamp/id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    /// Channel the message was posted to
    pub channel: String,
    /// Platform message identifier (Slack `ts`)
    pub ts: String,
}

/// Request to create a new poll.
#[derive(Debug, Clone)]
pub struct CreatePoll {
    /// Channel to post the poll in
    pub channel_id: String,
    /// Poll topic/question
    pub topic: String,
    /// Ordered option labels (at least 2, each non-empty)
    pub options: Vec<String>,
    /// User ID of the creator
    pub creator_id: String,
    /// Allow votes on multiple options at once
    pub allow_multiple: bool,
    /// Minutes until the poll auto-closes
    pub duration_minutes: u64,
}

impl CreatePoll {
    /// Validate the request before anything is persisted.
    pub fn validate(&self) -> Result<(), PollError> {
        if self.topic.trim().is_empty() {
            return Err(PollError::Invalid("poll topic is required".to_string()));
        }
        if self.options.len() < 2 {
            return Err(PollError::Invalid(
                "poll must have at least 2 options".to_string(),
            ));
        }
        if self.options.iter().any(|o| o.trim().is_empty()) {
            return Err(PollError::Invalid(
                "poll options must not be empty".to_string(),
            ));
        }
        if self.duration_minutes == 0 {
            return Err(PollError::Invalid(
                "poll duration must be at least 1 minute".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of a successful cast-vote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastOutcome {
    /// A new vote was inserted
    Recorded,
    /// An existing vote for the same option was toggled off
    Retracted,
}

/// User-facing reply for the chat-command layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteReply {
    /// Whether the vote was accepted (recorded or retracted)
    pub success: bool,
    /// Message to show the voter
    pub message: String,
}

impl VoteReply {
    /// Map an engine cast result into a user-facing reply.
    pub fn from_cast(result: Result<CastOutcome, PollError>) -> Self {
        match result {
            Ok(CastOutcome::Recorded) => Self {
                success: true,
                message: "Your vote has been recorded.".to_string(),
            },
            Ok(CastOutcome::Retracted) => Self {
                success: true,
                message: "Your vote has been retracted.".to_string(),
            },
            Err(PollError::NotFound) => Self {
                success: false,
                message: "This poll could not be found. Please pick a valid poll.".to_string(),
            },
            Err(PollError::Closed) => Self {
                success: false,
                message: "This poll has ended. Votes are no longer accepted; check the poll message for results.".to_string(),
            },
            Err(PollError::InvalidOption(_)) => Self {
                success: false,
                message: "That option does not exist in this poll.".to_string(),
            },
            Err(PollError::Invalid(msg)) => Self {
                success: false,
                message: msg,
            },
            Err(PollError::Store(_)) => Self {
                success: false,
                message: "Something went wrong with your ballot, please try again.".to_string(),
            },
        }
    }
}

/// Tally for a single poll option.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionTally {
    /// Option label
    pub label: String,
    /// Number of votes for this option
    pub count: u64,
    /// Share of the total vote, 0.0 when the poll has no votes
    pub percent: f64,
}

/// Aggregated results for a poll.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollResults {
    /// Poll ID the results belong to
    pub poll_id: String,
    /// Total number of votes across all options
    pub total_votes: u64,
    /// Per-option tallies, in option order
    pub options: Vec<OptionTally>,
}

/// Errors from poll operations.
///
/// Expected user-facing conditions (not-found, closed, invalid option,
/// bad input) are distinct variants; store failures are wrapped and
/// surfaced as a generic failure to the user.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("{0}")]
    Invalid(String),

    #[error("poll not found")]
    NotFound,

    #[error("poll is closed")]
    Closed,

    #[error("option index {0} is out of range")]
    InvalidOption(usize),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Current time as Unix milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
