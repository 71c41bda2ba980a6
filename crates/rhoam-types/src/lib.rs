//! Shared types for the RHOAM observer hierarchy.
//!
//! An agent submits a transient [`Message`]. Once it clears an observer's
//! rule pipeline the observer emits an [`ApprovedMessage`]. Observers move
//! between the two [`ObserverStatus`] states.
//!
//! The rule engine and the observer both depend on these types and not on
//! each other's internals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of an observer.
///
/// Observers are created stopped and only accept messages while running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ObserverStatus {
    /// Messages are rejected.
    #[default]
    #[serde(rename = "STOPPED")]
    Stopped,
    /// Messages are validated and broadcast.
    #[serde(rename = "RUNNING")]
    Running,
}

impl ObserverStatus {
    /// Returns the canonical string label for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "STOPPED",
            Self::Running => "RUNNING",
        }
    }

    /// Returns `true` if messages are being accepted.
    pub fn is_running(self) -> bool {
        self == Self::Running
    }
}

impl std::fmt::Display for ObserverStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ObserverStatus {
    type Err = ParseObserverStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STOPPED" => Ok(Self::Stopped),
            "RUNNING" => Ok(Self::Running),
            _ => Err(ParseObserverStatusError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown observer status string.
#[derive(Debug, Clone)]
pub struct ParseObserverStatusError(pub String);

impl std::fmt::Display for ParseObserverStatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown observer status: {}", self.0)
    }
}

impl std::error::Error for ParseObserverStatusError {}

/// A message submitted by an agent for moderation.
///
/// Messages are transient: they are built at send time, consumed by one
/// observer's pipeline, and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Identifier of the sending agent.
    pub sender_id: String,
    /// The text body.
    pub content: String,
    /// When the message was constructed.
    pub received_at: DateTime<Utc>,
}

impl Message {
    /// Creates a message stamped with the current time.
    pub fn new(sender_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            sender_id: sender_id.into(),
            content: content.into(),
            received_at: Utc::now(),
        }
    }

    /// Returns the name of the first missing required field, if any.
    ///
    /// A message needs a non-empty sender and non-empty content to enter
    /// the rule pipeline.
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.sender_id.is_empty() {
            Some("sender_id")
        } else if self.content.is_empty() {
            Some("content")
        } else {
            None
        }
    }
}

/// Event emitted when a message passes every rule of an observer.
///
/// The same event, with the same `event_id`, is re-emitted unchanged at
/// every ancestor of the approving observer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovedMessage {
    /// Unique identifier of this approval.
    pub event_id: Uuid,
    /// The observer whose rule pipeline approved the message.
    pub origin_observer: String,
    /// Identifier of the sending agent.
    pub sender_id: String,
    /// The approved text body.
    pub content: String,
    /// When the original message was constructed.
    pub received_at: DateTime<Utc>,
}

impl ApprovedMessage {
    /// Builds the approval event for `message`, approved by `origin_observer`.
    pub fn new(origin_observer: impl Into<String>, message: Message) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            origin_observer: origin_observer.into(),
            sender_id: message.sender_id,
            content: message.content,
            received_at: message.received_at,
        }
    }
}
