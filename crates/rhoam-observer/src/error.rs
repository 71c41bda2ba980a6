//! Error types for observer operations.
//!
//! None of these are fatal to the observer. The boolean entry points log
//! them and return `false`; the `try_*` variants hand them to the caller.

/// Reasons an observer rejects a message or a registration change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObserverError {
    /// A message arrived while the observer was stopped.
    #[error("observer {0} is not running")]
    NotRunning(String),

    /// The message lacks a required field.
    #[error("malformed message: missing {0}")]
    MalformedMessage(&'static str),

    /// The sender is not registered with this observer.
    #[error("sender not registered: {0}")]
    UnknownSender(String),

    /// A rule denied the message.
    #[error("message denied by rule: {0}")]
    RuleViolation(String),

    /// The agent being registered has an empty identifier.
    #[error("agent has no identifier")]
    MissingAgentId,

    /// An agent with this identifier is already registered.
    #[error("agent already registered: {0}")]
    DuplicateAgent(String),

    /// No agent with this identifier is registered.
    #[error("agent not registered: {0}")]
    UnknownAgent(String),

    /// The registration would make an observer its own descendant.
    #[error("registering observer {child} under {parent} would create a cycle")]
    Cycle { parent: String, child: String },

    /// The sub-observer already bubbles into another parent.
    #[error("observer {child} is already attached to {parent}")]
    AlreadyAttached { child: String, parent: String },
}
