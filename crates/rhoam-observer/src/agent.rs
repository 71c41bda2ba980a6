//! Thin participant wrapper around the observer API.

use rhoam_types::{ApprovedMessage, Message};

use crate::observer::Observer;

/// A named participant that submits messages to observers.
///
/// Agents hold no state beyond their identity; the observer they connect to
/// decides whether anything they say is broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    /// Unique identifier within an observer's registry.
    pub id: String,
    /// Display name.
    pub name: String,
}

impl Agent {
    /// Creates an agent; it is not registered anywhere yet.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Registers this agent with `observer`.
    pub fn connect(&self, observer: &Observer) -> bool {
        observer.register_agent(self)
    }

    /// Unregisters this agent from `observer`.
    pub fn disconnect(&self, observer: &Observer) -> bool {
        observer.unregister_agent(&self.id)
    }

    /// Submits `content` to `observer`. Returns `true` if it was approved.
    pub fn speak(&self, observer: &Observer, content: impl Into<String>) -> bool {
        observer.process_message(Message::new(self.id.clone(), content))
    }

    /// Receives an approved message addressed to the room.
    pub fn listen(&self, message: &ApprovedMessage) {
        tracing::info!(
            agent_id = self.id.as_str(),
            sender_id = message.sender_id.as_str(),
            "agent received message"
        );
    }
}
