//! Per-observer registry of agents and sub-observers.

use std::collections::HashMap;

use crate::agent::Agent;
use crate::error::ObserverError;
use crate::events::SubscriptionId;
use crate::observer::Observer;

/// An entry in an observer's registry.
///
/// Leaf agents and sub-observers are registered through different
/// operations, so the hierarchy is declared rather than inferred.
#[derive(Debug, Clone)]
pub enum Registration {
    /// A leaf participant.
    Agent(Agent),
    /// A nested observer whose approvals bubble into the owner of this
    /// registry through `subscription`.
    SubObserver {
        observer: Observer,
        subscription: SubscriptionId,
    },
}

impl Registration {
    /// Registry key: the agent id or the sub-observer's id.
    pub fn id(&self) -> &str {
        match self {
            Self::Agent(agent) => &agent.id,
            Self::SubObserver { observer, .. } => observer.id(),
        }
    }

    /// Display name. Sub-observers are shown by id.
    pub fn name(&self) -> &str {
        match self {
            Self::Agent(agent) => &agent.name,
            Self::SubObserver { observer, .. } => observer.id(),
        }
    }

    /// The nested observer, if this entry is one.
    pub fn as_sub_observer(&self) -> Option<&Observer> {
        match self {
            Self::Agent(_) => None,
            Self::SubObserver { observer, .. } => Some(observer),
        }
    }
}

/// Registered participants keyed by identifier.
#[derive(Debug, Default)]
pub struct AgentRegistry {
    entries: HashMap<String, Registration>,
}

impl AgentRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a registration.
    ///
    /// # Errors
    ///
    /// `MissingAgentId` for an empty identifier, `DuplicateAgent` if the
    /// identifier is taken. The existing entry is left untouched.
    pub fn register(&mut self, registration: Registration) -> Result<(), ObserverError> {
        let id = registration.id().to_string();
        if id.is_empty() {
            return Err(ObserverError::MissingAgentId);
        }
        if self.entries.contains_key(&id) {
            return Err(ObserverError::DuplicateAgent(id));
        }
        self.entries.insert(id, registration);
        Ok(())
    }

    /// Removes and returns a registration.
    ///
    /// # Errors
    ///
    /// `UnknownAgent` if nothing is registered under `agent_id`.
    pub fn unregister(&mut self, agent_id: &str) -> Result<Registration, ObserverError> {
        self.entries
            .remove(agent_id)
            .ok_or_else(|| ObserverError::UnknownAgent(agent_id.to_string()))
    }

    /// Returns `true` if `agent_id` is registered.
    pub fn has(&self, agent_id: &str) -> bool {
        self.entries.contains_key(agent_id)
    }

    /// Looks up a registration without changing the registry.
    pub fn get(&self, agent_id: &str) -> Option<&Registration> {
        self.entries.get(agent_id)
    }

    /// Number of agents and sub-observers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered identifiers in sorted order.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Handles to every registered sub-observer, in no particular order.
    pub fn sub_observers(&self) -> Vec<Observer> {
        self.entries
            .values()
            .filter_map(Registration::as_sub_observer)
            .cloned()
            .collect()
    }

    /// Removes every sub-observer entry, returning each with the
    /// subscription that bubbles it into the owner.
    pub(crate) fn take_sub_observers(&mut self) -> Vec<(Observer, SubscriptionId)> {
        let ids: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, registration)| registration.as_sub_observer().is_some())
            .map(|(id, _)| id.clone())
            .collect();
        ids.into_iter()
            .filter_map(|id| match self.entries.remove(&id) {
                Some(Registration::SubObserver {
                    observer,
                    subscription,
                }) => Some((observer, subscription)),
                _ => None,
            })
            .collect()
    }
}
