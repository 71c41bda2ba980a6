//! Observer lifecycle, message intake, and approval emission.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use rhoam_rules::{RuleSet, Verdict};
use rhoam_types::{ApprovedMessage, Message, ObserverStatus};

use crate::agent::Agent;
use crate::error::ObserverError;
use crate::events::{Listeners, SubscriptionId};
use crate::registry::{AgentRegistry, Registration};

/// A supervisory node that validates messages from its registered agents
/// and broadcasts the approved ones.
///
/// `Observer` is a cheap, clonable handle; clones refer to the same node.
/// Each node guards its own state with its own lock, which is never held
/// while listeners run.
#[derive(Clone)]
pub struct Observer {
    inner: Arc<ObserverInner>,
}

pub(crate) struct ObserverInner {
    id: String,
    /// Fixed at construction, so every evaluation sees the same sequence.
    rules: RuleSet,
    state: Mutex<ObserverState>,
}

#[derive(Debug, Default)]
pub(crate) struct ObserverState {
    pub(crate) status: ObserverStatus,
    pub(crate) registry: AgentRegistry,
    pub(crate) listeners: Listeners,
    /// Identifier of the observer this one bubbles into, if any.
    pub(crate) parent: Option<String>,
}

impl Observer {
    /// Creates a stopped observer with a fixed rule set.
    pub fn new(id: impl Into<String>, rules: RuleSet) -> Self {
        let id = id.into();
        tracing::info!(
            observer_id = id.as_str(),
            rules = rules.len(),
            "observer initialized"
        );
        Self {
            inner: Arc::new(ObserverInner {
                id,
                rules,
                state: Mutex::new(ObserverState::default()),
            }),
        }
    }

    /// This observer's identifier.
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// The rule set fixed at construction.
    pub fn rules(&self) -> &RuleSet {
        &self.inner.rules
    }

    /// Current lifecycle state.
    pub fn status(&self) -> ObserverStatus {
        self.state().status
    }

    /// Returns `true` while messages are accepted.
    pub fn is_running(&self) -> bool {
        self.status().is_running()
    }

    /// Returns `true` if both handles refer to the same observer.
    pub fn ptr_eq(&self, other: &Observer) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Starts accepting messages. Starting a running observer is a no-op.
    pub fn start(&self) {
        let mut state = self.state();
        if state.status.is_running() {
            tracing::info!(observer_id = self.id(), "observer is already running");
            return;
        }
        state.status = ObserverStatus::Running;
        tracing::info!(observer_id = self.id(), "observer started");
    }

    /// Stops accepting messages. Stopping a stopped observer is a no-op.
    pub fn stop(&self) {
        let mut state = self.state();
        if !state.status.is_running() {
            tracing::info!(observer_id = self.id(), "observer is already stopped");
            return;
        }
        state.status = ObserverStatus::Stopped;
        tracing::info!(observer_id = self.id(), "observer stopped");
    }

    // ── Registration ─────────────────────────────────────────────────

    /// Registers a leaf agent. Returns `false` (and logs) on failure.
    pub fn register_agent(&self, agent: &Agent) -> bool {
        match self.try_register_agent(agent) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    observer_id = self.id(),
                    agent_id = agent.id.as_str(),
                    "agent registration rejected: {}",
                    e
                );
                false
            }
        }
    }

    /// Registers a leaf agent.
    ///
    /// # Errors
    ///
    /// `MissingAgentId` or `DuplicateAgent`; the registry is unchanged.
    pub fn try_register_agent(&self, agent: &Agent) -> Result<(), ObserverError> {
        self.state()
            .registry
            .register(Registration::Agent(agent.clone()))?;
        tracing::info!(
            observer_id = self.id(),
            agent_id = agent.id.as_str(),
            agent_name = agent.name.as_str(),
            "agent registered"
        );
        Ok(())
    }

    /// Unregisters an agent or sub-observer. Returns `false` (and logs) if
    /// nothing is registered under `agent_id`.
    pub fn unregister_agent(&self, agent_id: &str) -> bool {
        match self.try_unregister_agent(agent_id) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    observer_id = self.id(),
                    agent_id,
                    "agent unregistration rejected: {}",
                    e
                );
                false
            }
        }
    }

    /// Unregisters an agent or sub-observer. A sub-observer's bubbling
    /// subscription is detached as part of the removal.
    ///
    /// # Errors
    ///
    /// `UnknownAgent` if nothing is registered under `agent_id`.
    pub fn try_unregister_agent(&self, agent_id: &str) -> Result<(), ObserverError> {
        let removed = self.state().registry.unregister(agent_id)?;
        if let Registration::SubObserver {
            observer,
            subscription,
        } = removed
        {
            self.detach_sub_observer(&observer, subscription);
        }
        tracing::info!(observer_id = self.id(), agent_id, "agent unregistered");
        Ok(())
    }

    /// Returns `true` if an agent or sub-observer is registered as `agent_id`.
    pub fn has_agent(&self, agent_id: &str) -> bool {
        self.state().registry.has(agent_id)
    }

    /// Returns a copy of the registration for `agent_id`.
    pub fn agent(&self, agent_id: &str) -> Option<Registration> {
        self.state().registry.get(agent_id).cloned()
    }

    /// Registered identifiers in sorted order.
    pub fn agent_ids(&self) -> Vec<String> {
        self.state().registry.ids()
    }

    /// Number of registered agents and sub-observers.
    pub fn agent_count(&self) -> usize {
        self.state().registry.len()
    }

    // ── Message pipeline ─────────────────────────────────────────────

    /// Validates `message` and broadcasts it if every rule allows it.
    ///
    /// Returns `true` iff an approval event was emitted.
    pub fn process_message(&self, message: Message) -> bool {
        self.try_process_message(message).is_ok()
    }

    /// Validates `message` and broadcasts it if every rule allows it.
    ///
    /// The checks run in order: the observer must be running, the message
    /// must carry a sender and content, the sender must be registered, and
    /// every rule must allow the content. Listeners run before this returns.
    ///
    /// # Errors
    ///
    /// The first failed check as an [`ObserverError`]; nothing is emitted.
    pub fn try_process_message(&self, message: Message) -> Result<ApprovedMessage, ObserverError> {
        {
            let state = self.state();
            if !state.status.is_running() {
                tracing::error!(
                    observer_id = self.id(),
                    sender_id = message.sender_id.as_str(),
                    "message received while observer is stopped"
                );
                return Err(ObserverError::NotRunning(self.id().to_string()));
            }
            if let Some(field) = message.missing_field() {
                tracing::warn!(observer_id = self.id(), field, "malformed message");
                return Err(ObserverError::MalformedMessage(field));
            }
            if !state.registry.has(&message.sender_id) {
                tracing::warn!(
                    observer_id = self.id(),
                    sender_id = message.sender_id.as_str(),
                    "message from unregistered sender"
                );
                return Err(ObserverError::UnknownSender(message.sender_id));
            }
        }

        if let Verdict::Deny { rule } = self.inner.rules.evaluate(&message) {
            tracing::warn!(
                observer_id = self.id(),
                sender_id = message.sender_id.as_str(),
                rule = rule.as_str(),
                "message blocked by rule"
            );
            return Err(ObserverError::RuleViolation(rule));
        }

        let event = ApprovedMessage::new(self.id(), message);
        self.emit(&event);
        tracing::info!(
            observer_id = self.id(),
            sender_id = event.sender_id.as_str(),
            event_id = %event.event_id,
            outcome = "approved",
            "message approved"
        );
        Ok(event)
    }

    // ── Events ───────────────────────────────────────────────────────

    /// Adds a listener for approved messages, including those bubbled up
    /// from sub-observers. Listeners run in subscription order.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&ApprovedMessage) + Send + Sync + 'static,
    {
        self.state().listeners.add(Arc::new(listener))
    }

    /// Removes a listener. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&self, subscription: SubscriptionId) -> bool {
        self.state().listeners.remove(subscription)
    }

    /// Number of subscribed listeners, bubbling subscriptions included.
    pub fn listener_count(&self) -> usize {
        self.state().listeners.len()
    }

    /// Runs every listener on `event`, outside the state lock.
    pub(crate) fn emit(&self, event: &ApprovedMessage) {
        let listeners = self.state().listeners.snapshot();
        for listener in listeners {
            listener(event);
        }
    }

    // ── Internals ────────────────────────────────────────────────────

    /// Locks this observer's state. Listeners never run under this lock,
    /// so a poisoned lock still holds consistent data.
    pub(crate) fn state(&self) -> MutexGuard<'_, ObserverState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn downgrade(&self) -> Weak<ObserverInner> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn from_inner(inner: Arc<ObserverInner>) -> Self {
        Self { inner }
    }
}

impl Drop for ObserverInner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        for (child, subscription) in state.registry.take_sub_observers() {
            child.unsubscribe(subscription);
            child.detach_from_parent();
        }
    }
}

impl std::fmt::Debug for Observer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observer")
            .field("id", &self.inner.id)
            .field("rules", &self.inner.rules.len())
            .finish_non_exhaustive()
    }
}
