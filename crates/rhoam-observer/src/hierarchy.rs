//! Nested observers and approval bubbling.
//!
//! A parent registers a child with [`Observer::register_sub_observer`]. The
//! parent then owns a subscription on the child that forwards each of the
//! child's approvals to the parent's own listeners. Forwarding is not
//! intake: the parent's rules, running flag and registry are not consulted,
//! and the event is passed on unchanged.
//!
//! The hierarchy is kept a tree. A child may be attached to one parent at a
//! time, and a registration that would make an observer its own descendant
//! is rejected, so every approval reaches each ancestor exactly once.
//! Identifiers only need to be unique within one registry, so the cycle
//! check compares nodes by identity, not by id.

use std::sync::{Mutex, PoisonError};

use crate::error::ObserverError;
use crate::events::SubscriptionId;
use crate::observer::Observer;
use crate::registry::Registration;

/// Held for the whole of a sub-observer registration, so a cycle check and
/// the edge it admits are never interleaved with another registration.
/// Never acquired while an observer's state lock is held.
static TOPOLOGY: Mutex<()> = Mutex::new(());

impl Observer {
    /// Registers `child` as a sub-observer. Returns `false` (and logs) on
    /// failure.
    pub fn register_sub_observer(&self, child: &Observer) -> bool {
        match self.try_register_sub_observer(child) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    observer_id = self.id(),
                    child_id = child.id(),
                    "sub-observer registration rejected: {}",
                    e
                );
                false
            }
        }
    }

    /// Registers `child` as a sub-observer and wires its approvals to bubble
    /// into this observer.
    ///
    /// # Errors
    ///
    /// - `MissingAgentId` / `DuplicateAgent` as for leaf agents
    /// - `Cycle` if `child` is this observer or already has it as a
    ///   descendant
    /// - `AlreadyAttached` if `child` bubbles into another parent
    pub fn try_register_sub_observer(&self, child: &Observer) -> Result<(), ObserverError> {
        let _topology = TOPOLOGY.lock().unwrap_or_else(PoisonError::into_inner);

        let child_id = child.id().to_string();
        if child_id.is_empty() {
            return Err(ObserverError::MissingAgentId);
        }
        if self.has_agent(&child_id) {
            return Err(ObserverError::DuplicateAgent(child_id));
        }
        if self.ptr_eq(child) || child_id == self.id() || child.subtree_contains_observer(self) {
            return Err(ObserverError::Cycle {
                parent: self.id().to_string(),
                child: child_id,
            });
        }

        child.attach_to(self.id())?;

        let parent = self.downgrade();
        let subscription = child.subscribe(move |event| {
            if let Some(inner) = parent.upgrade() {
                let parent = Observer::from_inner(inner);
                tracing::debug!(
                    observer_id = parent.id(),
                    origin_observer = event.origin_observer.as_str(),
                    event_id = %event.event_id,
                    "forwarding approved message"
                );
                parent.emit(event);
            }
        });

        let registered = self.state().registry.register(Registration::SubObserver {
            observer: child.clone(),
            subscription,
        });
        if let Err(e) = registered {
            // A leaf agent took the id after the duplicate check.
            child.unsubscribe(subscription);
            child.detach_from_parent();
            return Err(e);
        }

        tracing::info!(
            observer_id = self.id(),
            child_id = child_id.as_str(),
            "sub-observer registered"
        );
        Ok(())
    }

    /// Sub-observers registered directly with this observer.
    pub fn sub_observers(&self) -> Vec<Observer> {
        self.state().registry.sub_observers()
    }

    /// Identifier of the observer this one bubbles into, if any.
    pub fn parent_id(&self) -> Option<String> {
        self.state().parent.clone()
    }

    /// Returns `true` if an observer with `observer_id` sits anywhere below
    /// this one.
    pub fn subtree_contains(&self, observer_id: &str) -> bool {
        self.find_below(|observer| observer.id() == observer_id)
    }

    /// Returns `true` if `target` itself sits anywhere below this one.
    pub fn subtree_contains_observer(&self, target: &Observer) -> bool {
        self.find_below(|observer| observer.ptr_eq(target))
    }

    /// Depth-first search of the subtree. Registration keeps the hierarchy a
    /// tree, so every node is visited once.
    fn find_below<F>(&self, matches: F) -> bool
    where
        F: Fn(&Observer) -> bool,
    {
        let mut pending = self.sub_observers();
        while let Some(observer) = pending.pop() {
            if matches(&observer) {
                return true;
            }
            pending.extend(observer.sub_observers());
        }
        false
    }

    /// Undoes the wiring made by `try_register_sub_observer`.
    pub(crate) fn detach_sub_observer(&self, child: &Observer, subscription: SubscriptionId) {
        child.unsubscribe(subscription);
        child.detach_from_parent();
        tracing::info!(
            observer_id = self.id(),
            child_id = child.id(),
            "sub-observer detached"
        );
    }

    fn attach_to(&self, parent_id: &str) -> Result<(), ObserverError> {
        let mut state = self.state();
        if let Some(existing) = &state.parent {
            return Err(ObserverError::AlreadyAttached {
                child: self.id().to_string(),
                parent: existing.clone(),
            });
        }
        state.parent = Some(parent_id.to_string());
        Ok(())
    }

    pub(crate) fn detach_from_parent(&self) {
        self.state().parent = None;
    }
}
