//! Hierarchical message moderation for RHOAM.
//!
//! An [`Observer`] registers [`Agent`]s, runs each of their messages through
//! an ordered [`RuleSet`](rhoam_rules::RuleSet), and broadcasts approved
//! messages to its listeners. Observers nest: a parent that registers a
//! sub-observer receives every approval the sub-observer emits, so a root
//! listener sees every approval in the tree.
//!
//! # Pipeline
//!
//! ```text
//! Agent::speak ──► Observer::process_message
//!                    ├─ running?            ── no ─► NotRunning
//!                    ├─ sender + content?   ── no ─► MalformedMessage
//!                    ├─ sender registered?  ── no ─► UnknownSender
//!                    ├─ rules, in order     ── deny ─► RuleViolation
//!                    └─ emit ApprovedMessage ─► listeners ─► parent ─► ... ─► root
//! ```
//!
//! Everything runs synchronously on the caller's thread: when
//! `process_message` returns, every listener at every ancestor has run.
//!
//! # Usage
//!
//! ```rust
//! use rhoam_observer::{Agent, Observer};
//! use rhoam_rules::{Rule, RuleSet};
//!
//! let root = Observer::new("root", RuleSet::empty());
//! let room = Observer::new("room", RuleSet::new(vec![Rule::restriction("max-length", 10)]));
//! root.register_sub_observer(&room);
//! room.start();
//!
//! root.subscribe(|event| println!("[{}]: {}", event.sender_id, event.content));
//!
//! let user = Agent::new("USER_01", "Human");
//! user.connect(&room);
//! assert!(user.speak(&room, "hi"));
//! assert!(!user.speak(&room, "hello world!"));
//! ```

mod agent;
mod error;
mod events;
mod hierarchy;
mod observer;
mod registry;

pub use agent::Agent;
pub use error::ObserverError;
pub use events::{Listener, SubscriptionId};
pub use observer::Observer;
pub use registry::{AgentRegistry, Registration};
