//! Interactive command-line front end for RHOAM.
//!
//! Loads a TOML configuration, builds a root observer from a JSON rule file,
//! connects one user agent and relays stdin lines through the observer's
//! moderation pipeline.

pub mod chat;
pub mod config;
