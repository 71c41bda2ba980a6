//! Rule engine for RHOAM observers.
//!
//! A rule is a named policy check applied to every message an observer
//! receives. Rules run in declared order and the first rule that denies a
//! message decides the outcome.
//!
//! # Rule types
//!
//! | Type | Parameters | Denies when |
//! |------|------------|-------------|
//! | `restriction` | `limit` | content is longer than `limit` characters |
//! | `censorship` | `tokens` | content contains any token as a substring |
//! | anything else | none | the unknown-rule policy is `fail_closed` |
//!
//! Unknown rule types fail open by default. The policy can be set for a
//! whole rule file (`"fail_open": false`) or per rule.
//!
//! Rule sets are loaded once from a JSON file. A missing or unreadable file
//! yields an empty rule set via [`load_rule_set_or_empty`].

mod engine;
mod error;
mod loader;
mod rule;

pub use engine::{evaluate, evaluate_all};
pub use error::RuleError;
pub use loader::{load_rule_set, load_rule_set_or_empty, parse_rule_set};
pub use rule::{Rule, RuleKind, RuleParams, RuleRecord, RuleSet, UnknownRulePolicy, Verdict};
