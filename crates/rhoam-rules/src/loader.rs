//! Loading rule sets from JSON configuration files.
//!
//! Two document shapes are accepted:
//!
//! ```json
//! [{ "name": "max-length", "type": "restriction", "params": { "limit": 280 } }]
//! ```
//!
//! ```json
//! { "fail_open": false, "rules": [{ "name": "profanity", "type": "censorship",
//!   "params": { "tokens": ["badword"] } }] }
//! ```

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::RuleError;
use crate::rule::{RuleRecord, RuleSet, UnknownRulePolicy};

#[derive(Debug, Deserialize)]
struct RuleSetDocument {
    #[serde(default)]
    fail_open: Option<bool>,
    #[serde(default)]
    rules: Vec<RuleRecord>,
}

/// Parses a rule set from a JSON string.
///
/// # Errors
///
/// Returns `RuleError::Parse` for malformed JSON or records, and
/// `RuleError::InvalidDocument` when the top-level value is neither an
/// array nor an object.
pub fn parse_rule_set(json: &str) -> Result<RuleSet, RuleError> {
    let value: Value = serde_json::from_str(json)?;
    match value {
        Value::Array(_) => {
            let records: Vec<RuleRecord> = serde_json::from_value(value)?;
            Ok(RuleSet::from(records))
        }
        Value::Object(_) => {
            let document: RuleSetDocument = serde_json::from_value(value)?;
            let set = RuleSet::from(document.rules);
            Ok(match document.fail_open {
                Some(fail_open) => {
                    set.with_unknown_policy(UnknownRulePolicy::from_fail_open(fail_open))
                }
                None => set,
            })
        }
        other => Err(RuleError::InvalidDocument(format!(
            "expected an array or object, found {}",
            json_kind(&other)
        ))),
    }
}

/// Reads and parses a rule file.
///
/// # Errors
///
/// Returns `RuleError::Read` if the file cannot be read, otherwise any
/// error from [`parse_rule_set`].
pub fn load_rule_set(path: impl AsRef<Path>) -> Result<RuleSet, RuleError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| RuleError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_rule_set(&contents)
}

/// Reads a rule file, degrading to an empty rule set on any failure.
///
/// A missing or corrupt rule source never aborts startup; the failure is
/// logged as a warning and no rules are enforced.
pub fn load_rule_set_or_empty(path: impl AsRef<Path>) -> RuleSet {
    let path = path.as_ref();
    match load_rule_set(path) {
        Ok(set) => {
            tracing::info!(
                path = %path.display(),
                rules = set.len(),
                policy = set.unknown_policy().as_str(),
                "loaded rule set"
            );
            set
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                "could not load rules, continuing with an empty rule set: {}",
                e
            );
            RuleSet::empty()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
