//! Rule evaluation.
//!
//! Every function here is a pure function of its inputs: the same rule and
//! message always produce the same decision. The only side effect is
//! logging.

use rhoam_types::Message;

use crate::rule::{Rule, RuleKind, UnknownRulePolicy, Verdict};

/// Evaluates a single rule against a message.
///
/// Returns `true` when the rule allows the message.
///
/// - `restriction`: denies when the content is longer than `limit`
///   characters. A restriction without a limit allows everything; a
///   negative limit denies everything.
/// - `censorship`: denies when any non-empty token occurs in the content.
/// - unrecognized: the rule's own `fail_open` override wins, otherwise
///   `policy` decides.
pub fn evaluate(rule: &Rule, message: &Message, policy: UnknownRulePolicy) -> bool {
    match &rule.kind {
        RuleKind::Restriction { limit: Some(limit) } => {
            let length = message.content.chars().count() as f64;
            length <= *limit
        }
        RuleKind::Restriction { limit: None } => true,
        RuleKind::Censorship { tokens } => !tokens
            .iter()
            .filter(|token| !token.is_empty())
            .any(|token| message.content.contains(token.as_str())),
        RuleKind::Unrecognized(kind) => {
            let policy = rule
                .fail_open
                .map(UnknownRulePolicy::from_fail_open)
                .unwrap_or(policy);
            tracing::warn!(
                rule = rule.display_name(),
                kind = kind.as_str(),
                policy = policy.as_str(),
                "unrecognized rule type"
            );
            policy.allows()
        }
    }
}

/// Evaluates `rules` in order and stops at the first denial.
pub fn evaluate_all(rules: &[Rule], message: &Message, policy: UnknownRulePolicy) -> Verdict {
    for rule in rules {
        if !evaluate(rule, message, policy) {
            tracing::debug!(
                rule = rule.display_name(),
                sender_id = message.sender_id.as_str(),
                "rule denied message"
            );
            return Verdict::Deny {
                rule: rule.display_name().to_string(),
            };
        }
    }
    Verdict::Allow
}
