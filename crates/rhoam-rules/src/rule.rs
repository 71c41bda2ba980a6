//! Rule records, resolved rules, and ordered rule sets.

use rhoam_types::Message;
use serde::{Deserialize, Serialize};

use crate::engine;

/// A rule exactly as it appears in the configuration source.
///
/// The `type` tag is kept as a free-form string so that records with an
/// unknown tag still load; they resolve to [`RuleKind::Unrecognized`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleRecord {
    /// Human-readable rule name, reported when the rule denies a message.
    #[serde(default)]
    pub name: String,
    /// Variant tag: `restriction`, `censorship`, or anything else.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Variant-specific parameters.
    #[serde(default)]
    pub params: RuleParams,
    /// Per-rule override of the unknown-type policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_open: Option<bool>,
}

/// Parameter payload of a rule record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RuleParams {
    /// Maximum content length in characters (`restriction`). Any JSON
    /// number is accepted; a negative limit denies every message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<f64>,
    /// Forbidden substrings (`censorship`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<Vec<String>>,
}

/// Resolved semantics of a rule.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleKind {
    /// Denies content longer than `limit` characters. Without a limit the
    /// rule allows everything.
    Restriction { limit: Option<f64> },
    /// Denies content containing any of `tokens` as a substring.
    Censorship { tokens: Vec<String> },
    /// A tag this engine does not understand; the unknown-rule policy decides.
    Unrecognized(String),
}

impl RuleKind {
    /// Returns the configuration tag for this kind.
    pub fn label(&self) -> &str {
        match self {
            Self::Restriction { .. } => "restriction",
            Self::Censorship { .. } => "censorship",
            Self::Unrecognized(tag) => tag,
        }
    }
}

/// A named policy check.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub name: String,
    pub kind: RuleKind,
    /// Overrides the rule set's [`UnknownRulePolicy`] for this rule only.
    pub fail_open: Option<bool>,
}

impl Rule {
    /// A length rule allowing at most `limit` characters.
    pub fn restriction(name: impl Into<String>, limit: u32) -> Self {
        Self {
            name: name.into(),
            kind: RuleKind::Restriction {
                limit: Some(f64::from(limit)),
            },
            fail_open: None,
        }
    }

    /// A rule denying content that contains any of `tokens`.
    pub fn censorship<I, S>(name: impl Into<String>, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            kind: RuleKind::Censorship {
                tokens: tokens.into_iter().map(Into::into).collect(),
            },
            fail_open: None,
        }
    }

    /// The name used in logs and denial reports; falls back to the kind tag
    /// for unnamed rules.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.kind.label()
        } else {
            &self.name
        }
    }
}

impl From<RuleRecord> for Rule {
    fn from(record: RuleRecord) -> Self {
        let kind = match record.kind.as_str() {
            "restriction" => RuleKind::Restriction {
                limit: record.params.limit,
            },
            "censorship" => RuleKind::Censorship {
                tokens: record.params.tokens.unwrap_or_default(),
            },
            _ => RuleKind::Unrecognized(record.kind),
        };
        Self {
            name: record.name,
            kind,
            fail_open: record.fail_open,
        }
    }
}

/// What to do with a rule whose type is not recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownRulePolicy {
    /// Allow the message through.
    #[default]
    FailOpen,
    /// Deny the message.
    FailClosed,
}

impl UnknownRulePolicy {
    /// Maps a `fail_open` flag from configuration to a policy.
    pub fn from_fail_open(fail_open: bool) -> Self {
        if fail_open {
            Self::FailOpen
        } else {
            Self::FailClosed
        }
    }

    /// Whether an unrecognized rule lets the message through.
    pub fn allows(self) -> bool {
        self == Self::FailOpen
    }

    /// Label used in log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FailOpen => "fail_open",
            Self::FailClosed => "fail_closed",
        }
    }
}

/// Outcome of running a message through a rule sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    /// The named rule was the first to deny the message.
    Deny { rule: String },
}

impl Verdict {
    /// Returns `true` for [`Verdict::Allow`].
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// An ordered, immutable sequence of rules plus the unknown-rule policy.
///
/// Order is significant: evaluation stops at the first denial.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    rules: Vec<Rule>,
    unknown_policy: UnknownRulePolicy,
}

impl RuleSet {
    /// An ordered rule set using the default fail-open policy.
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            rules,
            unknown_policy: UnknownRulePolicy::default(),
        }
    }

    /// A rule set that allows every message.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Replaces the set-wide unknown-rule policy.
    pub fn with_unknown_policy(mut self, policy: UnknownRulePolicy) -> Self {
        self.unknown_policy = policy;
        self
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Policy applied to unrecognized rules without their own override.
    pub fn unknown_policy(&self) -> UnknownRulePolicy {
        self.unknown_policy
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if the set has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Runs `message` through every rule in declared order.
    pub fn evaluate(&self, message: &Message) -> Verdict {
        engine::evaluate_all(&self.rules, message, self.unknown_policy)
    }
}

impl From<Vec<RuleRecord>> for RuleSet {
    fn from(records: Vec<RuleRecord>) -> Self {
        Self::new(records.into_iter().map(Rule::from).collect())
    }
}
