//! Extraction of structured rules from validation conditions.
//!
//! Each [`ConditionMatcher`] recognizes one idiom (length comparison, regex
//! match, list membership, numeric comparison, universal quantification) and
//! either produces a [`ScopedRule`], declines with [`MatchOutcome::NoMatch`],
//! or rejects a condition that looks like its idiom but is malformed.

mod length;
mod membership;
pub mod path;
mod pattern;
mod quantifier;
mod range;
mod registry;
mod rule;
pub(crate) mod syntax;

pub use length::LengthMatcher;
pub use membership::MembershipMatcher;
pub use path::{resolve, Path, PathSegment};
pub use pattern::PatternMatcher;
pub use quantifier::QuantifierMatcher;
pub use range::RangeMatcher;
pub use registry::{
    match_first, ConditionMatcher, MatcherRegistry, LENGTH_PRIORITY, MEMBERSHIP_PRIORITY,
    PATTERN_PRIORITY, QUANTIFIER_PRIORITY, RANGE_PRIORITY,
};
pub use rule::{NumericRange, Rule};

use thiserror::Error;

/// A rule together with the path of the schema node it constrains.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedRule {
    pub rule: Rule,
    pub path: Path,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Matched(ScopedRule),
    /// The condition is not this matcher's idiom; try the next one.
    NoMatch,
}

/// A condition that has the shape of an idiom but violates its arity or
/// literal-type expectations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct MalformedCondition {
    pub message: String,
}

impl MalformedCondition {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
