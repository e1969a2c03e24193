use crate::hcl::Expression;
use crate::validation::{
    LengthMatcher, MalformedCondition, MatchOutcome, MembershipMatcher, PatternMatcher,
    QuantifierMatcher, RangeMatcher,
};

pub const QUANTIFIER_PRIORITY: i32 = 20;
pub const LENGTH_PRIORITY: i32 = 10;
pub const PATTERN_PRIORITY: i32 = 10;
pub const MEMBERSHIP_PRIORITY: i32 = 0;
pub const RANGE_PRIORITY: i32 = 0;

/// Recognizes one syntactic validation idiom.
pub trait ConditionMatcher: Send + Sync {
    fn name(&self) -> &'static str;

    /// Try to turn `condition` into a rule for `variable`.
    ///
    /// `variable` is the declared variable's name, or the bound element name
    /// when called on the body of a quantifier. `delegates` are the other
    /// registered matchers in priority order, for idioms that wrap a nested
    /// condition.
    fn try_match(
        &self,
        condition: &Expression,
        variable: &str,
        delegates: &[&dyn ConditionMatcher],
    ) -> Result<MatchOutcome, MalformedCondition>;
}

struct Entry {
    priority: i32,
    matcher: Box<dyn ConditionMatcher>,
}

/// Matchers ordered by descending priority. Equal priorities keep
/// registration order.
#[derive(Default)]
pub struct MatcherRegistry {
    entries: Vec<Entry>,
}

impl MatcherRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry
            .register(QUANTIFIER_PRIORITY, QuantifierMatcher)
            .register(LENGTH_PRIORITY, LengthMatcher)
            .register(PATTERN_PRIORITY, PatternMatcher)
            .register(MEMBERSHIP_PRIORITY, MembershipMatcher)
            .register(RANGE_PRIORITY, RangeMatcher);
        registry
    }

    pub fn register(
        &mut self,
        priority: i32,
        matcher: impl ConditionMatcher + 'static,
    ) -> &mut Self {
        let index = self
            .entries
            .partition_point(|entry| entry.priority >= priority);
        self.entries.insert(
            index,
            Entry {
                priority,
                matcher: Box::new(matcher),
            },
        );
        self
    }

    pub fn matchers(&self) -> Vec<&dyn ConditionMatcher> {
        self.entries
            .iter()
            .map(|entry| entry.matcher.as_ref())
            .collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|entry| entry.matcher.name()).collect()
    }

    pub fn match_condition(
        &self,
        condition: &Expression,
        variable: &str,
    ) -> Result<MatchOutcome, MalformedCondition> {
        match_first(&self.matchers(), condition, variable)
    }
}

/// Try `matchers` in order and return the first match. Each matcher receives
/// every other matcher in the list as its delegates.
pub fn match_first(
    matchers: &[&dyn ConditionMatcher],
    condition: &Expression,
    variable: &str,
) -> Result<MatchOutcome, MalformedCondition> {
    for (index, matcher) in matchers.iter().enumerate() {
        let delegates: Vec<&dyn ConditionMatcher> = matchers
            .iter()
            .enumerate()
            .filter(|(other, _)| *other != index)
            .map(|(_, delegate)| *delegate)
            .collect();
        if let MatchOutcome::Matched(scoped) = matcher.try_match(condition, variable, &delegates)? {
            tracing::debug!(
                matcher = matcher.name(),
                path = %scoped.path,
                rule = ?scoped.rule,
                "condition matched"
            );
            return Ok(MatchOutcome::Matched(scoped));
        }
    }
    Ok(MatchOutcome::NoMatch)
}
