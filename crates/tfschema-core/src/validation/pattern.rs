//! `can(regex("pattern", ref))` and compound conditions containing it.

use regex::Regex;

use crate::hcl::{Expression, FunctionCall};
use crate::validation::path::{is_reference, resolve};
use crate::validation::{ConditionMatcher, MalformedCondition, MatchOutcome, Rule, ScopedRule};

pub struct PatternMatcher;

/// The first `regex(...)` call reachable through `can`, parentheses and
/// binary operators.
fn find_regex(expr: &Expression) -> Option<&FunctionCall> {
    match expr.unparenthesized() {
        Expression::FunctionCall(call) if call.name == "regex" => Some(call),
        Expression::FunctionCall(call) if call.name == "can" => {
            call.args.first().and_then(find_regex)
        }
        Expression::Binary(_, lhs, rhs) => find_regex(lhs).or_else(|| find_regex(rhs)),
        _ => None,
    }
}

impl ConditionMatcher for PatternMatcher {
    fn name(&self) -> &'static str {
        "regex"
    }

    fn try_match(
        &self,
        condition: &Expression,
        variable: &str,
        _delegates: &[&dyn ConditionMatcher],
    ) -> Result<MatchOutcome, MalformedCondition> {
        let Some(call) = find_regex(condition) else {
            return Ok(MatchOutcome::NoMatch);
        };
        let [pattern, target] = call.args.as_slice() else {
            return Err(MalformedCondition::new(format!(
                "`regex` takes a pattern and a string, found {} arguments",
                call.args.len()
            )));
        };
        if !is_reference(target, variable) {
            return Ok(MatchOutcome::NoMatch);
        }
        let Expression::String(pattern) = pattern.unparenthesized() else {
            return Err(MalformedCondition::new(format!(
                "regex pattern must be a string literal, found `{pattern}`"
            )));
        };
        Regex::new(pattern).map_err(|err| {
            MalformedCondition::new(format!("invalid regex pattern {pattern:?}: {err}"))
        })?;

        Ok(MatchOutcome::Matched(ScopedRule {
            rule: Rule::Regex {
                pattern: pattern.clone(),
            },
            path: resolve(target, variable).unwrap_or_default(),
        }))
    }
}
