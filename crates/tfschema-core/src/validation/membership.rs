//! `contains([literal, ...], ref)`.

use serde_json::Value;

use crate::hcl::Expression;
use crate::validation::path::{is_reference, resolve};
use crate::validation::syntax::{as_call, constant};
use crate::validation::{ConditionMatcher, MalformedCondition, MatchOutcome, Rule, ScopedRule};

pub struct MembershipMatcher;

impl ConditionMatcher for MembershipMatcher {
    fn name(&self) -> &'static str {
        "contains"
    }

    fn try_match(
        &self,
        condition: &Expression,
        variable: &str,
        _delegates: &[&dyn ConditionMatcher],
    ) -> Result<MatchOutcome, MalformedCondition> {
        let Some(call) = as_call(condition, "contains") else {
            return Ok(MatchOutcome::NoMatch);
        };
        let [list, target] = call.args.as_slice() else {
            return Err(MalformedCondition::new(format!(
                "`contains` takes a list and a value, found {} arguments",
                call.args.len()
            )));
        };
        if !is_reference(target, variable) {
            return Ok(MatchOutcome::NoMatch);
        }

        let Some(Value::Array(values)) = constant(list) else {
            return Err(MalformedCondition::new(format!(
                "allowed values must be a literal list, found `{list}`"
            )));
        };
        if let Some(bad) = values
            .iter()
            .find(|value| !matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_)))
        {
            return Err(MalformedCondition::new(format!(
                "allowed values must be strings, numbers or bools, found {bad}"
            )));
        }

        Ok(MatchOutcome::Matched(ScopedRule {
            rule: Rule::Enum { values },
            path: resolve(target, variable).unwrap_or_default(),
        }))
    }
}
