//! `alltrue([for v in var.x : <predicate>])`: a predicate over every element
//! of a collection.
//!
//! The predicate is handed to the other matchers with the loop variable as
//! the effective variable name, and the resulting path is prefixed with the
//! path of one element of the collection: the collection's path plus a
//! wildcard, or the collection's own path when it already splats.

use crate::hcl::Expression;
use crate::validation::path::{is_reference, resolve, splats};
use crate::validation::syntax::as_call;
use crate::validation::{
    match_first, ConditionMatcher, MalformedCondition, MatchOutcome, PathSegment, ScopedRule,
};

pub struct QuantifierMatcher;

/// The collection being iterated, looking through `values(...)`.
fn collection(expr: &Expression) -> &Expression {
    match as_call(expr, "values") {
        Some(call) if call.args.len() == 1 => &call.args[0],
        _ => expr,
    }
}

impl ConditionMatcher for QuantifierMatcher {
    fn name(&self) -> &'static str {
        "alltrue"
    }

    fn try_match(
        &self,
        condition: &Expression,
        variable: &str,
        delegates: &[&dyn ConditionMatcher],
    ) -> Result<MatchOutcome, MalformedCondition> {
        let Some(call) = as_call(condition, "alltrue") else {
            return Ok(MatchOutcome::NoMatch);
        };
        let [argument] = call.args.as_slice() else {
            return Err(MalformedCondition::new(format!(
                "`alltrue` takes exactly one argument, found {}",
                call.args.len()
            )));
        };
        let Expression::For(for_expr) = argument.unparenthesized() else {
            return Ok(MatchOutcome::NoMatch);
        };
        if for_expr.key_expr.is_some() || for_expr.condition.is_some() {
            return Ok(MatchOutcome::NoMatch);
        }

        let source = collection(&for_expr.collection);
        if !is_reference(source, variable) {
            return Ok(MatchOutcome::NoMatch);
        }
        let Some(collection_path) = resolve(source, variable) else {
            return Ok(MatchOutcome::NoMatch);
        };
        let element = if splats(source) {
            collection_path
        } else {
            collection_path.child(PathSegment::Wildcard)
        };

        match match_first(delegates, &for_expr.value_expr, &for_expr.value_var)? {
            MatchOutcome::Matched(inner) => Ok(MatchOutcome::Matched(ScopedRule {
                rule: inner.rule,
                path: element.join(&inner.path),
            })),
            MatchOutcome::NoMatch => {
                tracing::debug!(
                    predicate = %for_expr.value_expr,
                    "quantified predicate matches no known rule"
                );
                Ok(MatchOutcome::NoMatch)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hcl::{parse_expression, Source};
    use crate::validation::{MatcherRegistry, NumericRange, Path, Rule};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Number};

    fn run(text: &str) -> Result<MatchOutcome, MalformedCondition> {
        let condition = parse_expression(&Source::new("condition.tf", text)).unwrap();
        MatcherRegistry::with_defaults().match_condition(&condition, "value")
    }

    fn scoped(text: &str) -> ScopedRule {
        match run(text).unwrap() {
            MatchOutcome::Matched(scoped) => scoped,
            MatchOutcome::NoMatch => panic!("expected a match for `{text}`"),
        }
    }

    fn name(n: &str) -> PathSegment {
        PathSegment::Name(n.into())
    }

    #[test]
    fn test_predicate_over_list_elements() {
        let scoped = scoped("alltrue([for s in var.value : length(s) <= 8])");
        assert_eq!(
            scoped.rule,
            Rule::Length {
                min: None,
                max: Some(8)
            }
        );
        assert_eq!(scoped.path, Path::new(vec![PathSegment::Wildcard]));
    }

    #[test]
    fn test_nested_collection_and_element_attribute() {
        let scoped = scoped("alltrue([for s in var.value.servers : s.port > 1024])");
        assert_eq!(
            scoped.rule,
            Rule::Range(NumericRange {
                exclusive_minimum: Some(Number::from(1024)),
                ..NumericRange::default()
            })
        );
        assert_eq!(
            scoped.path,
            Path::new(vec![name("servers"), PathSegment::Wildcard, name("port")])
        );
    }

    #[test]
    fn test_splat_collection_is_already_elementwise() {
        let scoped = scoped("alltrue([for s in var.value[*] : length(s) > 1])");
        assert_eq!(scoped.path, Path::new(vec![PathSegment::Wildcard]));

        let scoped = self::scoped("alltrue([for n in var.value[*].name : length(n) > 1])");
        assert_eq!(scoped.path, Path::new(vec![PathSegment::Wildcard, name("name")]));

        let scoped = self::scoped("alltrue([for p in var.value.servers.*.port : p > 0])");
        assert_eq!(
            scoped.path,
            Path::new(vec![name("servers"), PathSegment::Wildcard, name("port")])
        );
    }

    #[test]
    fn test_values_of_a_map() {
        let scoped = scoped(
            r#"alltrue([for k, v in values(var.value) : contains(["a", "b"], v)])"#,
        );
        assert_eq!(
            scoped.rule,
            Rule::Enum {
                values: vec![json!("a"), json!("b")]
            }
        );
        assert_eq!(scoped.path, Path::new(vec![PathSegment::Wildcard]));
    }

    #[test]
    fn test_regex_predicate() {
        let scoped = scoped(r#"alltrue([for t in var.value : can(regex("^[a-z]+$", t))])"#);
        assert_eq!(
            scoped.rule,
            Rule::Regex {
                pattern: "^[a-z]+$".into()
            }
        );
    }

    #[test]
    fn test_declines() {
        assert_eq!(
            run("alltrue([for s in var.value : s != \"\"])").unwrap(),
            MatchOutcome::NoMatch
        );
        assert_eq!(
            run("alltrue([for s in local.items : length(s) > 1])").unwrap(),
            MatchOutcome::NoMatch
        );
        assert_eq!(
            run("alltrue([for s in var.value : length(s) > 1 if s != \"\"])").unwrap(),
            MatchOutcome::NoMatch
        );
        assert_eq!(run("alltrue(var.value)").unwrap(), MatchOutcome::NoMatch);
    }

    #[test]
    fn test_wrong_arity_is_malformed() {
        assert!(run("alltrue([], [])").is_err());
    }

    #[test]
    fn test_does_not_delegate_to_itself() {
        let condition = parse_expression(&Source::new(
            "condition.tf",
            "alltrue([for s in var.value : alltrue([for t in s : length(t) > 0])])",
        ))
        .unwrap();
        let outcome = QuantifierMatcher
            .try_match(&condition, "value", &[])
            .unwrap();
        assert_eq!(outcome, MatchOutcome::NoMatch);
    }
}
