//! Numeric comparisons against literals, joined with `&&`, and equality
//! alternatives joined with `||`.

use serde_json::Value;

use crate::hcl::{BinaryOp, Expression};
use crate::validation::path::{is_reference, resolve};
use crate::validation::syntax::{comparison, conjuncts, constant, contains_call, disjuncts};
use crate::validation::{
    ConditionMatcher, MalformedCondition, MatchOutcome, NumericRange, Path, Rule, ScopedRule,
};

pub struct RangeMatcher;

/// A comparison normalized so that the variable reference is on the left.
struct Comparison<'a> {
    op: BinaryOp,
    reference: &'a Expression,
    value: &'a Expression,
}

fn reference_comparison<'a>(expr: &'a Expression, variable: &str) -> Option<Comparison<'a>> {
    let (op, lhs, rhs) = comparison(expr)?;
    if is_reference(lhs, variable) {
        Some(Comparison {
            op,
            reference: lhs,
            value: rhs,
        })
    } else if is_reference(rhs, variable) {
        Some(Comparison {
            op: op.mirrored(),
            reference: rhs,
            value: lhs,
        })
    } else {
        None
    }
}

fn literal(expr: &Expression) -> Result<Value, MalformedCondition> {
    constant(expr).ok_or_else(|| {
        MalformedCondition::new(format!(
            "comparison must be against a literal value, found `{expr}`"
        ))
    })
}

/// A non-constant operand built from function calls, such as
/// `lower(var.x) == var.x`. Such comparisons are not range idioms.
fn computed(expr: &Expression) -> bool {
    contains_call(expr) && constant(expr).is_none()
}

/// Fold one comparison into `range`. Returns `false` for operators that
/// have no schema equivalent.
fn merge(range: &mut NumericRange, cmp: &Comparison<'_>) -> Result<bool, MalformedCondition> {
    match cmp.op {
        BinaryOp::Eq => match literal(cmp.value)? {
            Value::Number(n) => {
                range.minimum = Some(n.clone());
                range.maximum = Some(n);
            }
            other => range.values = Some(vec![other]),
        },
        BinaryOp::Greater | BinaryOp::GreaterEq | BinaryOp::Less | BinaryOp::LessEq => {
            let Value::Number(n) = literal(cmp.value)? else {
                return Err(MalformedCondition::new(format!(
                    "`{}` requires a numeric literal, found `{}`",
                    cmp.op.symbol(),
                    cmp.value
                )));
            };
            let field = match cmp.op {
                BinaryOp::Greater => &mut range.exclusive_minimum,
                BinaryOp::GreaterEq => &mut range.minimum,
                BinaryOp::Less => &mut range.exclusive_maximum,
                _ => &mut range.maximum,
            };
            *field = Some(n);
        }
        _ => return Ok(false),
    }
    Ok(true)
}

impl RangeMatcher {
    fn match_conjunction(
        &self,
        condition: &Expression,
        variable: &str,
    ) -> Result<MatchOutcome, MalformedCondition> {
        let mut range = NumericRange::default();
        let mut target: Option<Path> = None;
        for conjunct in conjuncts(condition) {
            let Some(cmp) = reference_comparison(conjunct, variable) else {
                return Ok(MatchOutcome::NoMatch);
            };
            if computed(cmp.value) {
                return Ok(MatchOutcome::NoMatch);
            }
            if !merge(&mut range, &cmp)? {
                return Ok(MatchOutcome::NoMatch);
            }
            let path = resolve(cmp.reference, variable).unwrap_or_default();
            match &target {
                None => target = Some(path),
                Some(first) if *first != path => tracing::debug!(
                    condition = %condition,
                    target = %first,
                    ignored = %path,
                    "comparisons reference different paths; all bounds apply to the first"
                ),
                Some(_) => {}
            }
        }
        Ok(MatchOutcome::Matched(ScopedRule {
            rule: Rule::Range(range),
            path: target.unwrap_or_default(),
        }))
    }

    fn match_disjunction(
        &self,
        condition: &Expression,
        variable: &str,
    ) -> Result<MatchOutcome, MalformedCondition> {
        if contains_call(condition) {
            return Ok(MatchOutcome::NoMatch);
        }
        let mut values = Vec::new();
        let mut target: Option<Path> = None;
        for disjunct in disjuncts(condition) {
            let Some(cmp) = reference_comparison(disjunct, variable) else {
                return Ok(MatchOutcome::NoMatch);
            };
            if cmp.op != BinaryOp::Eq {
                tracing::debug!(
                    condition = %condition,
                    "only equality alternatives can be expressed as an enum"
                );
                return Ok(MatchOutcome::NoMatch);
            }
            values.push(literal(cmp.value)?);
            if target.is_none() {
                target = Some(resolve(cmp.reference, variable).unwrap_or_default());
            }
        }
        Ok(MatchOutcome::Matched(ScopedRule {
            rule: Rule::Enum { values },
            path: target.unwrap_or_default(),
        }))
    }
}

impl ConditionMatcher for RangeMatcher {
    fn name(&self) -> &'static str {
        "range"
    }

    fn try_match(
        &self,
        condition: &Expression,
        variable: &str,
        _delegates: &[&dyn ConditionMatcher],
    ) -> Result<MatchOutcome, MalformedCondition> {
        match condition.unparenthesized() {
            Expression::Binary(BinaryOp::Or, _, _) => self.match_disjunction(condition, variable),
            _ => self.match_conjunction(condition, variable),
        }
    }
}
