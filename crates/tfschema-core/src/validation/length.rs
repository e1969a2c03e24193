//! `length(ref) op N`, optionally several joined with `&&`.

use crate::hcl::{BinaryOp, Expression};
use crate::validation::path::{is_reference, resolve};
use crate::validation::syntax::{as_call, comparison, conjuncts, constant};
use crate::validation::{
    ConditionMatcher, MalformedCondition, MatchOutcome, Path, Rule, ScopedRule,
};

pub struct LengthMatcher;

fn integer_bound(expr: &Expression) -> Result<i64, MalformedCondition> {
    let value = constant(expr).ok_or_else(|| {
        MalformedCondition::new(format!(
            "length must be compared against a numeric literal, found `{expr}`"
        ))
    })?;
    value
        .as_i64()
        .or_else(|| {
            value
                .as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() <= i64::MAX as f64)
                .map(|f| f as i64)
        })
        .ok_or_else(|| {
            MalformedCondition::new(format!("length bound `{expr}` is not an integer"))
        })
}

impl ConditionMatcher for LengthMatcher {
    fn name(&self) -> &'static str {
        "length"
    }

    fn try_match(
        &self,
        condition: &Expression,
        variable: &str,
        _delegates: &[&dyn ConditionMatcher],
    ) -> Result<MatchOutcome, MalformedCondition> {
        let mut min = None;
        let mut max = None;
        let mut target: Option<Path> = None;

        for conjunct in conjuncts(condition) {
            let Some((op, lhs, rhs)) = comparison(conjunct) else {
                continue;
            };
            let (op, call, bound) = if let Some(call) = as_call(lhs, "length") {
                (op, call, rhs)
            } else if let Some(call) = as_call(rhs, "length") {
                (op.mirrored(), call, lhs)
            } else {
                continue;
            };

            let [argument] = call.args.as_slice() else {
                return Err(MalformedCondition::new(format!(
                    "`length` takes exactly one argument, found {}",
                    call.args.len()
                )));
            };
            if !is_reference(argument, variable) {
                continue;
            }

            let n = integer_bound(bound)?;
            match op {
                BinaryOp::Greater => min = Some(n.saturating_add(1)),
                BinaryOp::GreaterEq => min = Some(n),
                BinaryOp::Less => max = Some(n.saturating_sub(1)),
                BinaryOp::LessEq => max = Some(n),
                BinaryOp::Eq => {
                    min = Some(n);
                    max = Some(n);
                }
                _ => {
                    return Err(MalformedCondition::new(format!(
                        "`{}` cannot be expressed as a length bound",
                        op.symbol()
                    )))
                }
            }
            if target.is_none() {
                target = Some(resolve(argument, variable).unwrap_or_default());
            }
        }

        if let Some(max) = max.filter(|max| *max < 0) {
            return Err(MalformedCondition::new(format!(
                "length can never be at most {max}"
            )));
        }
        // A negative minimum holds for every value.
        let min = min.map(|min| min.max(0));

        Ok(match target {
            Some(path) => MatchOutcome::Matched(ScopedRule {
                rule: Rule::Length { min, max },
                path,
            }),
            None => MatchOutcome::NoMatch,
        })
    }
}
