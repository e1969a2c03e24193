//! Expression helpers shared by the condition matchers.

use serde_json::Value;

use crate::hcl::{
    evaluate, BinaryOp, Expression, FunctionCall, ObjectKey, TemplatePart, TraversalOp,
};

/// Direct sub-expressions of `expr`, in source order.
pub fn children(expr: &Expression) -> Vec<&Expression> {
    match expr {
        Expression::Null
        | Expression::Bool(_)
        | Expression::Number(_)
        | Expression::String(_)
        | Expression::Variable(_) => Vec::new(),
        Expression::Template(parts) => parts
            .iter()
            .filter_map(|part| match part {
                TemplatePart::Interpolation(inner) => Some(inner),
                TemplatePart::Literal(_) | TemplatePart::Directive => None,
            })
            .collect(),
        Expression::Traversal(traversal) => std::iter::once(&traversal.expr)
            .chain(traversal.operators.iter().filter_map(|op| match op {
                TraversalOp::Index(index) => Some(index),
                _ => None,
            }))
            .collect(),
        Expression::FunctionCall(call) => call.args.iter().collect(),
        Expression::Tuple(items) => items.iter().collect(),
        Expression::Object(items) => items
            .iter()
            .flat_map(|item| {
                let key = match &item.key {
                    ObjectKey::Expression(key) => Some(key),
                    ObjectKey::Identifier(_) => None,
                };
                key.into_iter().chain(std::iter::once(&item.value))
            })
            .collect(),
        Expression::Unary(_, operand) => vec![operand.as_ref()],
        Expression::Binary(_, lhs, rhs) => vec![lhs.as_ref(), rhs.as_ref()],
        Expression::Conditional(c) => vec![&c.condition, &c.then, &c.otherwise],
        Expression::For(for_expr) => std::iter::once(&for_expr.collection)
            .chain(for_expr.key_expr.as_ref())
            .chain(std::iter::once(&for_expr.value_expr))
            .chain(for_expr.condition.as_ref())
            .collect(),
        Expression::Parenthesized(inner) => vec![inner.as_ref()],
    }
}

fn flatten<'a>(expr: &'a Expression, op: BinaryOp, out: &mut Vec<&'a Expression>) {
    match expr.unparenthesized() {
        Expression::Binary(found, lhs, rhs) if *found == op => {
            flatten(lhs, op, out);
            flatten(rhs, op, out);
        }
        other => out.push(other),
    }
}

/// Operands of a chain of `&&`, left to right. A non-`&&` expression is a
/// chain of one.
pub fn conjuncts(expr: &Expression) -> Vec<&Expression> {
    let mut out = Vec::new();
    flatten(expr, BinaryOp::And, &mut out);
    out
}

/// Operands of a chain of `||`, left to right.
pub fn disjuncts(expr: &Expression) -> Vec<&Expression> {
    let mut out = Vec::new();
    flatten(expr, BinaryOp::Or, &mut out);
    out
}

/// `expr` as a call to `name`, looking through parentheses.
pub fn as_call<'a>(expr: &'a Expression, name: &str) -> Option<&'a FunctionCall> {
    match expr.unparenthesized() {
        Expression::FunctionCall(call) if call.name == name => Some(call),
        _ => None,
    }
}

/// `expr` as a comparison `lhs op rhs`, looking through parentheses.
pub fn comparison(expr: &Expression) -> Option<(BinaryOp, &Expression, &Expression)> {
    match expr.unparenthesized() {
        Expression::Binary(op, lhs, rhs) if op.is_comparison() => {
            Some((*op, lhs.as_ref(), rhs.as_ref()))
        }
        _ => None,
    }
}

pub fn contains_call(expr: &Expression) -> bool {
    matches!(expr, Expression::FunctionCall(_))
        || children(expr).into_iter().any(contains_call)
}

/// The literal value of `expr`, if it is a constant.
pub fn constant(expr: &Expression) -> Option<Value> {
    evaluate(expr).ok()
}
