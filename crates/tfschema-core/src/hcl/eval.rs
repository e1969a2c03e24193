//! Constant evaluation of expressions that contain no variable references.
//!
//! Defaults, descriptions and literal operands of validation conditions are
//! evaluated here. Anything depending on runtime state (variables, `for`
//! expressions, splats, arbitrary functions) is rejected with
//! `ConvertError::Evaluation`.

use serde_json::{Map, Number, Value};

use crate::error::ConvertError;
use crate::hcl::ast::*;

// Integers beyond this magnitude lose precision as f64.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

fn fail(message: impl Into<String>) -> ConvertError {
    ConvertError::Evaluation {
        message: message.into(),
    }
}

pub fn evaluate(expr: &Expression) -> Result<Value, ConvertError> {
    match expr {
        Expression::Null => Ok(Value::Null),
        Expression::Bool(b) => Ok(Value::Bool(*b)),
        Expression::Number(n) => Ok(Value::Number(n.clone())),
        Expression::String(s) => Ok(Value::String(s.clone())),
        Expression::Template(parts) => evaluate_template(parts),
        Expression::Tuple(items) => items
            .iter()
            .map(evaluate)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Expression::Object(items) => {
            let mut object = Map::new();
            for item in items {
                let key = match &item.key {
                    ObjectKey::Identifier(name) => name.clone(),
                    ObjectKey::Expression(key) => to_string(&evaluate(key)?)
                        .ok_or_else(|| fail(format!("object key `{key}` is not a string")))?,
                };
                object.insert(key, evaluate(&item.value)?);
            }
            Ok(Value::Object(object))
        }
        Expression::Parenthesized(inner) => evaluate(inner),
        Expression::Unary(op, operand) => evaluate_unary(*op, &evaluate(operand)?, expr),
        Expression::Binary(op, lhs, rhs) => evaluate_binary(*op, lhs, rhs),
        Expression::Conditional(c) => match evaluate(&c.condition)? {
            Value::Bool(true) => evaluate(&c.then),
            Value::Bool(false) => evaluate(&c.otherwise),
            other => Err(fail(format!("condition must be a bool, got {other}"))),
        },
        Expression::FunctionCall(call) => evaluate_call(call),
        Expression::Variable(_) | Expression::Traversal(_) => Err(fail(format!(
            "`{expr}` references a variable and is not a constant"
        ))),
        Expression::For(_) => Err(fail(format!(
            "`{expr}` is a for expression and is not a constant"
        ))),
    }
}

fn evaluate_template(parts: &[TemplatePart]) -> Result<Value, ConvertError> {
    // A lone interpolation keeps the type of its value.
    if let [TemplatePart::Interpolation(inner)] = parts {
        return evaluate(inner);
    }
    let mut out = String::new();
    for part in parts {
        match part {
            TemplatePart::Literal(text) => out.push_str(text),
            TemplatePart::Directive => {
                return Err(fail("template directives are not constant"))
            }
            TemplatePart::Interpolation(inner) => {
                let value = evaluate(inner)?;
                let text = to_string(&value).ok_or_else(|| {
                    fail(format!("cannot interpolate `{inner}` of value {value} into a string"))
                })?;
                out.push_str(&text);
            }
        }
    }
    Ok(Value::String(out))
}

/// The string conversion applied to interpolated and `tostring`'d values.
fn to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Build a JSON number, preferring an integer representation when the value
/// is integral and exactly representable.
pub fn number_from_f64(value: f64) -> Option<Number> {
    if value.fract() == 0.0 && value.abs() < MAX_SAFE_INTEGER {
        return Some(Number::from(value as i64));
    }
    Number::from_f64(value)
}

fn as_f64(value: &Value, expr: &Expression) -> Result<f64, ConvertError> {
    value
        .as_f64()
        .ok_or_else(|| fail(format!("`{expr}` must be a number, got {value}")))
}

fn as_bool(value: &Value, expr: &Expression) -> Result<bool, ConvertError> {
    value
        .as_bool()
        .ok_or_else(|| fail(format!("`{expr}` must be a bool, got {value}")))
}

fn evaluate_unary(op: UnaryOp, value: &Value, expr: &Expression) -> Result<Value, ConvertError> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!as_bool(value, expr)?)),
        UnaryOp::Neg => {
            if let Some(i) = value.as_i64() {
                if let Some(negated) = i.checked_neg() {
                    return Ok(Value::Number(Number::from(negated)));
                }
            }
            number_from_f64(-as_f64(value, expr)?)
                .map(Value::Number)
                .ok_or_else(|| fail(format!("`{expr}` is not a finite number")))
        }
    }
}

/// Equality with numeric comparison by value, so that `1 == 1.0`.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

fn evaluate_binary(
    op: BinaryOp,
    lhs: &Expression,
    rhs: &Expression,
) -> Result<Value, ConvertError> {
    // Logical operators short-circuit on a constant left operand.
    match op {
        BinaryOp::And => {
            return Ok(Value::Bool(
                as_bool(&evaluate(lhs)?, lhs)? && as_bool(&evaluate(rhs)?, rhs)?,
            ))
        }
        BinaryOp::Or => {
            return Ok(Value::Bool(
                as_bool(&evaluate(lhs)?, lhs)? || as_bool(&evaluate(rhs)?, rhs)?,
            ))
        }
        _ => {}
    }

    let left = evaluate(lhs)?;
    let right = evaluate(rhs)?;
    match op {
        BinaryOp::Eq => return Ok(Value::Bool(values_equal(&left, &right))),
        BinaryOp::NotEq => return Ok(Value::Bool(!values_equal(&left, &right))),
        _ => {}
    }

    if let (Some(a), Some(b)) = (left.as_i64(), right.as_i64()) {
        let exact = match op {
            BinaryOp::Add => a.checked_add(b),
            BinaryOp::Sub => a.checked_sub(b),
            BinaryOp::Mul => a.checked_mul(b),
            BinaryOp::Mod if b != 0 => a.checked_rem(b),
            _ => None,
        };
        if let Some(result) = exact {
            return Ok(Value::Number(Number::from(result)));
        }
    }

    let a = as_f64(&left, lhs)?;
    let b = as_f64(&right, rhs)?;
    let result = match op {
        BinaryOp::Less => return Ok(Value::Bool(a < b)),
        BinaryOp::LessEq => return Ok(Value::Bool(a <= b)),
        BinaryOp::Greater => return Ok(Value::Bool(a > b)),
        BinaryOp::GreaterEq => return Ok(Value::Bool(a >= b)),
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div | BinaryOp::Mod if b == 0.0 => {
            return Err(fail(format!("`{rhs}` divides by zero")))
        }
        BinaryOp::Div => a / b,
        BinaryOp::Mod => a % b,
        BinaryOp::And | BinaryOp::Or | BinaryOp::Eq | BinaryOp::NotEq => {
            return Err(fail(format!("unexpected operator `{}`", op.symbol())))
        }
    };
    number_from_f64(result)
        .map(Value::Number)
        .ok_or_else(|| fail("arithmetic result is not a finite number"))
}

fn evaluate_call(call: &FunctionCall) -> Result<Value, ConvertError> {
    if call.expand_final {
        return Err(fail(format!(
            "argument expansion in `{}` is not supported",
            call.name
        )));
    }
    let [arg] = call.args.as_slice() else {
        return Err(fail(format!(
            "function `{}` is not supported in constant expressions",
            call.name
        )));
    };
    let value = evaluate(arg)?;
    match (call.name.as_str(), value) {
        ("tolist", value @ Value::Array(_)) => Ok(value),
        ("toset", Value::Array(items)) => {
            let mut unique: Vec<Value> = Vec::with_capacity(items.len());
            for item in items {
                if !unique.iter().any(|seen| values_equal(seen, &item)) {
                    unique.push(item);
                }
            }
            Ok(Value::Array(unique))
        }
        ("tomap", value @ Value::Object(_)) => Ok(value),
        ("tostring", value) => to_string(&value)
            .map(Value::String)
            .ok_or_else(|| fail(format!("cannot convert {value} to string"))),
        ("tonumber", Value::String(text)) => text
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(number_from_f64)
            .map(Value::Number)
            .ok_or_else(|| fail(format!("cannot convert \"{text}\" to number"))),
        ("tonumber", value @ Value::Number(_)) => Ok(value),
        ("tobool", Value::String(text)) => match text.as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(fail(format!("cannot convert \"{text}\" to bool"))),
        },
        ("tobool", value @ Value::Bool(_)) => Ok(value),
        (name @ ("tolist" | "toset" | "tomap" | "tonumber" | "tobool"), value) => {
            Err(fail(format!("invalid argument {value} for `{name}`")))
        }
        (name, _) => Err(fail(format!(
            "function `{name}` is not supported in constant expressions"
        ))),
    }
}
