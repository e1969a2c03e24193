//! Parsing through `hcl-rs`, lowered onto this crate's syntax tree.
//!
//! The tree handed out by `hcl-rs` chains binary operations without regard
//! for operator precedence, so every unparenthesized chain is flattened
//! and rebuilt here with the precedence of the native syntax.

use ::hcl::expr::{
    BinaryOperator, Expression as HclExpression, HeredocStripMode, ObjectKey as HclObjectKey,
    Operation, TemplateExpr, TraversalOperator, UnaryOperator,
};
use ::hcl::structure::Body as HclBody;
use ::hcl::template::{Element, Template};
use serde_json::Number;

use crate::error::ConvertError;
use crate::hcl::ast::*;
use crate::hcl::source::Source;

// Attribute name used to parse a standalone expression as a one-line body.
const EXPRESSION_KEY: &str = "expression";

/// Parse a whole configuration file into its top-level body.
pub fn parse(source: &Source) -> Result<Body, ConvertError> {
    source.check_nesting()?;
    let body = ::hcl::parse(source.contents()).map_err(|err| source.error(err))?;
    lower_body(source, &body)
}

/// Parse a standalone expression, e.g. `length(var.name) > 3`.
pub fn parse_expression(source: &Source) -> Result<Expression, ConvertError> {
    let wrapped = Source::new(
        source.file(),
        format!("{EXPRESSION_KEY} = {}\n", source.contents().trim_end()),
    );
    let mut body = parse(&wrapped)?;
    if body.attributes.len() != 1 || !body.blocks.is_empty() {
        return Err(source.error("expected a single expression"));
    }
    Ok(body.attributes.remove(0).expr)
}

fn lower_body(source: &Source, body: &HclBody) -> Result<Body, ConvertError> {
    let mut lowered = Body::default();
    for attr in body.attributes() {
        let name = attr.key.to_string();
        if lowered.attribute(&name).is_some() {
            return Err(source.error(format!("attribute `{name}` redefined")));
        }
        lowered.attributes.push(Attribute {
            name,
            expr: lower(source, &attr.expr)?,
        });
    }
    for block in body.blocks() {
        lowered.blocks.push(Block {
            kind: block.identifier.to_string(),
            labels: block
                .labels
                .iter()
                .map(|label| label.as_str().to_string())
                .collect(),
            body: lower_body(source, &block.body)?,
        });
    }
    Ok(lowered)
}

fn lower_all(source: &Source, exprs: &[HclExpression]) -> Result<Vec<Expression>, ConvertError> {
    exprs.iter().map(|expr| lower(source, expr)).collect()
}

fn lower_boxed(source: &Source, expr: &HclExpression) -> Result<Box<Expression>, ConvertError> {
    lower(source, expr).map(Box::new)
}

fn lower(source: &Source, expr: &HclExpression) -> Result<Expression, ConvertError> {
    Ok(match expr {
        HclExpression::Null => Expression::Null,
        HclExpression::Bool(b) => Expression::Bool(*b),
        HclExpression::Number(n) => Expression::Number(lower_number(source, n)?),
        HclExpression::String(s) => Expression::String(s.clone()),
        HclExpression::Array(items) => Expression::Tuple(lower_all(source, items)?),
        HclExpression::Object(object) => {
            let mut items = Vec::with_capacity(object.len());
            for (key, value) in object.iter() {
                items.push(ObjectItem {
                    key: lower_key(source, key)?,
                    value: lower(source, value)?,
                });
            }
            Expression::Object(items)
        }
        HclExpression::TemplateExpr(template) => lower_template(source, template)?,
        HclExpression::Variable(variable) => Expression::Variable(variable.as_str().to_string()),
        HclExpression::Traversal(traversal) => {
            let operators = traversal
                .operators
                .iter()
                .map(|op| -> Result<TraversalOp, ConvertError> {
                    Ok(match op {
                        TraversalOperator::GetAttr(name) => TraversalOp::GetAttr(name.to_string()),
                        TraversalOperator::Index(index) => TraversalOp::Index(lower(source, index)?),
                        TraversalOperator::LegacyIndex(index) => TraversalOp::LegacyIndex(*index),
                        TraversalOperator::AttrSplat | TraversalOperator::FullSplat => {
                            TraversalOp::Splat
                        }
                        #[allow(unreachable_patterns)]
                        other => {
                            return Err(source.error(format!("unsupported traversal {other:?}")))
                        }
                    })
                })
                .collect::<Result<Vec<_>, ConvertError>>()?;
            Expression::Traversal(Box::new(Traversal {
                expr: lower(source, &traversal.expr)?,
                operators,
            }))
        }
        HclExpression::FuncCall(call) => Expression::FunctionCall(Box::new(FunctionCall {
            name: call.name.to_string(),
            args: lower_all(source, &call.args)?,
            expand_final: call.expand_final,
        })),
        HclExpression::Parenthesis(inner) => Expression::Parenthesized(lower_boxed(source, inner)?),
        HclExpression::Conditional(c) => Expression::Conditional(Box::new(Conditional {
            condition: lower(source, &c.cond_expr)?,
            then: lower(source, &c.true_expr)?,
            otherwise: lower(source, &c.false_expr)?,
        })),
        HclExpression::Operation(operation) => match operation.as_ref() {
            Operation::Unary(unary) => {
                let op = match &unary.operator {
                    UnaryOperator::Not => UnaryOp::Not,
                    UnaryOperator::Neg => UnaryOp::Neg,
                    #[allow(unreachable_patterns)]
                    other => return Err(source.error(format!("unsupported operator {other:?}"))),
                };
                Expression::Unary(op, lower_boxed(source, &unary.expr)?)
            }
            _ => {
                let mut operands = Vec::new();
                let mut operators = Vec::new();
                flatten_chain(source, expr, &mut operands, &mut operators)?;
                rebuild_chain(operands, operators)
                    .ok_or_else(|| source.error("empty binary operation"))?
            }
        },
        HclExpression::ForExpr(for_expr) => Expression::For(Box::new(ForExpr {
            key_var: for_expr.key_var.as_ref().map(|name| name.to_string()),
            value_var: for_expr.value_var.to_string(),
            collection: lower(source, &for_expr.collection_expr)?,
            key_expr: for_expr
                .key_expr
                .as_ref()
                .map(|key| lower(source, key))
                .transpose()?,
            value_expr: lower(source, &for_expr.value_expr)?,
            condition: for_expr
                .cond_expr
                .as_ref()
                .map(|cond| lower(source, cond))
                .transpose()?,
            grouping: for_expr.grouping,
        })),
        #[allow(unreachable_patterns)]
        other => return Err(source.error(format!("unsupported expression {other:?}"))),
    })
}

fn lower_number(source: &Source, n: &::hcl::Number) -> Result<Number, ConvertError> {
    if let Some(i) = n.as_i64() {
        return Ok(Number::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Ok(Number::from(u));
    }
    n.as_f64()
        .and_then(Number::from_f64)
        .ok_or_else(|| source.error(format!("number `{n}` is not finite")))
}

fn lower_key(source: &Source, key: &HclObjectKey) -> Result<ObjectKey, ConvertError> {
    Ok(match key {
        HclObjectKey::Identifier(name) => ObjectKey::Identifier(name.to_string()),
        HclObjectKey::Expression(expr) => ObjectKey::Expression(lower(source, expr)?),
        #[allow(unreachable_patterns)]
        other => return Err(source.error(format!("unsupported object key {other:?}"))),
    })
}

/// Quoted templates and heredocs. A template without interpolations or
/// directives becomes a plain string.
fn lower_template(source: &Source, template: &TemplateExpr) -> Result<Expression, ConvertError> {
    let text = match template {
        TemplateExpr::QuotedString(text) => text.clone(),
        TemplateExpr::Heredoc(heredoc) => match &heredoc.strip {
            HeredocStripMode::Indent => dedent(&heredoc.template),
            _ => heredoc.template.clone(),
        },
        #[allow(unreachable_patterns)]
        other => return Err(source.error(format!("unsupported template {other:?}"))),
    };
    let parsed: Template = text.parse().map_err(|err| source.error(err))?;

    let mut parts = Vec::new();
    for element in parsed.elements() {
        match element {
            Element::Literal(literal) => match parts.last_mut() {
                Some(TemplatePart::Literal(previous)) => previous.push_str(literal),
                _ => parts.push(TemplatePart::Literal(literal.clone())),
            },
            Element::Interpolation(interpolation) => {
                parts.push(TemplatePart::Interpolation(lower(source, &interpolation.expr)?))
            }
            _ => parts.push(TemplatePart::Directive),
        }
    }
    Ok(match parts.as_slice() {
        [] => Expression::String(String::new()),
        [TemplatePart::Literal(literal)] => Expression::String(literal.clone()),
        _ => Expression::Template(parts),
    })
}

/// Remove the indentation shared by every non-blank line.
fn dedent(text: &str) -> String {
    let indent = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);
    text.split_inclusive('\n')
        .map(|line| {
            let strip = indent.min(line.len() - line.trim_start().len());
            &line[strip..]
        })
        .collect()
}

fn flatten_chain(
    source: &Source,
    expr: &HclExpression,
    operands: &mut Vec<Expression>,
    operators: &mut Vec<BinaryOp>,
) -> Result<(), ConvertError> {
    match expr {
        HclExpression::Operation(operation) => match operation.as_ref() {
            Operation::Binary(binary) => {
                flatten_chain(source, &binary.lhs_expr, operands, operators)?;
                operators.push(binary_op(source, &binary.operator)?);
                flatten_chain(source, &binary.rhs_expr, operands, operators)
            }
            _ => {
                operands.push(lower(source, expr)?);
                Ok(())
            }
        },
        other => {
            operands.push(lower(source, other)?);
            Ok(())
        }
    }
}

fn binary_op(source: &Source, op: &BinaryOperator) -> Result<BinaryOp, ConvertError> {
    Ok(match op {
        BinaryOperator::Or => BinaryOp::Or,
        BinaryOperator::And => BinaryOp::And,
        BinaryOperator::Eq => BinaryOp::Eq,
        BinaryOperator::NotEq => BinaryOp::NotEq,
        BinaryOperator::Less => BinaryOp::Less,
        BinaryOperator::LessEq => BinaryOp::LessEq,
        BinaryOperator::Greater => BinaryOp::Greater,
        BinaryOperator::GreaterEq => BinaryOp::GreaterEq,
        BinaryOperator::Plus => BinaryOp::Add,
        BinaryOperator::Minus => BinaryOp::Sub,
        BinaryOperator::Mul => BinaryOp::Mul,
        BinaryOperator::Div => BinaryOp::Div,
        BinaryOperator::Mod => BinaryOp::Mod,
        #[allow(unreachable_patterns)]
        other => return Err(source.error(format!("unsupported operator {other:?}"))),
    })
}

/// Tighter-binding operators have higher precedence.
fn precedence(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Or => 0,
        BinaryOp::And => 1,
        BinaryOp::Eq | BinaryOp::NotEq => 2,
        BinaryOp::Less | BinaryOp::LessEq | BinaryOp::Greater | BinaryOp::GreaterEq => 3,
        BinaryOp::Add | BinaryOp::Sub => 4,
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 5,
    }
}

fn reduce(stack: &mut Vec<Expression>, op: BinaryOp) {
    if let (Some(rhs), Some(lhs)) = (stack.pop(), stack.pop()) {
        stack.push(Expression::Binary(op, Box::new(lhs), Box::new(rhs)));
    }
}

/// Rebuild `operands[0] op[0] operands[1] ...` as a left-associative tree.
fn rebuild_chain(operands: Vec<Expression>, operators: Vec<BinaryOp>) -> Option<Expression> {
    let mut operands = operands.into_iter();
    let mut stack = vec![operands.next()?];
    let mut pending: Vec<BinaryOp> = Vec::new();

    for (op, rhs) in operators.into_iter().zip(operands) {
        while let Some(&top) = pending.last() {
            if precedence(top) < precedence(op) {
                break;
            }
            pending.pop();
            reduce(&mut stack, top);
        }
        pending.push(op);
        stack.push(rhs);
    }
    while let Some(op) = pending.pop() {
        reduce(&mut stack, op);
    }
    stack.pop()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hcl::evaluate;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn expr(text: &str) -> Expression {
        parse_expression(&Source::new("expr.tf", text)).unwrap()
    }

    fn body(text: &str) -> Body {
        parse(&Source::new("main.tf", text)).unwrap()
    }

    fn var(name: &str) -> Expression {
        Expression::Variable(name.into())
    }

    fn attr(root: &str, name: &str) -> Expression {
        Expression::Traversal(Box::new(Traversal {
            expr: var(root),
            operators: vec![TraversalOp::GetAttr(name.into())],
        }))
    }

    fn num(n: i64) -> Expression {
        Expression::Number(Number::from(n))
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            expr("a || b && c == 1 + 2 * 3"),
            Expression::Binary(
                BinaryOp::Or,
                Box::new(var("a")),
                Box::new(Expression::Binary(
                    BinaryOp::And,
                    Box::new(var("b")),
                    Box::new(Expression::Binary(
                        BinaryOp::Eq,
                        Box::new(var("c")),
                        Box::new(Expression::Binary(
                            BinaryOp::Add,
                            Box::new(num(1)),
                            Box::new(Expression::Binary(
                                BinaryOp::Mul,
                                Box::new(num(2)),
                                Box::new(num(3)),
                            )),
                        )),
                    )),
                )),
            )
        );
    }

    #[test]
    fn test_left_associative_subtraction() {
        assert_eq!(
            expr("a - b - c"),
            Expression::Binary(
                BinaryOp::Sub,
                Box::new(Expression::Binary(
                    BinaryOp::Sub,
                    Box::new(var("a")),
                    Box::new(var("b")),
                )),
                Box::new(var("c")),
            )
        );
    }

    #[test]
    fn test_rebuild_chain_orders_by_precedence() {
        let rebuilt = rebuild_chain(
            vec![num(1), num(2), num(3), num(4)],
            vec![BinaryOp::Mul, BinaryOp::Add, BinaryOp::Less],
        )
        .unwrap();
        assert_eq!(rebuilt.to_string(), "1 * 2 + 3 < 4");
        let Expression::Binary(BinaryOp::Less, lhs, _) = rebuilt else {
            panic!("expected `<` at the root");
        };
        assert!(matches!(*lhs, Expression::Binary(BinaryOp::Add, _, _)));
    }

    #[test]
    fn test_parentheses_are_kept() {
        assert_eq!(evaluate(&expr("2 * (3 + 4) - 1")).unwrap(), json!(13));
        assert!(matches!(
            expr("(a || b) && c"),
            Expression::Binary(BinaryOp::And, ref lhs, _)
                if matches!(**lhs, Expression::Parenthesized(_))
        ));
    }

    #[test]
    fn test_traversal_operators() {
        let Expression::Traversal(traversal) = expr(r#"var.items[0].tags["env"][*].name"#) else {
            panic!("expected traversal");
        };
        assert_eq!(traversal.expr, var("var"));
        assert_eq!(
            traversal.operators,
            vec![
                TraversalOp::GetAttr("items".into()),
                TraversalOp::Index(num(0)),
                TraversalOp::GetAttr("tags".into()),
                TraversalOp::Index(Expression::String("env".into())),
                TraversalOp::Splat,
                TraversalOp::GetAttr("name".into()),
            ]
        );
    }

    #[test]
    fn test_function_call_with_nested_regex() {
        assert_eq!(
            expr(r#"can(regex("^[a-z]+$", var.name))"#),
            Expression::FunctionCall(Box::new(FunctionCall {
                name: "can".into(),
                args: vec![Expression::FunctionCall(Box::new(FunctionCall {
                    name: "regex".into(),
                    args: vec![Expression::String("^[a-z]+$".into()), attr("var", "name")],
                    expand_final: false,
                }))],
                expand_final: false,
            }))
        );
    }

    #[test]
    fn test_multiline_tuple_and_object() {
        assert_eq!(
            expr("[\n  1,\n  2,\n]"),
            Expression::Tuple(vec![num(1), num(2)])
        );
        assert_eq!(
            evaluate(&expr("{\n  a = 1\n  \"b\" = 2\n}")).unwrap(),
            json!({"a": 1, "b": 2})
        );
    }

    #[test]
    fn test_for_expression() {
        let Expression::FunctionCall(call) =
            expr(r#"alltrue([for k, v in var.tags : length(v) < 5 if k != "x"])"#)
        else {
            panic!("expected call");
        };
        let Expression::For(for_expr) = &call.args[0] else {
            panic!("expected for expression");
        };
        assert_eq!(for_expr.key_var.as_deref(), Some("k"));
        assert_eq!(for_expr.value_var, "v");
        assert_eq!(for_expr.collection, attr("var", "tags"));
        assert!(for_expr.key_expr.is_none());
        assert!(for_expr.condition.is_some());
    }

    #[test]
    fn test_object_for_with_grouping() {
        let Expression::For(for_expr) = expr("{for s in var.list : s.key => s.value...}") else {
            panic!("expected for expression");
        };
        assert!(for_expr.grouping);
        assert_eq!(for_expr.key_expr, Some(attr("s", "key")));
    }

    #[test]
    fn test_template_interpolation() {
        assert_eq!(
            expr(r#""prefix-${var.env}""#),
            Expression::Template(vec![
                TemplatePart::Literal("prefix-".into()),
                TemplatePart::Interpolation(attr("var", "env")),
            ])
        );
        assert_eq!(expr(r#""plain""#), Expression::String("plain".into()));
    }

    #[test]
    fn test_template_directives_are_kept_opaque() {
        let Expression::Template(parts) = expr(r#""%{ for x in var.l }${x}%{ endfor }""#) else {
            panic!("expected template");
        };
        assert!(parts.contains(&TemplatePart::Directive));
        assert!(evaluate(&Expression::Template(parts)).is_err());
    }

    #[test]
    fn test_indented_heredoc() {
        let text = "<<-EOT\n    first\n      second\n    EOT";
        assert_eq!(evaluate(&expr(text)).unwrap(), json!("first\n  second\n"));
    }

    #[test]
    fn test_conditional_and_unary() {
        let Expression::Conditional(conditional) = expr("!a ? -1 : 2") else {
            panic!("expected conditional");
        };
        assert_eq!(
            conditional.condition,
            Expression::Unary(UnaryOp::Not, Box::new(var("a")))
        );
        assert_eq!(evaluate(&conditional.then).unwrap(), json!(-1));
        assert_eq!(conditional.otherwise, num(2));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(expr("42"), num(42));
        assert_eq!(evaluate(&expr("2.5")).unwrap(), json!(2.5));
        assert_eq!(evaluate(&expr("1e3")).unwrap().as_f64(), Some(1000.0));
    }

    #[test]
    fn test_body_with_blocks_and_attributes() {
        let parsed = body(
            r#"
# leading comment
terraform { required_version = ">= 1.0" }

variable "name" {
  type        = string
  description = "The name"

  validation {
    condition     = length(var.name) > 3
    error_message = "Too short."
  }
}

locals {
  x = 1
}
"#,
        );

        assert_eq!(parsed.attributes.len(), 0);
        assert_eq!(parsed.blocks.len(), 3);

        let variable = &parsed.blocks[1];
        assert_eq!(variable.kind, "variable");
        assert_eq!(variable.labels, vec!["name".to_string()]);
        assert_eq!(variable.body.attribute("type").unwrap().expr, var("string"));
        assert_eq!(variable.body.blocks_of("validation").count(), 1);
    }

    #[test]
    fn test_unrelated_blocks_with_directives_and_provider_functions() {
        let parsed = body(
            r#"
variable "a" {
  type = string
}

output "o" {
  value = "%{ for x in var.l }${x}%{ endfor }"
}

locals {
  arn = provider::aws::arn_parse("arn:aws:s3:::bucket")
}
"#,
        );
        assert_eq!(parsed.blocks.len(), 3);
        let locals = &parsed.blocks[2];
        let Expression::FunctionCall(call) = &locals.body.attribute("arn").unwrap().expr else {
            panic!("expected call");
        };
        assert_eq!(call.name, "provider::aws::arn_parse");
    }

    #[test]
    fn test_multiline_attribute_after_operator() {
        let parsed = body("a = 1 +\n  2\nb = 3\n");
        assert_eq!(parsed.attributes.len(), 2);
        assert_eq!(
            parsed.attributes[0].expr,
            Expression::Binary(BinaryOp::Add, Box::new(num(1)), Box::new(num(2)))
        );
    }

    #[test]
    fn test_duplicate_attribute_is_an_error() {
        let err = parse(&Source::new("main.tf", "a = 1\na = 2\n")).unwrap_err();
        assert!(err.to_string().contains("attribute `a` redefined"));
    }

    #[test]
    fn test_syntax_errors_name_the_file() {
        let err = parse(&Source::new("main.tf", "variable \"x\" {\n  type = string\n")).unwrap_err();
        assert!(matches!(err, ConvertError::Parse { .. }));
        assert!(err.to_string().contains("main.tf:"), "{err}");
    }

    #[test]
    fn test_deeply_nested_default_is_a_parse_error() {
        let text = format!(
            "variable \"deep\" {{\n  default = {}1{}\n}}\n",
            "[".repeat(5_000),
            "]".repeat(5_000)
        );
        let err = parse(&Source::new("main.tf", text)).unwrap_err();
        assert!(matches!(err, ConvertError::Parse { .. }));
    }

    #[test]
    fn test_dedent() {
        assert_eq!(dedent("  a\n    b\n\n  c\n"), "a\n  b\n\nc\n");
    }
}
