//! Syntax tree for the native configuration syntax.

use std::fmt;

use serde_json::Number;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Body {
    pub attributes: Vec<Attribute>,
    pub blocks: Vec<Block>,
}

impl Body {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    pub fn blocks_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Block> + 'a {
        self.blocks.iter().filter(move |block| block.kind == kind)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub expr: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub kind: String,
    pub labels: Vec<String>,
    pub body: Body,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    /// A quoted string or heredoc containing at least one interpolation or
    /// directive.
    Template(Vec<TemplatePart>),
    Variable(String),
    Traversal(Box<Traversal>),
    FunctionCall(Box<FunctionCall>),
    Tuple(Vec<Expression>),
    Object(Vec<ObjectItem>),
    Unary(UnaryOp, Box<Expression>),
    Binary(BinaryOp, Box<Expression>, Box<Expression>),
    Conditional(Box<Conditional>),
    For(Box<ForExpr>),
    Parenthesized(Box<Expression>),
}

impl Expression {
    /// Strip any number of enclosing parentheses.
    pub fn unparenthesized(&self) -> &Expression {
        let mut expr = self;
        while let Expression::Parenthesized(inner) = expr {
            expr = inner;
        }
        expr
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Literal(String),
    Interpolation(Expression),
    /// `%{ if ... }`, `%{ for ... }` and their closing markers. Never
    /// constant.
    Directive,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Traversal {
    pub expr: Expression,
    pub operators: Vec<TraversalOp>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TraversalOp {
    /// `.name`
    GetAttr(String),
    /// `[expr]`
    Index(Expression),
    /// `.0`
    LegacyIndex(u64),
    /// `[*]` or `.*`
    Splat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expression>,
    /// The final argument was followed by `...`.
    pub expand_final: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKey {
    Identifier(String),
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectItem {
    pub key: ObjectKey,
    pub value: Expression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEq => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEq => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Less
                | BinaryOp::LessEq
                | BinaryOp::Greater
                | BinaryOp::GreaterEq
        )
    }

    /// The operator that gives the same result with its operands swapped.
    pub fn mirrored(self) -> BinaryOp {
        match self {
            BinaryOp::Less => BinaryOp::Greater,
            BinaryOp::LessEq => BinaryOp::GreaterEq,
            BinaryOp::Greater => BinaryOp::Less,
            BinaryOp::GreaterEq => BinaryOp::LessEq,
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
    pub condition: Expression,
    pub then: Expression,
    pub otherwise: Expression,
}

/// `[for k, v in coll : value if cond]` or `{for k, v in coll : key => value...}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForExpr {
    pub key_var: Option<String>,
    pub value_var: String,
    pub collection: Expression,
    /// Present only for object `for` expressions.
    pub key_expr: Option<Expression>,
    pub value_expr: Expression,
    pub condition: Option<Expression>,
    pub grouping: bool,
}

// ---------------------------------------------------------------------------
// Display: renders expressions back to source-like text for diagnostics
// ---------------------------------------------------------------------------

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expression]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Null => f.write_str("null"),
            Expression::Bool(b) => write!(f, "{b}"),
            Expression::Number(n) => write!(f, "{n}"),
            Expression::String(s) => write!(f, "\"{}\"", s.escape_default()),
            Expression::Template(parts) => {
                f.write_str("\"")?;
                for part in parts {
                    match part {
                        TemplatePart::Literal(s) => write!(f, "{}", s.escape_default())?,
                        TemplatePart::Interpolation(expr) => write!(f, "${{{expr}}}")?,
                        TemplatePart::Directive => f.write_str("%{...}")?,
                    }
                }
                f.write_str("\"")
            }
            Expression::Variable(name) => f.write_str(name),
            Expression::Traversal(traversal) => {
                write!(f, "{}", traversal.expr)?;
                for op in &traversal.operators {
                    match op {
                        TraversalOp::GetAttr(name) => write!(f, ".{name}")?,
                        TraversalOp::Index(index) => write!(f, "[{index}]")?,
                        TraversalOp::LegacyIndex(index) => write!(f, ".{index}")?,
                        TraversalOp::Splat => f.write_str("[*]")?,
                    }
                }
                Ok(())
            }
            Expression::FunctionCall(call) => {
                write!(f, "{}(", call.name)?;
                write_list(f, &call.args)?;
                if call.expand_final {
                    f.write_str("...")?;
                }
                f.write_str(")")
            }
            Expression::Tuple(items) => {
                f.write_str("[")?;
                write_list(f, items)?;
                f.write_str("]")
            }
            Expression::Object(items) => {
                f.write_str("{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match &item.key {
                        ObjectKey::Identifier(name) => f.write_str(name)?,
                        ObjectKey::Expression(expr) => write!(f, "{expr}")?,
                    }
                    write!(f, " = {}", item.value)?;
                }
                f.write_str("}")
            }
            Expression::Unary(UnaryOp::Not, expr) => write!(f, "!{expr}"),
            Expression::Unary(UnaryOp::Neg, expr) => write!(f, "-{expr}"),
            Expression::Binary(op, lhs, rhs) => write!(f, "{lhs} {} {rhs}", op.symbol()),
            Expression::Conditional(c) => {
                write!(f, "{} ? {} : {}", c.condition, c.then, c.otherwise)
            }
            Expression::For(for_expr) => {
                let (open, close) = match for_expr.key_expr {
                    Some(_) => ("{", "}"),
                    None => ("[", "]"),
                };
                write!(f, "{open}for ")?;
                if let Some(key_var) = &for_expr.key_var {
                    write!(f, "{key_var}, ")?;
                }
                write!(f, "{} in {} : ", for_expr.value_var, for_expr.collection)?;
                if let Some(key_expr) = &for_expr.key_expr {
                    write!(f, "{key_expr} => ")?;
                }
                write!(f, "{}", for_expr.value_expr)?;
                if for_expr.grouping {
                    f.write_str("...")?;
                }
                if let Some(condition) = &for_expr.condition {
                    write!(f, " if {condition}")?;
                }
                f.write_str(close)
            }
            Expression::Parenthesized(expr) => write!(f, "({expr})"),
        }
    }
}
