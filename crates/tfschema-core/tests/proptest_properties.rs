//! Property-based tests for rule application, type conversion, length
//! arithmetic and rule targeting.

use proptest::prelude::*;
use serde_json::{json, Number, Value};
use tfschema_core::types::PrimitiveType;
use tfschema_core::validation::NumericRange;
use tfschema_core::{convert, ConvertOptions, Kind, Rule, SchemaNode, TypeExpression, TypeRegistry};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_kind() -> impl Strategy<Value = Option<Kind>> {
    prop_oneof![
        Just(None),
        Just(Some(Kind::String)),
        Just(Some(Kind::Number)),
        Just(Some(Kind::Boolean)),
        Just(Some(Kind::Array)),
        Just(Some(Kind::Object)),
    ]
}

fn arb_number() -> impl Strategy<Value = Option<Number>> {
    proptest::option::of((-1000i64..1000).prop_map(Number::from))
}

fn arb_literal() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-z]{0,6}".prop_map(Value::from),
        (-50i64..50).prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
    ]
}

fn arb_rule() -> impl Strategy<Value = Rule> {
    prop_oneof![
        (
            proptest::option::of(0i64..100),
            proptest::option::of(0i64..100)
        )
            .prop_map(|(min, max)| Rule::Length { min, max }),
        (
            arb_number(),
            arb_number(),
            arb_number(),
            arb_number(),
            proptest::option::of(proptest::collection::vec(arb_literal(), 1..4)),
        )
            .prop_map(|(minimum, maximum, exclusive_minimum, exclusive_maximum, values)| {
                Rule::Range(NumericRange {
                    minimum,
                    maximum,
                    exclusive_minimum,
                    exclusive_maximum,
                    values,
                })
            }),
        "[a-z^$.*]{1,8}".prop_map(|pattern| Rule::Regex { pattern }),
        proptest::collection::vec(arb_literal(), 1..5).prop_map(|values| Rule::Enum { values }),
    ]
}

#[derive(Debug, Clone)]
enum Step {
    Field(String),
    List,
    Map,
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        "f_[a-z0-9]{0,6}".prop_map(Step::Field),
        Just(Step::List),
        Just(Step::Map),
    ]
}

/// The type text, the reference to the innermost node, and the JSON pointer
/// segments leading to it in the compiled variable schema.
fn render(steps: &[Step]) -> (String, String, Vec<String>) {
    let ty = steps.iter().rev().fold("number".to_string(), |inner, step| match step {
        Step::Field(name) => format!("object({{ {name} = {inner} }})"),
        Step::List => format!("list({inner})"),
        Step::Map => format!("map({inner})"),
    });
    let mut reference = "var.v".to_string();
    let mut pointer = Vec::new();
    for step in steps {
        match step {
            Step::Field(name) => {
                reference.push('.');
                reference.push_str(name);
                pointer.push("properties".to_string());
                pointer.push(name.clone());
            }
            Step::List => {
                reference.push_str("[0]");
                pointer.push("items".to_string());
            }
            Step::Map => {
                reference.push_str("[\"k\"]");
                pointer.push("additionalProperties".to_string());
            }
        }
    }
    (ty, reference, pointer)
}

fn compile_variable(ty: &str, condition: &str) -> Value {
    let source = format!(
        "variable \"v\" {{\n  type = {ty}\n  validation {{\n    condition     = {condition}\n    error_message = \"invalid\"\n  }}\n}}\n"
    );
    let schema = convert(&source, &ConvertOptions::default())
        .unwrap_or_else(|e| panic!("conversion failed for {source}: {e}"));
    schema.to_value().unwrap()["properties"]["v"].clone()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, ..Default::default() })]

    /// Applying a rule twice is the same as applying it once.
    #[test]
    fn rule_application_is_idempotent(rule in arb_rule(), kind in arb_kind()) {
        let base = SchemaNode { kind, ..SchemaNode::default() };

        let mut once = base.clone();
        rule.apply(&mut once);
        let mut twice = once.clone();
        rule.apply(&mut twice);

        prop_assert_eq!(once, twice);
    }

    /// Primitive conversion does not depend on which converters are registered.
    #[test]
    fn primitive_conversion_is_context_free(
        primitive in prop_oneof![
            Just(PrimitiveType::String),
            Just(PrimitiveType::Number),
            Just(PrimitiveType::Bool),
        ]
    ) {
        let ty = TypeExpression::Primitive(primitive);
        let with_defaults = TypeRegistry::with_defaults().convert(&ty).unwrap();
        let bare = TypeRegistry::empty().convert(&ty).unwrap();
        prop_assert_eq!(&with_defaults, &bare);
        prop_assert!(with_defaults.kind.is_some());
    }

    /// Strict length comparisons become inclusive bounds off by one.
    #[test]
    fn length_bounds(n in 1i64..10_000) {
        let bounds = [
            (">", json!({"type": "string", "minLength": n + 1})),
            (">=", json!({"type": "string", "minLength": n})),
            ("<", json!({"type": "string", "maxLength": n - 1})),
            ("<=", json!({"type": "string", "maxLength": n})),
            ("==", json!({"type": "string", "minLength": n, "maxLength": n})),
        ];
        for (op, expected) in bounds {
            let condition = format!("length(var.v) {op} {n}");
            prop_assert_eq!(compile_variable("string", &condition), expected);
        }
    }

    /// No length is below zero, so a maximum below zero is malformed rather
    /// than emitted as an invalid `maxLength`.
    #[test]
    fn negative_length_maximum_is_rejected(n in -10_000i64..=0) {
        for condition in [format!("length(var.v) < {n}"), format!("length(var.v) <= {}", n - 1)] {
            let source = format!(
                "variable \"v\" {{\n  type = list(string)\n  validation {{\n    condition     = {condition}\n    error_message = \"invalid\"\n  }}\n}}\n"
            );
            prop_assert!(convert(&source, &ConvertOptions::default()).is_err());
        }
    }

    /// A rule whose reference follows the declared type always finds its
    /// target, and lands exactly there.
    #[test]
    fn references_locate_their_node(steps in proptest::collection::vec(arb_step(), 0..4)) {
        let (ty, reference, pointer) = render(&steps);
        let compiled = compile_variable(&ty, &format!("{reference} > 0"));

        let mut node = &compiled;
        for segment in &pointer {
            node = &node[segment.as_str()];
        }
        prop_assert_eq!(node, &json!({"type": "number", "exclusiveMinimum": 0}));
    }
}
