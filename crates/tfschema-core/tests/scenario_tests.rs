//! End-to-end scenarios: a single declaration in, the variable's schema out.

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tfschema_core::{convert, ConvertOptions};

fn variable_schema(source: &str, name: &str, options: &ConvertOptions) -> Value {
    let schema = convert(source, options).expect("conversion should succeed");
    schema.to_value().expect("schema serializes")["properties"][name].clone()
}

fn with_validation(ty: &str, condition: &str) -> String {
    format!(
        "variable \"value\" {{\n  type = {ty}\n  validation {{\n    condition     = {condition}\n    error_message = \"invalid\"\n  }}\n}}\n"
    )
}

fn compile_condition(ty: &str, condition: &str) -> Value {
    variable_schema(
        &with_validation(ty, condition),
        "value",
        &ConvertOptions::default(),
    )
}

// ── Scenarios ───────────────────────────────────────────────────────────────

#[test]
fn test_length_greater_than_sets_min_length() {
    assert_eq!(
        compile_condition("string", "length(var.value) > 10"),
        json!({"type": "string", "minLength": 11})
    );
}

#[test]
fn test_regex_sets_pattern() {
    assert_eq!(
        compile_condition("string", r#"can(regex("^[a-zA-Z0-9]*$", var.value))"#),
        json!({"type": "string", "pattern": "^[a-zA-Z0-9]*$"})
    );
}

#[test]
fn test_contains_sets_enum() {
    assert_eq!(
        compile_condition("string", r#"contains(["a", "b", "c"], var.value)"#),
        json!({"type": "string", "enum": ["a", "b", "c"]})
    );
}

#[test]
fn test_object_type_without_validation() {
    let source = r#"
variable "person" {
  type = object({
    name = string
    age  = number
  })
}
"#;
    assert_eq!(
        variable_schema(source, "person", &ConvertOptions::default()),
        json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "age": {"type": "number"}
            },
            "required": ["age", "name"],
            "additionalProperties": true
        })
    );
}

#[test]
fn test_untyped_variable_inferred_from_default() {
    let source = r#"
variable "user" {
  default = {
    role  = "admin"
    level = 3
  }
}
"#;
    let options = ConvertOptions {
        embed_defaults: false,
        ..ConvertOptions::default()
    };
    assert_eq!(
        variable_schema(source, "user", &options),
        json!({
            "type": "object",
            "properties": {
                "role": {"type": "string"},
                "level": {"type": "number"}
            },
            "required": ["level", "role"]
        })
    );

    let embedded = variable_schema(source, "user", &ConvertOptions::default());
    assert_eq!(embedded["default"], json!({"role": "admin", "level": 3}));
}

// ── Length boundaries ───────────────────────────────────────────────────────

#[test]
fn test_length_boundaries() {
    let cases = [
        ("length(var.value) > 10", json!({"type": "string", "minLength": 11})),
        ("length(var.value) >= 10", json!({"type": "string", "minLength": 10})),
        ("length(var.value) < 10", json!({"type": "string", "maxLength": 9})),
        ("length(var.value) <= 10", json!({"type": "string", "maxLength": 10})),
        (
            "length(var.value) == 10",
            json!({"type": "string", "minLength": 10, "maxLength": 10}),
        ),
    ];
    for (condition, expected) in cases {
        assert_eq!(compile_condition("string", condition), expected, "{condition}");
    }
}

#[test]
fn test_length_on_collections() {
    assert_eq!(
        compile_condition("list(number)", "length(var.value) > 0"),
        json!({"type": "array", "items": {"type": "number"}, "minItems": 1})
    );
    assert_eq!(
        compile_condition("map(string)", "length(var.value) <= 5"),
        json!({
            "type": "object",
            "required": [],
            "additionalProperties": {"type": "string"},
            "maxProperties": 5
        })
    );
}

// ── Ranges and enums ────────────────────────────────────────────────────────

#[test]
fn test_numeric_range() {
    assert_eq!(
        compile_condition("number", "var.value > 0 && var.value <= 100"),
        json!({"type": "number", "exclusiveMinimum": 0, "maximum": 100})
    );
    assert_eq!(
        compile_condition("number", "0.5 < var.value"),
        json!({"type": "number", "exclusiveMinimum": 0.5})
    );
}

#[test]
fn test_equality_alternatives() {
    assert_eq!(
        compile_condition("number", "var.value == 1 || var.value == 2 || var.value == 4"),
        json!({"type": "number", "enum": [1, 2, 4]})
    );
}

#[test]
fn test_conflicting_bounds_are_last_wins() {
    // Known gap: the later bound wins even when it is looser.
    assert_eq!(
        compile_condition(
            "string",
            "length(var.value) >= 8 && length(var.value) >= 2"
        ),
        json!({"type": "string", "minLength": 2})
    );
}

#[test]
fn test_several_validation_blocks_combine() {
    let source = r#"
variable "code" {
  type = string

  validation {
    condition     = length(var.code) == 3
    error_message = "Three characters."
  }

  validation {
    condition     = can(regex("^[A-Z]+$", var.code))
    error_message = "Uppercase."
  }
}
"#;
    assert_eq!(
        variable_schema(source, "code", &ConvertOptions::default()),
        json!({"type": "string", "minLength": 3, "maxLength": 3, "pattern": "^[A-Z]+$"})
    );
}

// ── Quantified rules ────────────────────────────────────────────────────────

#[test]
fn test_quantifier_over_map_values() {
    assert_eq!(
        compile_condition(
            "map(number)",
            "alltrue([for k, v in var.value : v >= 0])"
        ),
        json!({
            "type": "object",
            "required": [],
            "additionalProperties": {"type": "number", "minimum": 0}
        })
    );
}

#[test]
fn test_quantifier_over_nested_list() {
    assert_eq!(
        compile_condition(
            "object({ users = list(object({ email = string })) })",
            r#"alltrue([for u in var.value.users : can(regex("@", u.email))])"#
        ),
        json!({
            "type": "object",
            "properties": {
                "users": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {"email": {"type": "string", "pattern": "@"}},
                        "required": ["email"],
                        "additionalProperties": true
                    }
                }
            },
            "required": ["users"],
            "additionalProperties": true
        })
    );
}

#[test]
fn test_quantifier_over_splat() {
    assert_eq!(
        compile_condition(
            "list(string)",
            "alltrue([for s in var.value[*] : length(s) > 1])"
        ),
        json!({"type": "array", "items": {"type": "string", "minLength": 2}})
    );
}

#[test]
fn test_quantifier_over_splat_attribute() {
    assert_eq!(
        compile_condition(
            "list(object({ n = string }))",
            "alltrue([for n in var.value[*].n : length(n) > 1])"
        ),
        json!({
            "type": "array",
            "items": {
                "type": "object",
                "properties": {"n": {"type": "string", "minLength": 2}},
                "required": ["n"],
                "additionalProperties": true
            }
        })
    );
}

// ── Ambiguous references ────────────────────────────────────────────────────

#[test]
fn test_ambiguous_reference_targets_first_path() {
    // Two properties in one condition: the rule lands on the first one.
    assert_eq!(
        compile_condition(
            "object({ low = number, high = number })",
            "var.value.low >= 0 && var.value.high <= 10"
        )["properties"],
        json!({
            "low": {"type": "number", "minimum": 0, "maximum": 10},
            "high": {"type": "number"}
        })
    );
}
