//! Configuration for variable schema compilation.

use serde::{Deserialize, Serialize};

/// JSON Schema dialect written to the root `$schema` keyword by default.
pub const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

/// What to do with a validation block whose condition matches no known pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnmatchedConditions {
    /// Drop the block silently (default).
    Ignore,
    /// Drop the block and emit a `tracing` warning.
    Warn,
    /// Fail compilation with `UnrecognizedCondition`.
    Error,
}

/// Options for variable schema compilation.
///
/// ## Serialization Format
///
/// Fields are serialized in `kebab-case` (e.g., `schema-uri`, `embed-defaults`).
/// Missing fields fall back to their defaults when loading a config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ConvertOptions {
    /// Value of the root `$schema` keyword.
    pub schema_uri: String,
    /// Copy each variable's literal default into the schema's `default` field.
    pub embed_defaults: bool,
    /// Refine under-specified shapes (`any`, generic maps) from literal defaults.
    pub infer_from_defaults: bool,
    /// Policy for validation conditions that no matcher recognizes.
    pub unmatched_conditions: UnmatchedConditions,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            schema_uri: DRAFT_07.to_string(),
            embed_defaults: true,
            infer_from_defaults: true,
            unmatched_conditions: UnmatchedConditions::Ignore,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_convert_options_serde_round_trip() {
        let opts = ConvertOptions {
            schema_uri: "https://json-schema.org/draft/2020-12/schema".to_string(),
            embed_defaults: false,
            infer_from_defaults: false,
            unmatched_conditions: UnmatchedConditions::Error,
        };

        let json = serde_json::to_string(&opts).unwrap();

        assert!(json.contains("\"schema-uri\""));
        assert!(json.contains("\"embed-defaults\""));
        assert!(json.contains("\"infer-from-defaults\""));
        assert!(json.contains("\"unmatched-conditions\":\"error\""));

        let deserialized: ConvertOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, opts);
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let opts: ConvertOptions =
            serde_json::from_str(r#"{ "unmatched-conditions": "warn" }"#).unwrap();

        assert_eq!(opts.schema_uri, DRAFT_07);
        assert!(opts.embed_defaults);
        assert!(opts.infer_from_defaults);
        assert_eq!(opts.unmatched_conditions, UnmatchedConditions::Warn);
    }
}
