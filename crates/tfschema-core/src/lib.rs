//! # tfschema-core
//!
//! Compile Terraform `variable` declarations into a JSON Schema document.
//!
//! Each variable is compiled independently:
//!
//! 1. its `type` is converted through the [`TypeRegistry`],
//! 2. `description`, `default`, `sensitive` and `nullable` are written by the
//!    [`AttributeApplier`]s,
//! 3. every `validation` condition is matched against the
//!    [`MatcherRegistry`] and the resulting rule is applied to the node its
//!    path designates,
//! 4. under-specified shapes are refined from the literal default.
//!
//! The variables are then collected into a root object schema.
//!
//! ```
//! use serde_json::json;
//! use tfschema_core::{convert, ConvertOptions};
//!
//! let source = r#"
//! variable "name" {
//!   type = string
//!   validation {
//!     condition     = length(var.name) > 10
//!     error_message = "Too short."
//!   }
//! }
//! "#;
//!
//! let schema = convert(source, &ConvertOptions::default()).unwrap();
//! assert_eq!(
//!     schema.to_value().unwrap()["properties"]["name"],
//!     json!({"type": "string", "minLength": 11})
//! );
//! ```

pub mod attributes;
pub mod compiler;
pub mod config;
pub mod error;
pub mod hcl;
pub mod inference;
pub mod navigator;
pub mod schema;
pub mod types;
pub mod validation;
pub mod variables;

pub use attributes::{default_appliers, AttributeApplier};
pub use compiler::Compiler;
pub use config::{ConvertOptions, UnmatchedConditions, DRAFT_07};
pub use error::ConvertError;
pub use schema::{AdditionalProperties, Kind, SchemaNode};
pub use types::{TypeConverter, TypeExpression, TypeRegistry};
pub use validation::{ConditionMatcher, MatchOutcome, MatcherRegistry, Path, Rule, ScopedRule};
pub use variables::{extract_variables, ValidationBlock, VariableDecl};

use std::fs;
use std::path::Path as FsPath;

use crate::hcl::Source;

/// Compile a single configuration file's variables with the default
/// registries.
pub fn convert(source: &str, options: &ConvertOptions) -> Result<SchemaNode, ConvertError> {
    convert_sources(&[("main.tf", source)], options)
}

/// Compile several files as one module. Variables keep the order of
/// `sources`, then their order within each file.
pub fn convert_sources<N, C>(
    sources: &[(N, C)],
    options: &ConvertOptions,
) -> Result<SchemaNode, ConvertError>
where
    N: AsRef<str>,
    C: AsRef<str>,
{
    let mut variables = Vec::new();
    for (name, contents) in sources {
        let source = Source::new(name.as_ref(), contents.as_ref());
        let body = crate::hcl::parse(&source)?;
        variables.extend(extract_variables(&body)?);
    }
    tracing::debug!(
        files = sources.len(),
        variables = variables.len(),
        "variables extracted"
    );
    Compiler::new(options.clone()).compile_document(&variables)
}

/// Compile a `.tf` file, or every `.tf` file of a directory in file name
/// order.
pub fn convert_path(path: impl AsRef<FsPath>, options: &ConvertOptions) -> Result<SchemaNode, ConvertError> {
    let path = path.as_ref();
    let io_error = |source| ConvertError::Io {
        path: path.display().to_string(),
        source,
    };

    let files = if path.is_dir() {
        let mut files = Vec::new();
        for entry in fs::read_dir(path).map_err(io_error)? {
            let file = entry.map_err(io_error)?.path();
            if file.is_file() && file.extension().is_some_and(|ext| ext == "tf") {
                files.push(file);
            }
        }
        files.sort();
        files
    } else {
        vec![path.to_path_buf()]
    };

    let mut sources = Vec::with_capacity(files.len());
    for file in &files {
        let contents = fs::read_to_string(file).map_err(|source| ConvertError::Io {
            path: file.display().to_string(),
            source,
        })?;
        sources.push((file.display().to_string(), contents));
    }
    convert_sources(&sources, options)
}
