//! Error types for variable schema compilation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{message}")]
    Parse { message: String },

    #[error("Cannot evaluate expression: {message}")]
    Evaluation { message: String },

    #[error("Unsupported type keyword `{keyword}`")]
    UnsupportedType { keyword: String },

    #[error("Malformed type expression: {message}")]
    MalformedType { message: String },

    #[error("Malformed declaration: {message}")]
    MalformedDeclaration { message: String },

    #[error("Invalid value for attribute `{attribute}`: {message}")]
    InvalidAttribute { attribute: String, message: String },

    #[error("Variable `{name}` is declared more than once")]
    DuplicateVariable { name: String },

    #[error("Malformed validation condition in block {block}: {message}")]
    MalformedValidation { block: usize, message: String },

    #[error("Validation condition in block {block} does not match any known pattern")]
    UnrecognizedCondition { block: usize },

    #[error("Path {path} not found: no property `{segment}`")]
    PathNotFound { path: String, segment: String },

    #[error("Wildcard in path {path} cannot be applied: {reason}")]
    InvalidWildcardTarget { path: String, reason: String },

    #[error("Index {index} in path {path} is out of range for a tuple of {arity} elements")]
    IndexOutOfRange {
        path: String,
        index: usize,
        arity: usize,
    },

    #[error("Index {index} in path {path} targets a node without positional items")]
    InvalidIndexTarget { path: String, index: usize },

    #[error("Variable `{name}`: {source}")]
    Variable {
        name: String,
        #[source]
        source: Box<ConvertError>,
    },
}

impl ConvertError {
    /// Attach the owning variable's name to an error raised while compiling it.
    pub fn in_variable(self, name: &str) -> Self {
        match self {
            already @ ConvertError::Variable { .. } => already,
            other => ConvertError::Variable {
                name: name.to_string(),
                source: Box::new(other),
            },
        }
    }
}
