//! Error types for the compilation pipeline

use thiserror::Error;

/// Result type for compile operations
pub type Result<T> = std::result::Result<T, CompileError>;

/// Handle validation errors
///
/// Checks run in a fixed order: invalid sentinel, out of range, inactive,
/// retired generation. The first failing check decides the variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandleError {
    #[error("handle is invalid; was it issued by an arena?")]
    Invalid,

    #[error("handle index {index} is out of range for this arena ({entries} slots); was it issued by another arena?")]
    OutOfRange { index: u32, entries: usize },

    #[error("handle must be active to use it; has it already been removed?")]
    Inactive,

    #[error("handle no longer refers to a live object; its slot was reissued (handle generation {handle}, slot generation {slot})")]
    Retired { handle: u32, slot: u32 },
}

/// Dependency graph errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("a circular reference was detected between {from} and {to}")]
    CircularDependency { from: String, to: String },

    #[error("handle {index} has no dependency node in this graph")]
    UnknownNode { index: u32 },
}

/// Errors raised while building and compiling schemas
#[derive(Error, Debug)]
pub enum CompileError {
    #[error(transparent)]
    Handle(#[from] HandleError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("schema {class_name} must define at most one of properties/$ref/allOf/anyOf/oneOf, found {keywords:?}")]
    ConflictingKeywords {
        class_name: String,
        keywords: Vec<String>,
    },

    #[error("no schema registered for reference {url}")]
    UnresolvedReference { url: String },

    #[error("allOf member of {class_name} has neither $ref nor properties")]
    MalformedAllOf { class_name: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while constructing model values or parsing instances
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("no model type named {0}")]
    UnknownClass(String),

    #[error("argument '{name}' of {class_name} is required but was not supplied")]
    MissingRequiredArgument { class_name: String, name: String },

    #[error("field '{name}' of {class_name} is required but absent from the instance")]
    MissingRequiredField { class_name: String, name: String },

    #[error("invalid type for field '{field}': expected {expected}, received {actual}")]
    InvalidFieldType {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("{class_name} takes {expected} arguments but {actual} were supplied")]
    TooManyArguments {
        class_name: String,
        expected: usize,
        actual: usize,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
