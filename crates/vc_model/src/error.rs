use alloc::string::String;

use thiserror::Error;

// -----------------------------------------------------------------------------
// DefinitionError

/// Raised while classes are being declared or decorated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DefinitionError {
    #[error("behavior `{behavior}` is already attached to `{owner}`{}", property_suffix(.key))]
    DuplicateBehavior {
        behavior: &'static str,
        owner: String,
        key: Option<String>,
    },

    #[error("malformed cast target: {0}")]
    MalformedCastTarget(String),
}

fn property_suffix(key: &Option<String>) -> String {
    match key {
        Some(key) => alloc::format!(" (property `{key}`)"),
        None => String::new(),
    }
}

// -----------------------------------------------------------------------------
// TraversalError

/// Raised by serialize, deserialize and cast when data and shape disagree.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TraversalError {
    #[error("expected {expected} at `{path}`, found {found}")]
    ShapeMismatch {
        expected: &'static str,
        found: &'static str,
        path: String,
    },

    #[error("instance of `{class}` is reachable from itself at `{path}`")]
    Cycle { class: String, path: String },

    #[error("`{class}` serializes two properties as `{key}` at `{path}`")]
    KeyCollision {
        class: String,
        key: String,
        path: String,
    },

    #[error("format `{format}` cannot accept {found} input")]
    FormatMismatch {
        format: &'static str,
        found: &'static str,
    },

    #[error("failed to encode {format}: {message}")]
    Encode {
        format: &'static str,
        message: String,
    },

    #[error("failed to decode {format}: {message}")]
    Decode {
        format: &'static str,
        message: String,
    },
}
