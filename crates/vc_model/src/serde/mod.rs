//! Structural traversal: serialize, deserialize and cast.
//!
//! ## Menu
//!
//! - [`to_plain`] / [`serialize`]: turn entities into plain data, honoring
//!   aliases and serde flags, then encode once at the outermost call.
//! - [`deserialize`]: decode, then populate a target entity, casting
//!   properties that carry a cast target.
//! - [`cast`] / [`cast_later`]: deserialize into fresh instances, dispatched on
//!   the [`CastTarget`] shape.
//! - [`clone_entity`]: a detached copy through the plain form.
//!
//! ## Cycles
//!
//! An entity reachable from itself cannot be turned into plain data. Every
//! traversal tracks the entities on its current path and fails with
//! [`TraversalError::Cycle`] on a revisit. The same entity reached twice on
//! different paths is fine and is emitted twice.

// -----------------------------------------------------------------------------
// Modules

mod de;
mod ser;
mod target;

// -----------------------------------------------------------------------------
// Exports

pub use de::{cast, cast_later, clone_entity, deserialize};
pub use ser::{serialize, to_plain};
pub use target::{CastTarget, TargetShape};

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::error::TraversalError;
use crate::value::Value;

// -----------------------------------------------------------------------------
// Format

/// The encoding used at the outermost traversal call.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[non_exhaustive]
pub enum Format {
    /// Plain [`Value`] data, no encoding.
    #[default]
    Plain,
    /// JSON text, through `serde_json`.
    #[cfg(feature = "json")]
    Json,
    /// RON text, through `ron`.
    #[cfg(feature = "ron")]
    Ron,
}

impl Format {
    pub const fn name(self) -> &'static str {
        match self {
            Format::Plain => "plain",
            #[cfg(feature = "json")]
            Format::Json => "json",
            #[cfg(feature = "ron")]
            Format::Ron => "ron",
        }
    }

    #[inline]
    pub const fn is_text(self) -> bool {
        !matches!(self, Format::Plain)
    }
}

impl fmt::Display for Format {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// -----------------------------------------------------------------------------
// Serialized

/// Serialized data: plain, or the text of an encoding.
#[derive(Clone, PartialEq, Debug)]
pub enum Serialized {
    Plain(Value),
    Text(String),
}

impl Serialized {
    #[inline]
    pub const fn kind(&self) -> &'static str {
        match self {
            Serialized::Plain(_) => "plain",
            Serialized::Text(_) => "text",
        }
    }

    #[inline]
    pub fn into_plain(self) -> Option<Value> {
        match self {
            Serialized::Plain(value) => Some(value),
            Serialized::Text(_) => None,
        }
    }

    #[inline]
    pub fn into_text(self) -> Option<String> {
        match self {
            Serialized::Text(text) => Some(text),
            Serialized::Plain(_) => None,
        }
    }

    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Serialized::Text(text) => Some(text),
            Serialized::Plain(_) => None,
        }
    }
}

impl From<Value> for Serialized {
    #[inline]
    fn from(value: Value) -> Self {
        Serialized::Plain(value)
    }
}

impl From<String> for Serialized {
    #[inline]
    fn from(value: String) -> Self {
        Serialized::Text(value)
    }
}

impl From<&str> for Serialized {
    #[inline]
    fn from(value: &str) -> Self {
        Serialized::Text(String::from(value))
    }
}

// -----------------------------------------------------------------------------
// CastOptions

/// Per-call options for [`deserialize`] and [`cast`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct CastOptions {
    /// Validate every populated entity once the whole tree is in place.
    pub validate: bool,
}

impl CastOptions {
    pub const DEFAULT: Self = Self { validate: true };

    /// Skip validation after population.
    pub const UNCHECKED: Self = Self { validate: false };
}

impl Default for CastOptions {
    #[inline]
    fn default() -> Self {
        Self::DEFAULT
    }
}

// -----------------------------------------------------------------------------
// Path

enum Segment {
    Key(String),
    Index(usize),
}

/// Where a traversal currently is, for error messages.
#[derive(Default)]
struct Path(Vec<Segment>);

impl Path {
    #[inline]
    fn push_key(&mut self, key: &str) {
        self.0.push(Segment::Key(String::from(key)));
    }

    #[inline]
    fn push_index(&mut self, index: usize) {
        self.0.push(Segment::Index(index));
    }

    #[inline]
    fn pop(&mut self) {
        self.0.pop();
    }

    fn shape_mismatch(&self, expected: &'static str, found: &Value) -> TraversalError {
        TraversalError::ShapeMismatch {
            expected,
            found: found.kind(),
            path: alloc::format!("{self}"),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.0 {
            match segment {
                Segment::Key(key) => write!(f, ".{key}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}
