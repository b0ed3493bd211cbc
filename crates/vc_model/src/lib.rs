#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod hash;

pub mod behavior;
pub mod class;
pub mod error;
pub mod instance;
pub mod logging;
pub mod registry;
pub mod serde;
pub mod validate;
pub mod value;

#[cfg(test)]
mod tests;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use behavior::{Behavior, BehaviorId, Descriptor, Hook};
pub use class::{Class, Instance};
pub use error::{DefinitionError, TraversalError};
pub use instance::{Entity, Wrapped, unwrap, wrap};
pub use registry::{Target, attach, filter_definition, verify};
pub use registry::{get_class_definition, get_property_definition};
pub use serde::{CastOptions, CastTarget, Format, Serialized};
pub use serde::{cast, cast_later, clone_entity, deserialize, serialize};
pub use value::{Map, Value};

/// The most common imports.
pub mod prelude {
    pub use crate::behavior::builtin::*;
    pub use crate::behavior::{Behavior, Descriptor, Hook, Staged};
    pub use crate::class::Class;
    pub use crate::instance::{Entity, wrap};
    pub use crate::serde::{CastOptions, CastTarget, Format, Serialized};
    pub use crate::validate::{Provider, Validate, ValidationError};
    pub use crate::value::{Map, Value};
}
