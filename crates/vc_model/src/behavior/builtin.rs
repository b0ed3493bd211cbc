//! Stock behaviors.
//!
//! | Behavior         | Level            | Payload         | Hooks                      | Multiple |
//! |------------------|------------------|-----------------|----------------------------|----------|
//! | [`Alias`]        | property         | `String`        | -                          | no       |
//! | [`Cast`]         | property         | [`CastTarget`]  | -                          | no       |
//! | [`Serializable`] | property         | [`SerdeFlags`]  | -                          | no       |
//! | [`DefaultValue`] | property / class | -               | get: transform             | no       |
//! | [`ReadOnly`]     | property / class | -               | set: intercept             | no       |
//! | [`OnChange`]     | property / class | [`ChangeFn`]    | -                          | yes      |
//! | [`Validator`]    | property         | [`Provider`]    | -                          | yes      |
//!
//! The first three are read by the structural traversal, validators by the
//! validity record and change callbacks by the entity once a set has been
//! stored. The rest act purely through hooks.

use alloc::string::String;
use alloc::sync::Arc;

use bitflags::bitflags;

use super::{Behavior, Descriptor, Hook};
use crate::error::DefinitionError;
use crate::serde::{CastTarget, TargetShape};
use crate::validate::Provider;
use crate::value::Value;

// -----------------------------------------------------------------------------
// Alias

/// Renames a property in serialized data.
pub struct Alias;

impl Behavior for Alias {
    const NAME: &'static str = "alias";
}

/// The serialized name of a property.
pub fn alias(name: impl Into<String>) -> Descriptor {
    Descriptor::new::<Alias>().with_payload::<String>(name.into())
}

// -----------------------------------------------------------------------------
// Cast

/// Deserializes a property into instances of a class.
pub struct Cast;

impl Behavior for Cast {
    const NAME: &'static str = "cast";
}

pub fn cast(target: CastTarget) -> Descriptor {
    Descriptor::new::<Cast>().with_payload(target)
}

/// Same as [`cast`], but validates a loosely-shaped target first.
pub fn cast_shape(shape: TargetShape) -> Result<Descriptor, DefinitionError> {
    CastTarget::try_from(shape).map(cast)
}

// -----------------------------------------------------------------------------
// Serializable

bitflags! {
    /// Directions in which a property takes part in traversal.
    #[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
    pub struct SerdeFlags: u8 {
        const SERIALIZE = 1;
        const DESERIALIZE = 1 << 1;
    }
}

impl Default for SerdeFlags {
    #[inline]
    fn default() -> Self {
        SerdeFlags::all()
    }
}

/// Controls whether a property is serialized and/or deserialized.
pub struct Serializable;

impl Behavior for Serializable {
    const NAME: &'static str = "serializable";
}

pub fn serializable(flags: SerdeFlags) -> Descriptor {
    Descriptor::new::<Serializable>().with_payload(flags)
}

/// Excludes a property from both directions.
#[inline]
pub fn skip_serde() -> Descriptor {
    serializable(SerdeFlags::empty())
}

// -----------------------------------------------------------------------------
// DefaultValue

/// Replaces a `Null` read with a default.
pub struct DefaultValue;

impl Behavior for DefaultValue {
    const NAME: &'static str = "default";
}

pub fn default_value<T>(default: T) -> Descriptor
where
    T: Into<Value> + Clone + Send + Sync + 'static,
{
    default_with(move || default.clone().into())
}

pub fn default_with(default: impl Fn() -> Value + Send + Sync + 'static) -> Descriptor {
    Descriptor::new::<DefaultValue>().on_get(Hook::transform(move |_, value| {
        if value.is_null() { default() } else { value }
    }))
}

// -----------------------------------------------------------------------------
// ReadOnly

/// Ignores writes to properties that already hold a value.
///
/// The first write to a missing key goes through, so a read-only property
/// can still be populated once.
pub struct ReadOnly;

impl Behavior for ReadOnly {
    const NAME: &'static str = "read_only";
}

pub fn read_only() -> Descriptor {
    Descriptor::new::<ReadOnly>().on_set(Hook::intercept(|ctx, value| {
        match ctx.key().and_then(|key| ctx.entity().raw(key)) {
            Some(current) => current,
            None => value,
        }
    }))
}

// -----------------------------------------------------------------------------
// OnChange

pub type ChangeFn = Arc<dyn Fn(&str, &Value, &Value) + Send + Sync>;

/// Reports `(key, old, new)` when a set changes a stored value.
///
/// The callback runs after the whole set chain, with the value that was
/// actually stored, so an intercept or transform later in the chain is
/// accounted for. Silent while the engine re-applies constructed state.
pub struct OnChange;

impl Behavior for OnChange {
    const NAME: &'static str = "on_change";
    const MULTIPLE: bool = true;
    const REQUIRES_WRAPPING: bool = true;
}

pub fn on_change(callback: impl Fn(&str, &Value, &Value) + Send + Sync + 'static) -> Descriptor {
    let callback: ChangeFn = Arc::new(callback);
    Descriptor::new::<OnChange>().with_payload(callback)
}

// -----------------------------------------------------------------------------
// Validator

/// Attaches one validation provider to a property.
pub struct Validator;

impl Behavior for Validator {
    const NAME: &'static str = "validate";
    const MULTIPLE: bool = true;
    const REQUIRES_WRAPPING: bool = true;
}

pub fn validate(provider: impl Into<Provider>) -> Descriptor {
    Descriptor::new::<Validator>().with_payload(provider.into())
}

// -----------------------------------------------------------------------------
// Tests
