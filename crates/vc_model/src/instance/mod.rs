//! The interception engine.
//!
//! [`wrap`] turns a [`Class`] into a [`Wrapped`] constructor. Each instance
//! it constructs is an [`Entity`]: the plain [`Instance`] store, owned by a
//! wrapper that routes every read and write through the composed hook chain.
//!
//! ## Lifecycle
//!
//! ```text
//! Unwrapped ──construct()──▶ Wrapping ──re-apply own fields──▶ Wrapped
//! ```
//!
//! An entity is wrapped exactly once, right after the plain constructor
//! returns. While wrapping, construct hooks run, then every own field is sent
//! back through the set pipeline with its current value, so the initial state
//! is normalized exactly as later assignments are.
//!
//! ## Ordering
//!
//! Hooks nest like middleware. Property-level descriptors are outer to
//! class-level ones; within a level, ancestors and earlier attachments are
//! outer. A set walks outer to inner, so the outermost hook sees the raw
//! value first; a get walks inner to outer, so the outermost hook sees the
//! final value last.

// -----------------------------------------------------------------------------
// Modules

mod entity;

// -----------------------------------------------------------------------------
// Exports

pub use entity::{Entity, WrapState};

use core::cell::Ref;

use crate::class::{Class, Instance};
use crate::registry;
use crate::value::Value;

// -----------------------------------------------------------------------------
// Wrapped

/// A constructible wrapper around a class.
///
/// # Examples
///
/// ```
/// use vc_model::behavior::builtin::default_value;
/// use vc_model::class::Class;
/// use vc_model::instance::wrap;
/// use vc_model::value::Value;
///
/// let counter = Class::builder("Counter")
///     .field("count")
///     .property("count", default_value(0))
///     .build()
///     .unwrap();
///
/// let entity = wrap(&counter).construct();
/// assert_eq!(entity.get("count"), Value::Int(0));
/// assert_eq!(entity.raw("count"), Some(Value::Null));
/// ```
#[derive(Clone, Debug)]
pub struct Wrapped {
    class: Class,
}

/// Prepares a class for dynamic behavior.
///
/// Marks the class as initialized, which settles any deferred consistency
/// check queued for it or its ancestors.
pub fn wrap(class: &Class) -> Wrapped {
    registry::mark_wrapped(class);
    Wrapped {
        class: class.clone(),
    }
}

impl Wrapped {
    #[inline]
    pub fn class(&self) -> &Class {
        &self.class
    }

    /// Constructs a plain instance and wraps it.
    #[inline]
    pub fn construct(&self) -> Entity {
        Entity::wrap_instance(self.class.construct())
    }

    /// Wraps an already constructed plain instance of this class or a
    /// subclass.
    ///
    /// An instance of any other class is handed back unchanged.
    pub fn adopt(&self, instance: Instance) -> Result<Entity, Instance> {
        if !instance.class().is_subclass_of(&self.class) {
            return Err(instance);
        }
        Ok(Entity::wrap_instance(instance))
    }
}

/// The plain store behind a wrapped value, `None` for anything else.
#[inline]
pub fn unwrap(value: &Value) -> Option<Ref<'_, Instance>> {
    value.as_entity().map(Entity::store)
}

// -----------------------------------------------------------------------------
// Tests
