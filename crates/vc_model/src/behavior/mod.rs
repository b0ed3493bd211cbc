//! The behavior-descriptor protocol.
//!
//! ## Menu
//!
//! - [`Behavior`]: a marker type giving a behavior its identity, name and
//!   multiplicity policy.
//! - [`BehaviorId`]: the identity token, keyed by the marker's `TypeId`.
//! - [`Descriptor`]: one attachment of a behavior: an optional payload plus an
//!   optional [`HookSet`].
//! - [`Hook`]: a get/set strategy, one of `Transform`, `Staged` or `Intercept`.
//! - [`HookContext`]: what a hook sees when it runs.
//! - [`builtin`]: the stock behaviors (alias, cast, serializable, default
//!   value, read-only, change tracking and validation).
//!
//! Descriptors are immutable once attached. The definition store hands them
//! out as `Arc<Descriptor>`, so composed views share the very same instances.

// -----------------------------------------------------------------------------
// Modules

mod hook;

pub mod builtin;

// -----------------------------------------------------------------------------
// Exports

pub use hook::{Access, HookContext};
pub use hook::{ConstructFn, Hook, Staged, TapFn, TransformFn};

pub(crate) use hook::Step;

use alloc::sync::Arc;
use core::any::{Any, TypeId};
use core::fmt;
use core::hash::{Hash, Hasher};

// -----------------------------------------------------------------------------
// Behavior

/// A marker type naming a behavior.
///
/// The marker's `TypeId` is the behavior identity, so two behaviors never
/// collide even if they share a [`NAME`](Behavior::NAME).
///
/// # Examples
///
/// ```
/// use vc_model::behavior::{Behavior, BehaviorId, Descriptor};
///
/// struct Upper;
///
/// impl Behavior for Upper {
///     const NAME: &'static str = "upper";
/// }
///
/// let descriptor = Descriptor::new::<Upper>();
/// assert_eq!(descriptor.id(), BehaviorId::of::<Upper>());
/// assert!(!descriptor.is_multiple());
/// ```
pub trait Behavior: 'static {
    /// Human-readable name used in errors and logs.
    const NAME: &'static str;

    /// Whether the same owner may carry this behavior more than once.
    const MULTIPLE: bool = false;

    /// Whether the behavior only makes sense on wrapped instances even
    /// without hooks.
    const REQUIRES_WRAPPING: bool = false;
}

/// The identity of a [`Behavior`].
#[derive(Copy, Clone)]
pub struct BehaviorId {
    type_id: TypeId,
    name: &'static str,
}

impl BehaviorId {
    #[inline]
    pub fn of<B: Behavior>() -> Self {
        Self {
            type_id: TypeId::of::<B>(),
            name: B::NAME,
        }
    }

    #[inline]
    pub const fn name(self) -> &'static str {
        self.name
    }
}

impl PartialEq for BehaviorId {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for BehaviorId {}

impl Hash for BehaviorId {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for BehaviorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BehaviorId({})", self.name)
    }
}

impl fmt::Display for BehaviorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// -----------------------------------------------------------------------------
// HookSet

/// The optional hooks a descriptor contributes.
#[derive(Clone, Default)]
pub struct HookSet {
    on_construct: Option<ConstructFn>,
    on_get: Option<Hook>,
    on_set: Option<Hook>,
}

impl HookSet {
    #[inline]
    pub fn on_construct(&self) -> Option<&ConstructFn> {
        self.on_construct.as_ref()
    }

    #[inline]
    pub fn on_get(&self) -> Option<&Hook> {
        self.on_get.as_ref()
    }

    #[inline]
    pub fn on_set(&self) -> Option<&Hook> {
        self.on_set.as_ref()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.on_construct.is_none() && self.on_get.is_none() && self.on_set.is_none()
    }
}

// -----------------------------------------------------------------------------
// Descriptor

/// One attachment of a behavior to a class or a property.
///
/// The payload is whatever the attachment point supplied: an alias string, a
/// cast target, a flag set. It is stored type-erased and read back with
/// [`payload`](Self::payload).
pub struct Descriptor {
    id: BehaviorId,
    multiple: bool,
    requires_wrapping: bool,
    payload: Option<Arc<dyn Any + Send + Sync>>,
    hooks: HookSet,
}

impl Descriptor {
    /// Creates a descriptor for behavior `B` with no payload and no hooks.
    pub fn new<B: Behavior>() -> Self {
        Self {
            id: BehaviorId::of::<B>(),
            multiple: B::MULTIPLE,
            requires_wrapping: B::REQUIRES_WRAPPING,
            payload: None,
            hooks: HookSet::default(),
        }
    }

    /// Sets the payload, replacing any previous one.
    pub fn with_payload<T: Any + Send + Sync>(mut self, payload: T) -> Self {
        self.payload = Some(Arc::new(payload));
        self
    }

    pub fn on_construct(
        mut self,
        hook: impl Fn(&HookContext<'_>) + Send + Sync + 'static,
    ) -> Self {
        self.hooks.on_construct = Some(Arc::new(hook));
        self
    }

    pub fn on_get(mut self, hook: impl Into<Hook>) -> Self {
        self.hooks.on_get = Some(hook.into());
        self
    }

    pub fn on_set(mut self, hook: impl Into<Hook>) -> Self {
        self.hooks.on_set = Some(hook.into());
        self
    }

    #[inline]
    pub fn id(&self) -> BehaviorId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.id.name
    }

    #[inline]
    pub fn is_multiple(&self) -> bool {
        self.multiple
    }

    /// Whether this descriptor does anything on a plain, never-wrapped instance.
    ///
    /// Any hook makes the answer "no", since hooks only run through a wrapper.
    #[inline]
    pub fn requires_wrapping(&self) -> bool {
        self.requires_wrapping || !self.hooks.is_empty()
    }

    /// Returns the payload if it has type `T`.
    #[inline]
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.as_deref()?.downcast_ref::<T>()
    }

    #[inline]
    pub fn hooks(&self) -> &HookSet {
        &self.hooks
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("behavior", &self.id.name)
            .field("multiple", &self.multiple)
            .field("payload", &self.payload.is_some())
            .field("on_construct", &self.hooks.on_construct.is_some())
            .field("on_get", &self.hooks.on_get.is_some())
            .field("on_set", &self.hooks.on_set.is_some())
            .finish()
    }
}
