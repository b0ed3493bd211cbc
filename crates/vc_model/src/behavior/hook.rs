use alloc::sync::Arc;
use core::any::Any;
use core::fmt;

use super::Descriptor;
use crate::instance::{Entity, WrapState};
use crate::value::Value;

// -----------------------------------------------------------------------------
// Function types

pub type TransformFn = Arc<dyn Fn(&HookContext<'_>, Value) -> Value + Send + Sync>;
pub type TapFn = Arc<dyn Fn(&HookContext<'_>, &Value) + Send + Sync>;
pub type ConstructFn = Arc<dyn Fn(&HookContext<'_>) + Send + Sync>;

// -----------------------------------------------------------------------------
// Hook

/// A get or set strategy.
///
/// - `Transform` maps the value and passes it on.
/// - `Staged` observes the value before and after an optional transform.
///   The taps never alter the value.
/// - `Intercept` maps the value and ends the chain: on set its output is
///   written as-is, on get it is returned as-is.
#[derive(Clone)]
pub enum Hook {
    Transform(TransformFn),
    Staged(Staged),
    Intercept(TransformFn),
}

impl Hook {
    pub fn transform(f: impl Fn(&HookContext<'_>, Value) -> Value + Send + Sync + 'static) -> Self {
        Hook::Transform(Arc::new(f))
    }

    pub fn intercept(f: impl Fn(&HookContext<'_>, Value) -> Value + Send + Sync + 'static) -> Self {
        Hook::Intercept(Arc::new(f))
    }

    /// Runs this stage.
    pub(crate) fn apply(&self, ctx: &HookContext<'_>, value: Value) -> Step {
        match self {
            Hook::Transform(f) => Step::Continue(f(ctx, value)),
            Hook::Intercept(f) => Step::Stop(f(ctx, value)),
            Hook::Staged(staged) => {
                if let Some(before) = &staged.before {
                    before(ctx, &value);
                }
                let value = match &staged.transform {
                    Some(transform) => transform(ctx, value),
                    None => value,
                };
                if let Some(after) = &staged.after {
                    after(ctx, &value);
                }
                Step::Continue(value)
            }
        }
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hook::Transform(_) => f.write_str("Transform"),
            Hook::Staged(staged) => f
                .debug_struct("Staged")
                .field("before", &staged.before.is_some())
                .field("transform", &staged.transform.is_some())
                .field("after", &staged.after.is_some())
                .finish(),
            Hook::Intercept(_) => f.write_str("Intercept"),
        }
    }
}

pub(crate) enum Step {
    Continue(Value),
    Stop(Value),
}

// -----------------------------------------------------------------------------
// Staged

/// A `{before, transform, after}` triple.
///
/// # Examples
///
/// ```
/// use vc_model::behavior::{Hook, Staged};
/// use vc_model::value::Value;
///
/// let hook: Hook = Staged::new()
///     .before(|ctx, value| assert!(ctx.key().is_some() || value.is_null()))
///     .transform(|_, value| match value {
///         Value::String(s) => Value::String(s.trim().to_owned()),
///         other => other,
///     })
///     .into();
/// # let _ = hook;
/// ```
#[derive(Clone, Default)]
pub struct Staged {
    before: Option<TapFn>,
    transform: Option<TransformFn>,
    after: Option<TapFn>,
}

impl Staged {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before(mut self, f: impl Fn(&HookContext<'_>, &Value) + Send + Sync + 'static) -> Self {
        self.before = Some(Arc::new(f));
        self
    }

    pub fn transform(
        mut self,
        f: impl Fn(&HookContext<'_>, Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.transform = Some(Arc::new(f));
        self
    }

    pub fn after(mut self, f: impl Fn(&HookContext<'_>, &Value) + Send + Sync + 'static) -> Self {
        self.after = Some(Arc::new(f));
        self
    }
}

impl From<Staged> for Hook {
    #[inline]
    fn from(value: Staged) -> Self {
        Hook::Staged(value)
    }
}

// -----------------------------------------------------------------------------
// HookContext

/// Which kind of access triggered a hook.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Access {
    Construct,
    Get,
    Set,
}

/// What a hook sees when it runs.
pub struct HookContext<'a> {
    entity: &'a Entity,
    key: Option<&'a str>,
    descriptor: &'a Descriptor,
    access: Access,
}

impl<'a> HookContext<'a> {
    #[inline]
    pub(crate) fn new(
        entity: &'a Entity,
        key: Option<&'a str>,
        descriptor: &'a Descriptor,
        access: Access,
    ) -> Self {
        Self {
            entity,
            key,
            descriptor,
            access,
        }
    }

    /// The wrapped instance being accessed.
    #[inline]
    pub fn entity(&self) -> &'a Entity {
        self.entity
    }

    /// The property being accessed.
    ///
    /// Always `Some` on get and set. `None` only for class-level construct hooks.
    #[inline]
    pub fn key(&self) -> Option<&'a str> {
        self.key
    }

    #[inline]
    pub fn descriptor(&self) -> &'a Descriptor {
        self.descriptor
    }

    #[inline]
    pub fn payload<T: Any>(&self) -> Option<&'a T> {
        self.descriptor.payload::<T>()
    }

    #[inline]
    pub fn access(&self) -> Access {
        self.access
    }

    /// `true` while the engine re-applies the constructed state.
    #[inline]
    pub fn is_wrapping(&self) -> bool {
        self.entity.state() == WrapState::Wrapping
    }
}
