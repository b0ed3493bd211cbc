use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, Ref, RefCell};
use core::fmt;

use crate::behavior::builtin::{ChangeFn, OnChange, Validator};
use crate::behavior::{Access, BehaviorId, HookContext, Step};
use crate::class::{Class, Instance};
use crate::registry::{self, get_class_definition};
use crate::validate::ValidityRecord;
use crate::value::{Map, Value};

// -----------------------------------------------------------------------------
// WrapState

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum WrapState {
    /// A plain instance, no behavior involved.
    Unwrapped,
    /// Construct hooks and the initial re-apply are running.
    Wrapping,
    /// All access is mediated.
    Wrapped,
}

// -----------------------------------------------------------------------------
// Entity

struct EntityInner {
    class: Class,
    store: RefCell<Instance>,
    validity: RefCell<ValidityRecord>,
    state: Cell<WrapState>,
    suspended: Cell<u32>,
}

/// A wrapped instance.
///
/// `Entity` is a shared handle: clones refer to the same instance, and
/// identity is [`ptr_eq`](Self::ptr_eq). The wrapper exclusively owns the
/// plain store, which lives as long as the last handle.
///
/// Entities are single-threaded (`!Send`), matching the engine's synchronous
/// model.
///
/// Equality (`==`) is structural: same class and equal stores. Comparing
/// instances that reach themselves does not terminate.
#[derive(Clone)]
pub struct Entity(Rc<EntityInner>);

impl Entity {
    pub(crate) fn wrap_instance(instance: Instance) -> Entity {
        Self::wrap_with(instance, true)
    }

    /// Wraps an instance a traversal is about to populate.
    ///
    /// The constructed state is not validated, since it is about to be
    /// overwritten. The traversal validates once it is done, if asked to.
    pub(crate) fn wrap_deferred(instance: Instance) -> Entity {
        Self::wrap_with(instance, false)
    }

    fn wrap_with(instance: Instance, validate: bool) -> Entity {
        let class = instance.class().clone();
        registry::mark_wrapped(&class);

        let entity = Entity(Rc::new(EntityInner {
            class,
            store: RefCell::new(instance),
            validity: RefCell::new(ValidityRecord::default()),
            state: Cell::new(WrapState::Wrapping),
            suspended: Cell::new(0),
        }));

        entity.run_construct_hooks();

        let keys: Vec<String> = entity.store().keys().map(String::from).collect();
        for key in &keys {
            let current = entity.raw(key).unwrap_or_default();
            entity.write_through(key, current);
        }

        entity.0.state.set(WrapState::Wrapped);

        if validate && entity.has_validators() {
            entity.validate();
        }

        log::trace!("wrapped instance of `{}`", entity.0.class);
        entity
    }

    #[inline]
    pub fn class(&self) -> &Class {
        &self.0.class
    }

    #[inline]
    pub fn state(&self) -> WrapState {
        self.0.state.get()
    }

    /// Whether two handles refer to the same instance.
    #[inline]
    pub fn ptr_eq(this: &Entity, other: &Entity) -> bool {
        Rc::ptr_eq(&this.0, &other.0)
    }

    /// A stable address for identity sets during traversal.
    #[inline]
    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    /// Borrows the plain store.
    ///
    /// # Panics
    ///
    /// Panics if called while the store is being written, which only a hook
    /// holding this borrow across a set could cause.
    #[inline]
    pub fn store(&self) -> Ref<'_, Instance> {
        self.0.store.borrow()
    }

    /// Own keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.store().keys().map(String::from).collect()
    }

    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.store().contains(key)
    }

    /// Reads the stored value, bypassing every hook.
    #[inline]
    pub fn raw(&self, key: &str) -> Option<Value> {
        self.store().get(key).cloned()
    }

    /// Writes the stored value, bypassing every hook and validation.
    ///
    /// Returns the value previously stored.
    #[inline]
    pub(crate) fn write_raw(&self, key: &str, value: Value) -> Option<Value> {
        self.0.store.borrow_mut().set(key, value)
    }

    /// Reads a property through the get pipeline.
    ///
    /// A missing key reads as `Null` before hooks run.
    pub fn get(&self, key: &str) -> Value {
        let (class_level, property_level) = registry::compose_access(&self.0.class, key);

        let mut value = self.raw(key).unwrap_or_default();
        let chain = class_level.iter().rev().chain(property_level.iter().rev());
        for descriptor in chain {
            let Some(hook) = descriptor.hooks().on_get() else {
                continue;
            };
            let ctx = HookContext::new(self, Some(key), descriptor, Access::Get);
            match hook.apply(&ctx, value) {
                Step::Continue(next) => value = next,
                Step::Stop(last) => {
                    value = last;
                    break;
                }
            }
        }
        value
    }

    /// Writes a property through the set pipeline.
    ///
    /// Once wrapped, a property with validators is re-validated after the
    /// write, unless validation is suspended by an ongoing traversal.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        self.write_through(key, value.into());

        if self.state() == WrapState::Wrapped
            && self.0.suspended.get() == 0
            && self.has_property_validators(key)
        {
            self.validate_property(key);
        }
    }

    /// Reads every own property through the get pipeline.
    pub fn get_all(&self) -> Map {
        self.keys()
            .into_iter()
            .map(|key| {
                let value = self.get(&key);
                (key, value)
            })
            .collect()
    }

    fn write_through(&self, key: &str, value: Value) {
        let (class_level, property_level) = registry::compose_access(&self.0.class, key);

        let mut value = value;
        for descriptor in property_level.iter().chain(class_level.iter()) {
            let Some(hook) = descriptor.hooks().on_set() else {
                continue;
            };
            let ctx = HookContext::new(self, Some(key), descriptor, Access::Set);
            match hook.apply(&ctx, value) {
                Step::Continue(next) => value = next,
                Step::Stop(last) => {
                    value = last;
                    break;
                }
            }
        }

        let id = BehaviorId::of::<OnChange>();
        let watchers: Vec<&ChangeFn> = property_level
            .group(id)
            .chain(class_level.group(id))
            .filter_map(|descriptor| descriptor.payload::<ChangeFn>())
            .collect();
        if watchers.is_empty() || self.state() == WrapState::Wrapping {
            self.write_raw(key, value);
            return;
        }

        let old = self.write_raw(key, value.clone()).unwrap_or_default();
        if old != value {
            for watcher in watchers {
                watcher(key, &old, &value);
            }
        }
    }

    fn run_construct_hooks(&self) {
        let composed = get_class_definition(&self.0.class);

        for descriptor in composed.descriptors() {
            if let Some(hook) = descriptor.hooks().on_construct() {
                hook(&HookContext::new(self, None, descriptor, Access::Construct));
            }
        }
        for property in composed.properties() {
            for descriptor in property.descriptors() {
                if let Some(hook) = descriptor.hooks().on_construct() {
                    let ctx = HookContext::new(self, Some(property.key()), descriptor, Access::Construct);
                    hook(&ctx);
                }
            }
        }
    }

    #[inline]
    pub(crate) fn validity(&self) -> &RefCell<ValidityRecord> {
        &self.0.validity
    }

    pub(crate) fn has_validators(&self) -> bool {
        let id = BehaviorId::of::<Validator>();
        get_class_definition(&self.0.class)
            .properties()
            .iter()
            .any(|property| property.descriptors().contains(id))
    }

    fn has_property_validators(&self, key: &str) -> bool {
        registry::get_property_definition(&self.0.class, key)
            .descriptors()
            .contains(BehaviorId::of::<Validator>())
    }

    /// Suspends per-set validation until the guard drops.
    pub(crate) fn suspend_validation(&self) -> SuspendGuard {
        self.0.suspended.set(self.0.suspended.get() + 1);
        SuspendGuard(self.clone())
    }
}

pub(crate) struct SuspendGuard(Entity);

impl Drop for SuspendGuard {
    fn drop(&mut self) {
        let inner = &self.0.0;
        inner.suspended.set(inner.suspended.get().saturating_sub(1));
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        Entity::ptr_eq(self, other) || *self.store() == *other.store()
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Entity");
        debug.field("class", &self.0.class);
        debug.field("state", &self.state());
        match self.0.store.try_borrow() {
            Ok(store) => debug.field("keys", &store.keys().collect::<Vec<_>>()),
            Err(_) => debug.field("keys", &"<borrowed>"),
        };
        debug.finish()
    }
}

// -----------------------------------------------------------------------------
// Tests
