//! The process-wide definition store and the inheritance composer.
//!
//! ## Menu
//!
//! - [`attach`]: records a [`Descriptor`] on a class or a property, failing
//!   fast on a duplicate single-use behavior.
//! - [`get_class_definition`] / [`get_property_definition`]: inheritance
//!   merged, read-only views.
//! - [`filter_definition`]: narrows a view to one behavior.
//! - [`verify`]: drains the deferred consistency checks.
//! - [`own_definition`]: what a single class declared itself.
//!
//! ## Lifecycle
//!
//! The store is populated while classes are declared and read for the rest of
//! the process. It is never torn down. Access goes through an `RwLock`, so
//! registration from several threads is serialized, but hooks always run
//! after the lock is released.

// -----------------------------------------------------------------------------
// Modules

mod compose;
mod definition;
mod verify;

// -----------------------------------------------------------------------------
// Exports

pub use compose::{ComposedClassDefinition, ComposedPropertyDefinition};
pub use compose::{Definable, FilterDefinition, filter_definition};
pub use compose::{get_class_definition, get_property_definition};
pub use definition::{ClassDefinition, Descriptors, PropertyDefinition};
pub use verify::{UsageWarning, verify};

pub(crate) use compose::compose_access;

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use std::sync::{LazyLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::behavior::Descriptor;
use crate::class::{Class, ClassId};
use crate::error::DefinitionError;
use crate::hash::HashMap;

// -----------------------------------------------------------------------------
// DefinitionStore

struct PendingCheck {
    class: Class,
    key: Option<String>,
    behavior: &'static str,
}

#[derive(Default)]
struct DefinitionStore {
    classes: HashMap<ClassId, ClassDefinition>,
    wrapped: HashMap<ClassId, Class>,
    pending: Vec<PendingCheck>,
}

impl DefinitionStore {
    #[inline]
    fn get(&self, class: &Class) -> Option<&ClassDefinition> {
        self.classes.get(&class.id())
    }

    fn entry(&mut self, class: &Class) -> &mut ClassDefinition {
        self.classes
            .entry(class.id())
            .or_insert_with(|| ClassDefinition::new(class.clone()))
    }

    /// `true` if the class, or any class inheriting from it, was wrapped.
    fn is_initialized(&self, class: &Class) -> bool {
        self.wrapped.contains_key(&class.id())
            || self
                .wrapped
                .values()
                .any(|wrapped| wrapped.is_subclass_of(class))
    }
}

static STORE: LazyLock<RwLock<DefinitionStore>> =
    LazyLock::new(|| RwLock::new(DefinitionStore::default()));

fn read() -> RwLockReadGuard<'static, DefinitionStore> {
    STORE.read().unwrap_or_else(PoisonError::into_inner)
}

fn write() -> RwLockWriteGuard<'static, DefinitionStore> {
    STORE.write().unwrap_or_else(PoisonError::into_inner)
}

// -----------------------------------------------------------------------------
// Registration

/// Where a descriptor is attached.
#[derive(Copy, Clone, Debug)]
pub enum Target<'a> {
    Class(&'a Class),
    Property(&'a Class, &'a str),
}

impl<'a> Target<'a> {
    #[inline]
    pub fn class(&self) -> &'a Class {
        match *self {
            Target::Class(class) | Target::Property(class, _) => class,
        }
    }

    #[inline]
    pub fn key(&self) -> Option<&'a str> {
        match *self {
            Target::Class(_) => None,
            Target::Property(_, key) => Some(key),
        }
    }
}

/// Attaches a behavior descriptor.
///
/// Fails if a descriptor of the same single-use behavior is already attached
/// to this exact owner. Ancestors are not consulted: a subclass may re-attach
/// a behavior its parent carries, and both stay in the composed view.
///
/// A descriptor that needs a wrapped instance, attached to a class that has
/// not been wrapped yet, is queued for [`verify`].
pub fn attach(target: Target<'_>, descriptor: Descriptor) -> Result<(), DefinitionError> {
    let class = target.class();
    let descriptor = Arc::new(descriptor);

    let mut store = write();
    match target.key() {
        None => store.entry(class).push(descriptor.clone())?,
        Some(key) => store
            .entry(class)
            .property_mut(key)
            .push(descriptor.clone())?,
    }

    if descriptor.requires_wrapping() && !store.is_initialized(class) {
        store.pending.push(PendingCheck {
            class: class.clone(),
            key: target.key().map(String::from),
            behavior: descriptor.name(),
        });
    }

    log::trace!(
        "attached `{}` to `{class}`{}",
        descriptor.name(),
        target.key().map(|k| alloc::format!(".{k}")).unwrap_or_default(),
    );
    Ok(())
}

/// Records a class, so it has a definition even without any behavior.
pub(crate) fn declare(class: &Class) {
    write().entry(class);
}

/// Records that instances of a class are being wrapped.
pub(crate) fn mark_wrapped(class: &Class) {
    if read().wrapped.contains_key(&class.id()) {
        return;
    }
    let mut store = write();
    store.entry(class);
    store.wrapped.insert(class.id(), class.clone());
}

/// A snapshot of what one class declared itself, ancestors excluded.
pub fn own_definition(class: &Class) -> Option<ClassDefinition> {
    read().get(class).cloned()
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;

    use super::{Target, attach, get_class_definition, get_property_definition, own_definition};
    use crate::behavior::builtin::{Alias, OnChange, alias, on_change, validate};
    use crate::behavior::{Behavior, BehaviorId, Descriptor};
    use crate::class::Class;
    use crate::error::DefinitionError;
    use crate::registry::filter_definition;
    use crate::validate::Provider;

    struct Marker;

    impl Behavior for Marker {
        const NAME: &'static str = "marker";
    }

    #[test]
    fn duplicate_single_use_behavior_fails_fast() {
        let class = Class::builder("Dup").build().unwrap();
        attach(Target::Property(&class, "a"), alias("x")).unwrap();

        let err = attach(Target::Property(&class, "a"), alias("y")).unwrap_err();
        assert!(matches!(
            err,
            DefinitionError::DuplicateBehavior { behavior: "alias", key: Some(_), .. }
        ));

        // Multiple-permitted behaviors accumulate.
        attach(Target::Property(&class, "a"), on_change(|_, _, _| {})).unwrap();
        attach(Target::Property(&class, "a"), on_change(|_, _, _| {})).unwrap();

        let own = own_definition(&class).unwrap();
        let property = own.property("a").unwrap();
        assert_eq!(property.get(BehaviorId::of::<OnChange>()).count(), 2);
        assert_eq!(property.get(BehaviorId::of::<Alias>()).count(), 1);
    }

    #[test]
    fn builder_reports_duplicates() {
        let result = Class::builder("Twice")
            .behavior(Descriptor::new::<Marker>())
            .behavior(Descriptor::new::<Marker>())
            .build();
        assert!(matches!(
            result,
            Err(DefinitionError::DuplicateBehavior { behavior: "marker", key: None, .. })
        ));
    }

    #[test]
    fn composition_shares_descriptors_ancestor_first() {
        let base = Class::builder("Base")
            .behavior(Descriptor::new::<Marker>())
            .property("name", alias("n"))
            .build()
            .unwrap();
        let derived = Class::builder("Derived")
            .extends(&base)
            .behavior(Descriptor::new::<Marker>())
            .property("name", validate(Provider::function(|_, _| true)))
            .property("age", alias("a"))
            .build()
            .unwrap();

        let composed = get_class_definition(&derived);
        assert_eq!(composed.descriptors().len(), 2);
        let keys: Vec<&str> = composed.properties().iter().map(|p| p.key()).collect();
        assert_eq!(keys, ["name", "age"]);

        let name = composed.property("name").unwrap();
        let names: Vec<&str> = name.descriptors().iter().map(|d| d.name()).collect();
        assert_eq!(names, ["alias", "validate"]);

        // The same descriptor instances as walking the chain by hand.
        let base_own = own_definition(&base).unwrap();
        let manual = base_own.property("name").unwrap().descriptors().iter().next().unwrap();
        let composed_first = name.descriptors().iter().next().unwrap();
        assert!(Arc::ptr_eq(manual, composed_first));

        // The base is unaffected by its subclass.
        assert_eq!(get_property_definition(&base, "name").descriptors().len(), 1);
        assert!(get_property_definition(&base, "age").is_empty());
    }

    #[test]
    fn filter_keeps_shape() {
        let class = Class::builder("Filtered")
            .property("a", alias("x"))
            .property("a", on_change(|_, _, _| {}))
            .property("b", on_change(|_, _, _| {}))
            .build()
            .unwrap();

        let composed = get_class_definition(&class);
        let only_alias = filter_definition(&composed, BehaviorId::of::<Alias>());
        assert_eq!(only_alias.properties().len(), 2);
        assert_eq!(only_alias.property("a").unwrap().descriptors().len(), 1);
        assert!(only_alias.property("b").unwrap().is_empty());
    }
}
