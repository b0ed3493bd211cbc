use alloc::string::String;
use alloc::vec::Vec;

use super::definition::Descriptors;
use crate::behavior::BehaviorId;
use crate::class::{Class, Instance};
use crate::hash::HashMap;
use crate::instance::Entity;
use crate::value::Value;

// -----------------------------------------------------------------------------
// Definable

/// Anything a definition can be looked up for.
///
/// Instances resolve to their class. Values that are not entities resolve to
/// nothing, which yields an empty definition rather than an error.
pub trait Definable {
    fn definition_class(&self) -> Option<Class>;
}

impl Definable for Class {
    #[inline]
    fn definition_class(&self) -> Option<Class> {
        Some(self.clone())
    }
}

impl Definable for Instance {
    #[inline]
    fn definition_class(&self) -> Option<Class> {
        Some(self.class().clone())
    }
}

impl Definable for Entity {
    #[inline]
    fn definition_class(&self) -> Option<Class> {
        Some(self.class().clone())
    }
}

impl Definable for Value {
    #[inline]
    fn definition_class(&self) -> Option<Class> {
        match self {
            Value::Entity(entity) => Some(entity.class().clone()),
            _ => None,
        }
    }
}

impl<T: Definable + ?Sized> Definable for &T {
    #[inline]
    fn definition_class(&self) -> Option<Class> {
        (**self).definition_class()
    }
}

// -----------------------------------------------------------------------------
// ComposedPropertyDefinition

/// The inheritance-merged descriptors of one property.
///
/// Ancestor descriptors come first, the most specific owner's last.
#[derive(Clone, Debug)]
pub struct ComposedPropertyDefinition {
    key: String,
    descriptors: Descriptors,
}

impl ComposedPropertyDefinition {
    #[inline]
    pub(crate) fn empty(key: &str) -> Self {
        Self {
            key: String::from(key),
            descriptors: Descriptors::new(),
        }
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn descriptors(&self) -> &Descriptors {
        &self.descriptors
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Shorthand for `descriptors().payload(id)`.
    #[inline]
    pub fn payload<T: 'static>(&self, id: BehaviorId) -> Option<&T> {
        self.descriptors.payload(id)
    }

    pub fn filter(&self, id: BehaviorId) -> Self {
        Self {
            key: self.key.clone(),
            descriptors: self.descriptors.filtered(id),
        }
    }
}

// -----------------------------------------------------------------------------
// ComposedClassDefinition

/// The inheritance-merged view of a class: its class-level descriptors and
/// every decorated property, ancestors first.
///
/// Composing never copies descriptors, it only collects `Arc`s to the ones
/// owned by the store.
#[derive(Clone, Debug, Default)]
pub struct ComposedClassDefinition {
    class: Option<Class>,
    descriptors: Descriptors,
    properties: Vec<ComposedPropertyDefinition>,
    property_indices: HashMap<String, usize>,
}

impl ComposedClassDefinition {
    /// The class this was composed for, `None` for the empty definition.
    #[inline]
    pub fn class(&self) -> Option<&Class> {
        self.class.as_ref()
    }

    /// Class-level descriptors.
    #[inline]
    pub fn descriptors(&self) -> &Descriptors {
        &self.descriptors
    }

    #[inline]
    pub fn properties(&self) -> &[ComposedPropertyDefinition] {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&ComposedPropertyDefinition> {
        self.property_indices
            .get(key)
            .map(|&index| &self.properties[index])
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty() && self.properties.iter().all(|p| p.is_empty())
    }

    pub fn filter(&self, id: BehaviorId) -> Self {
        let mut filtered = Self {
            class: self.class.clone(),
            descriptors: self.descriptors.filtered(id),
            ..Self::default()
        };
        for property in &self.properties {
            filtered.push_property(property.filter(id));
        }
        filtered
    }

    fn push_property(&mut self, property: ComposedPropertyDefinition) {
        self.property_indices
            .insert(property.key.clone(), self.properties.len());
        self.properties.push(property);
    }

    fn property_entry(&mut self, key: &str) -> &mut ComposedPropertyDefinition {
        let index = match self.property_indices.get(key) {
            Some(&index) => index,
            None => {
                self.push_property(ComposedPropertyDefinition::empty(key));
                self.properties.len() - 1
            }
        };
        &mut self.properties[index]
    }
}

// -----------------------------------------------------------------------------
// Filter

/// Definitions that can be narrowed to a single behavior.
pub trait FilterDefinition: Sized {
    fn filter_definition(&self, id: BehaviorId) -> Self;
}

impl FilterDefinition for ComposedClassDefinition {
    #[inline]
    fn filter_definition(&self, id: BehaviorId) -> Self {
        self.filter(id)
    }
}

impl FilterDefinition for ComposedPropertyDefinition {
    #[inline]
    fn filter_definition(&self, id: BehaviorId) -> Self {
        self.filter(id)
    }
}

/// Returns a same-shaped definition holding only descriptors of `id`.
#[inline]
pub fn filter_definition<D: FilterDefinition>(definition: &D, id: BehaviorId) -> D {
    definition.filter_definition(id)
}

// -----------------------------------------------------------------------------
// Composer

/// Composes the definition of a class, or of the class of an instance.
///
/// Walks the ancestor chain and concatenates each owner's own records,
/// root first.
///
/// # Examples
///
/// ```
/// use vc_model::behavior::{BehaviorId, builtin::{Alias, alias}};
/// use vc_model::class::Class;
/// use vc_model::registry::get_class_definition;
/// use vc_model::value::Value;
///
/// let base = Class::builder("Base")
///     .property("name", alias("base_name"))
///     .build()
///     .unwrap();
/// let derived = Class::builder("Derived")
///     .extends(&base)
///     .property("name", alias("derived_name"))
///     .build()
///     .unwrap();
///
/// let composed = get_class_definition(&derived);
/// let name = composed.property("name").unwrap();
/// assert_eq!(name.descriptors().len(), 2);
/// assert_eq!(
///     name.payload::<String>(BehaviorId::of::<Alias>()).map(String::as_str),
///     Some("derived_name"),
/// );
///
/// assert!(get_class_definition(&Value::from(3)).is_empty());
/// ```
pub fn get_class_definition<T: Definable + ?Sized>(target: &T) -> ComposedClassDefinition {
    let Some(class) = target.definition_class() else {
        return ComposedClassDefinition::default();
    };

    let lineage = class.lineage();
    let store = super::read();

    let mut composed = ComposedClassDefinition {
        class: Some(class),
        ..ComposedClassDefinition::default()
    };
    for owner in &lineage {
        let Some(own) = store.get(owner) else {
            continue;
        };
        composed.descriptors.extend_from(own.descriptors());
        for property in own.properties() {
            composed
                .property_entry(property.key())
                .descriptors
                .extend_from(property.descriptors());
        }
    }
    composed
}

/// Composes the definition of one property.
///
/// A property nobody decorated yields an empty definition.
pub fn get_property_definition<T: Definable + ?Sized>(
    target: &T,
    key: &str,
) -> ComposedPropertyDefinition {
    let mut composed = ComposedPropertyDefinition::empty(key);
    let Some(class) = target.definition_class() else {
        return composed;
    };

    let lineage = class.lineage();
    let store = super::read();
    for owner in &lineage {
        if let Some(property) = store.get(owner).and_then(|own| own.property(key)) {
            composed.descriptors.extend_from(property.descriptors());
        }
    }
    composed
}

/// Composes the class-level descriptors and one property's descriptors.
///
/// This is the pair the interception pipelines run through.
pub(crate) fn compose_access(class: &Class, key: &str) -> (Descriptors, Descriptors) {
    let lineage = class.lineage();
    let store = super::read();

    let mut class_level = Descriptors::new();
    let mut property_level = Descriptors::new();
    for owner in &lineage {
        let Some(own) = store.get(owner) else {
            continue;
        };
        class_level.extend_from(own.descriptors());
        if let Some(property) = own.property(key) {
            property_level.extend_from(property.descriptors());
        }
    }
    (class_level, property_level)
}
