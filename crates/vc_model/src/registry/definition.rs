use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::behavior::{BehaviorId, Descriptor};
use crate::class::Class;
use crate::error::DefinitionError;
use crate::hash::HashMap;

// -----------------------------------------------------------------------------
// Descriptors

/// An ordered list of attached descriptors.
///
/// Order is application order. Lookups by identity keep that order.
#[derive(Clone, Default, Debug)]
pub struct Descriptors {
    list: Vec<Arc<Descriptor>>,
}

impl Descriptors {
    #[inline]
    pub(crate) const fn new() -> Self {
        Self { list: Vec::new() }
    }

    #[inline]
    pub(crate) fn extend_from(&mut self, other: &Descriptors) {
        self.list.extend(other.list.iter().cloned());
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Arc<Descriptor>> {
        self.list.iter()
    }

    #[inline]
    pub fn contains(&self, id: BehaviorId) -> bool {
        self.list.iter().any(|d| d.id() == id)
    }

    /// All descriptors of one behavior, in order.
    pub fn group(&self, id: BehaviorId) -> impl DoubleEndedIterator<Item = &Arc<Descriptor>> {
        self.list.iter().filter(move |d| d.id() == id)
    }

    /// The payload of the last descriptor of the behavior that carries a `T`.
    ///
    /// In a composed definition the last one is the most specific owner's.
    pub fn payload<T: 'static>(&self, id: BehaviorId) -> Option<&T> {
        self.group(id).rev().find_map(|d| d.payload::<T>())
    }

    pub(crate) fn filtered(&self, id: BehaviorId) -> Self {
        Self {
            list: self.group(id).cloned().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Descriptors {
    type Item = &'a Arc<Descriptor>;
    type IntoIter = core::slice::Iter<'a, Arc<Descriptor>>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.list.iter()
    }
}

// -----------------------------------------------------------------------------
// PropertyDefinition

/// Descriptors attached directly to one property of one owner.
#[derive(Clone, Debug)]
pub struct PropertyDefinition {
    owner: Class,
    key: String,
    descriptors: Descriptors,
    by_id: HashMap<BehaviorId, Vec<usize>>,
}

impl PropertyDefinition {
    pub(crate) fn new(owner: Class, key: String) -> Self {
        Self {
            owner,
            key,
            descriptors: Descriptors::new(),
            by_id: HashMap::default(),
        }
    }

    #[inline]
    pub fn owner(&self) -> &Class {
        &self.owner
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn descriptors(&self) -> &Descriptors {
        &self.descriptors
    }

    /// Descriptors of one behavior, found through the identity index.
    pub fn get(&self, id: BehaviorId) -> impl Iterator<Item = &Arc<Descriptor>> {
        self.by_id
            .get(&id)
            .into_iter()
            .flatten()
            .map(|&index| &self.descriptors.list[index])
    }

    pub(crate) fn push(&mut self, descriptor: Arc<Descriptor>) -> Result<(), DefinitionError> {
        let indices = self.by_id.entry(descriptor.id()).or_default();
        if !indices.is_empty() && !descriptor.is_multiple() {
            return Err(DefinitionError::DuplicateBehavior {
                behavior: descriptor.name(),
                owner: String::from(self.owner.name()),
                key: Some(self.key.clone()),
            });
        }
        indices.push(self.descriptors.list.len());
        self.descriptors.list.push(descriptor);
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// ClassDefinition

/// Everything attached directly to one class, excluding its ancestors.
#[derive(Clone, Debug)]
pub struct ClassDefinition {
    owner: Class,
    descriptors: Descriptors,
    properties: Vec<PropertyDefinition>,
    property_indices: HashMap<String, usize>,
}

impl ClassDefinition {
    pub(crate) fn new(owner: Class) -> Self {
        Self {
            owner,
            descriptors: Descriptors::new(),
            properties: Vec::new(),
            property_indices: HashMap::default(),
        }
    }

    #[inline]
    pub fn owner(&self) -> &Class {
        &self.owner
    }

    /// Class-level descriptors.
    #[inline]
    pub fn descriptors(&self) -> &Descriptors {
        &self.descriptors
    }

    /// Property definitions in the order they were first decorated.
    #[inline]
    pub fn properties(&self) -> &[PropertyDefinition] {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&PropertyDefinition> {
        self.property_indices
            .get(key)
            .map(|&index| &self.properties[index])
    }

    pub(crate) fn push(&mut self, descriptor: Arc<Descriptor>) -> Result<(), DefinitionError> {
        if !descriptor.is_multiple() && self.descriptors.contains(descriptor.id()) {
            return Err(DefinitionError::DuplicateBehavior {
                behavior: descriptor.name(),
                owner: String::from(self.owner.name()),
                key: None,
            });
        }
        self.descriptors.list.push(descriptor);
        Ok(())
    }

    /// Gets the property definition, creating it on first use.
    pub(crate) fn property_mut(&mut self, key: &str) -> &mut PropertyDefinition {
        let index = match self.property_indices.get(key) {
            Some(&index) => index,
            None => {
                let index = self.properties.len();
                self.properties
                    .push(PropertyDefinition::new(self.owner.clone(), String::from(key)));
                self.property_indices.insert(String::from(key), index);
                index
            }
        };
        &mut self.properties[index]
    }
}
