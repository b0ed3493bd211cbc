use alloc::string::String;

use super::Class;
use crate::value::{Map, Value};

// -----------------------------------------------------------------------------
// Instance

/// A plain, undecorated instance: a class plus its own field store.
///
/// Reads and writes here never run behaviors. Once wrapped, the instance is
/// owned by its [`Entity`](crate::instance::Entity) and this is the store the
/// pipelines finally read from and write to.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    class: Class,
    fields: Map,
}

impl Instance {
    #[inline]
    pub(crate) fn new(class: Class, fields: Map) -> Self {
        Self { class, fields }
    }

    #[inline]
    pub fn class(&self) -> &Class {
        &self.class
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    #[inline]
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(key, value)
    }

    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Own keys in insertion order.
    #[inline]
    pub fn keys(&self) -> impl ExactSizeIterator<Item = &str> {
        self.fields.keys()
    }

    #[inline]
    pub fn fields(&self) -> &Map {
        &self.fields
    }

    #[inline]
    pub fn into_fields(self) -> Map {
        self.fields
    }
}
