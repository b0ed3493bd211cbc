//! Classes and plain instances.
//!
//! A [`Class`] is a named, shareable handle with a stable identity
//! ([`ClassId`]), an optional parent and an ordered list of field
//! declarations. Constructing a class produces a plain [`Instance`]: fields
//! are filled ancestor-first from their default factories, then every
//! initializer in the chain runs, root first.
//!
//! A plain instance carries no behavior. Wrapping it (see
//! [`wrap`](crate::instance::wrap)) is what routes access through the
//! interception pipelines.

// -----------------------------------------------------------------------------
// Modules

mod builder;
mod instance;

// -----------------------------------------------------------------------------
// Exports

pub use builder::ClassBuilder;
pub use instance::Instance;

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::sync::atomic::{AtomicU64, Ordering};

use crate::value::{Map, Value};

// -----------------------------------------------------------------------------
// ClassId

/// The stable identity of a [`Class`].
///
/// Identities are allocated once per built class and never reused, two classes
/// with the same name are still distinct.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct ClassId(u64);

impl ClassId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// -----------------------------------------------------------------------------
// Class

pub(crate) type DefaultFn = Arc<dyn Fn() -> Value + Send + Sync>;
pub(crate) type InitFn = Arc<dyn Fn(&mut Instance) + Send + Sync>;

pub(crate) struct FieldDecl {
    pub key: String,
    pub default: DefaultFn,
}

struct ClassData {
    id: ClassId,
    name: String,
    parent: Option<Class>,
    fields: Vec<FieldDecl>,
    init: Option<InitFn>,
}

/// A handle to a class.
///
/// Cheap to clone. Equality and hashing use the [`ClassId`] only.
#[derive(Clone)]
pub struct Class(Arc<ClassData>);

impl Class {
    /// Starts building a new root class.
    #[inline]
    pub fn builder(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder::new(name)
    }

    #[inline]
    pub fn id(&self) -> ClassId {
        self.0.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    #[inline]
    pub fn parent(&self) -> Option<&Class> {
        self.0.parent.as_ref()
    }

    /// Iterates from this class up to the root, most specific first.
    pub fn ancestors(&self) -> impl Iterator<Item = &Class> {
        core::iter::successors(Some(self), |&class| class.parent())
    }

    /// The chain from the root down to this class, root first.
    pub fn lineage(&self) -> Vec<Class> {
        let mut chain: Vec<Class> = self.ancestors().cloned().collect();
        chain.reverse();
        chain
    }

    /// Returns `true` if `self` is `other` or inherits from it.
    pub fn is_subclass_of(&self, other: &Class) -> bool {
        self.ancestors().any(|class| class == other)
    }

    /// Keys of every declared field in construction order, ancestors first.
    pub fn field_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for class in self.lineage_refs() {
            for field in &class.0.fields {
                if !keys.contains(&field.key.as_str()) {
                    keys.push(&field.key);
                }
            }
        }
        keys
    }

    /// Runs the plain constructor, returning an unwrapped instance.
    ///
    /// Default factories run once per construction, so no two instances share
    /// a nested default.
    pub fn construct(&self) -> Instance {
        let chain = self.lineage_refs();

        let mut fields = Map::new();
        for class in &chain {
            for field in &class.0.fields {
                fields.insert(field.key.as_str(), (field.default)());
            }
        }

        let mut instance = Instance::new(self.clone(), fields);
        for class in &chain {
            if let Some(init) = &class.0.init {
                init(&mut instance);
            }
        }
        instance
    }

    fn lineage_refs(&self) -> Vec<&Class> {
        let mut chain: Vec<&Class> = self.ancestors().collect();
        chain.reverse();
        chain
    }
}

impl PartialEq for Class {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Class {}

impl Hash for Class {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Class({}{})", self.0.name, self.0.id)
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

// -----------------------------------------------------------------------------
// Tests
