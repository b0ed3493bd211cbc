use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use super::{Class, ClassData, ClassId, DefaultFn, FieldDecl, InitFn, Instance};
use crate::behavior::Descriptor;
use crate::error::DefinitionError;
use crate::registry::{self, Target};
use crate::value::Value;

// -----------------------------------------------------------------------------
// ClassBuilder

/// Declares a class: its parent, fields, initializer and behaviors.
///
/// Behaviors listed here are attached when [`build`](Self::build) runs, in the
/// order they were declared, so a duplicate single-use behavior fails the
/// build rather than surfacing later.
///
/// # Examples
///
/// ```
/// use vc_model::behavior::builtin::alias;
/// use vc_model::class::Class;
///
/// let person = Class::builder("Person")
///     .field("first_name")
///     .property("first_name", alias("firstName"))
///     .build()
///     .unwrap();
///
/// assert_eq!(person.field_keys(), ["first_name"]);
/// ```
pub struct ClassBuilder {
    name: String,
    parent: Option<Class>,
    fields: Vec<FieldDecl>,
    init: Option<InitFn>,
    behaviors: Vec<(Option<String>, Descriptor)>,
}

impl ClassBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            fields: Vec::new(),
            init: None,
            behaviors: Vec::new(),
        }
    }

    /// Sets the parent class.
    pub fn extends(mut self, parent: &Class) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Declares a field defaulting to [`Value::Null`].
    pub fn field(self, key: impl Into<String>) -> Self {
        self.field_with(key, || Value::Null)
    }

    /// Declares a field with a constant default.
    pub fn field_default<T>(self, key: impl Into<String>, default: T) -> Self
    where
        T: Into<Value> + Clone + Send + Sync + 'static,
    {
        self.field_with(key, move || default.clone().into())
    }

    /// Declares a field whose default is produced per construction.
    pub fn field_with(
        mut self,
        key: impl Into<String>,
        default: impl Fn() -> Value + Send + Sync + 'static,
    ) -> Self {
        let key = key.into();
        let default: DefaultFn = Arc::new(default);
        match self.fields.iter_mut().find(|field| field.key == key) {
            Some(field) => field.default = default,
            None => self.fields.push(FieldDecl { key, default }),
        }
        self
    }

    /// Sets the initializer, run after all field defaults are in place.
    pub fn init(mut self, init: impl Fn(&mut Instance) + Send + Sync + 'static) -> Self {
        self.init = Some(Arc::new(init));
        self
    }

    /// Attaches a class-level behavior.
    pub fn behavior(mut self, descriptor: Descriptor) -> Self {
        self.behaviors.push((None, descriptor));
        self
    }

    /// Attaches a behavior to one property.
    pub fn property(mut self, key: impl Into<String>, descriptor: Descriptor) -> Self {
        self.behaviors.push((Some(key.into()), descriptor));
        self
    }

    /// Creates the class and attaches every declared behavior.
    pub fn build(self) -> Result<Class, DefinitionError> {
        let class = Class(Arc::new(ClassData {
            id: ClassId::next(),
            name: self.name,
            parent: self.parent,
            fields: self.fields,
            init: self.init,
        }));

        registry::declare(&class);

        for (key, descriptor) in self.behaviors {
            let target = match &key {
                Some(key) => Target::Property(&class, key),
                None => Target::Class(&class),
            };
            registry::attach(target, descriptor)?;
        }

        log::debug!("class `{class}` built as {}", class.id());
        Ok(class)
    }
}
