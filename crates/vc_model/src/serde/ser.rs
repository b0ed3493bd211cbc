use alloc::string::String;
use alloc::vec::Vec;

use super::{Format, Path, Serialized};
use crate::behavior::BehaviorId;
use crate::behavior::builtin::{Alias, SerdeFlags, Serializable};
use crate::error::TraversalError;
use crate::hash::HashSet;
use crate::instance::Entity;
use crate::registry::get_class_definition;
use crate::value::{Map, Value};

// -----------------------------------------------------------------------------
// Plain

struct Flattener {
    path: Path,
    visiting: HashSet<usize>,
}

impl Flattener {
    fn value(&mut self, value: &Value) -> Result<Value, TraversalError> {
        match value {
            Value::Entity(entity) => self.entity(entity),
            Value::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    self.path.push_index(index);
                    out.push(self.value(item)?);
                    self.path.pop();
                }
                Ok(Value::List(out))
            }
            Value::Map(map) => {
                let mut out = Map::with_capacity(map.len());
                for (key, item) in map.iter() {
                    self.path.push_key(key);
                    out.insert(key, self.value(item)?);
                    self.path.pop();
                }
                Ok(Value::Map(out))
            }
            scalar => Ok(scalar.clone()),
        }
    }

    fn entity(&mut self, entity: &Entity) -> Result<Value, TraversalError> {
        if !self.visiting.insert(entity.addr()) {
            return Err(TraversalError::Cycle {
                class: String::from(entity.class().name()),
                path: alloc::format!("{}", self.path),
            });
        }

        let composed = get_class_definition(entity.class());
        let fields: Vec<(String, Value)> = entity
            .store()
            .fields()
            .iter()
            .map(|(key, value)| (String::from(key), value.clone()))
            .collect();

        let mut out = Map::with_capacity(fields.len());
        for (key, value) in fields {
            let property = composed.property(&key);
            let flags = property
                .and_then(|p| p.payload::<SerdeFlags>(BehaviorId::of::<Serializable>()))
                .copied()
                .unwrap_or_default();
            if !flags.contains(SerdeFlags::SERIALIZE) {
                continue;
            }

            let name = property
                .and_then(|p| p.payload::<String>(BehaviorId::of::<Alias>()))
                .cloned()
                .unwrap_or_else(|| key.clone());

            self.path.push_key(&key);
            let plain = self.value(&value)?;
            if out.contains_key(&name) {
                return Err(TraversalError::KeyCollision {
                    class: String::from(entity.class().name()),
                    key: name,
                    path: alloc::format!("{}", self.path),
                });
            }
            self.path.pop();
            out.insert(name, plain);
        }

        self.visiting.remove(&entity.addr());
        Ok(Value::Map(out))
    }
}

/// Converts a value to plain data.
///
/// Entities become maps of their stored values, keyed by alias, without the
/// properties excluded from serialization. Lists and maps are walked so
/// nested entities are converted the same way.
pub fn to_plain(value: &Value) -> Result<Value, TraversalError> {
    let mut flattener = Flattener {
        path: Path::default(),
        visiting: HashSet::default(),
    };
    flattener.value(value)
}

// -----------------------------------------------------------------------------
// Encode

/// Converts a value to plain data, then encodes it.
///
/// # Examples
///
/// ```
/// use vc_model::behavior::builtin::alias;
/// use vc_model::class::Class;
/// use vc_model::instance::wrap;
/// use vc_model::serde::{Format, Serialized, serialize};
/// use vc_model::value::{Map, Value};
///
/// let person = Class::builder("Person")
///     .field("firstName")
///     .property("firstName", alias("first_name"))
///     .build()
///     .unwrap();
///
/// let john = wrap(&person).construct();
/// john.set("firstName", "John");
///
/// let plain = serialize(&Value::Entity(john), Format::Plain).unwrap();
/// let expected: Map = [("first_name", Value::from("John"))].into_iter().collect();
/// assert_eq!(plain, Serialized::Plain(Value::Map(expected)));
/// ```
pub fn serialize(value: &Value, format: Format) -> Result<Serialized, TraversalError> {
    let plain = to_plain(value)?;
    encode(plain, format)
}

fn encode(plain: Value, format: Format) -> Result<Serialized, TraversalError> {
    match format {
        Format::Plain => Ok(Serialized::Plain(plain)),
        #[cfg(feature = "json")]
        Format::Json => serde_json::to_string(&plain)
            .map(Serialized::Text)
            .map_err(|err| TraversalError::Encode {
                format: format.name(),
                message: alloc::format!("{err}"),
            }),
        #[cfg(feature = "ron")]
        Format::Ron => ron::to_string(&plain)
            .map(Serialized::Text)
            .map_err(|err| TraversalError::Encode {
                format: format.name(),
                message: alloc::format!("{err}"),
            }),
    }
}

// -----------------------------------------------------------------------------
// Tests
