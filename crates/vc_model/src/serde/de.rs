use alloc::string::String;
use alloc::vec::Vec;
use core::future::IntoFuture;

use super::{CastOptions, CastTarget, Format, Path, Serialized, to_plain};
use crate::behavior::BehaviorId;
use crate::behavior::builtin::{Alias, Cast, SerdeFlags, Serializable};
use crate::class::Class;
use crate::error::TraversalError;
use crate::hash::{HashMap, HashSet};
use crate::instance::{Entity, wrap};
use crate::registry::get_class_definition;
use crate::value::{Map, Value};

// -----------------------------------------------------------------------------
// Decode

fn decode(data: Serialized, format: Format) -> Result<Value, TraversalError> {
    let mismatch = |data: &Serialized| TraversalError::FormatMismatch {
        format: format.name(),
        found: data.kind(),
    };

    match format {
        Format::Plain => match data {
            Serialized::Plain(value) => Ok(value),
            other => Err(mismatch(&other)),
        },
        #[cfg(feature = "json")]
        Format::Json => match data {
            Serialized::Text(text) => {
                serde_json::from_str(&text).map_err(|err| TraversalError::Decode {
                    format: format.name(),
                    message: alloc::format!("{err}"),
                })
            }
            other => Err(mismatch(&other)),
        },
        #[cfg(feature = "ron")]
        Format::Ron => match data {
            Serialized::Text(text) => ron::from_str(&text).map_err(|err| TraversalError::Decode {
                format: format.name(),
                message: alloc::format!("{err}"),
            }),
            other => Err(mismatch(&other)),
        },
    }
}

// -----------------------------------------------------------------------------
// Populator

/// Fills entities from plain data.
///
/// Per-set validation is suspended on each entity while it is filled.
/// Filled entities are collected innermost first, so they can be validated
/// once the whole tree is in place.
#[derive(Default)]
struct Populator {
    path: Path,
    filled: Vec<Entity>,
}

impl Populator {
    fn populate(&mut self, entity: &Entity, data: Map) -> Result<(), TraversalError> {
        let composed = get_class_definition(entity.class());

        let mut by_alias: HashMap<&str, &str> = HashMap::default();
        let mut aliased: HashSet<&str> = HashSet::default();
        for property in composed.properties() {
            if let Some(name) = property.payload::<String>(BehaviorId::of::<Alias>()) {
                by_alias.insert(name.as_str(), property.key());
                if name != property.key() {
                    aliased.insert(property.key());
                }
            }
        }

        // Every value is resolved before the first set, so a failed cast
        // leaves the entity untouched.
        let mut resolved: Vec<(String, Value)> = Vec::with_capacity(data.len());
        for (name, value) in data {
            let key = match by_alias.get(name.as_str()) {
                Some(&key) => key,
                // Reachable only through its alias.
                None if aliased.contains(name.as_str()) => continue,
                None => name.as_str(),
            };

            let property = composed.property(key);
            let flags = property
                .and_then(|p| p.payload::<SerdeFlags>(BehaviorId::of::<Serializable>()))
                .copied()
                .unwrap_or_default();
            if !flags.contains(SerdeFlags::DESERIALIZE) {
                continue;
            }

            self.path.push_key(key);
            let value = match property.and_then(|p| p.payload::<CastTarget>(BehaviorId::of::<Cast>())) {
                Some(target) => self.cast(value, target, true)?,
                None => value,
            };
            self.path.pop();

            resolved.push((key.to_owned(), value));
        }

        let _suspended = entity.suspend_validation();
        for (key, value) in resolved {
            entity.set(&key, value);
        }

        self.filled.push(entity.clone());
        Ok(())
    }

    fn cast(
        &mut self,
        value: Value,
        target: &CastTarget,
        nullable: bool,
    ) -> Result<Value, TraversalError> {
        if nullable && value.is_null() {
            return Ok(Value::Null);
        }

        match target {
            CastTarget::Single(class) => self.cast_single(value, class),
            CastTarget::List(class) => match value {
                Value::List(items) => {
                    let mut out = Vec::with_capacity(items.len());
                    for (index, item) in items.into_iter().enumerate() {
                        self.path.push_index(index);
                        out.push(self.cast_element(item, class)?);
                        self.path.pop();
                    }
                    Ok(Value::List(out))
                }
                other => Err(self.path.shape_mismatch("list", &other)),
            },
            CastTarget::Map(class) => match value {
                Value::Map(map) => {
                    let mut out = Map::with_capacity(map.len());
                    for (key, item) in map {
                        self.path.push_key(&key);
                        let item = self.cast_element(item, class)?;
                        self.path.pop();
                        out.insert(key, item);
                    }
                    Ok(Value::Map(out))
                }
                other => Err(self.path.shape_mismatch("map", &other)),
            },
        }
    }

    fn cast_element(&mut self, value: Value, class: &Class) -> Result<Value, TraversalError> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        self.cast_single(value, class)
    }

    fn cast_single(&mut self, value: Value, class: &Class) -> Result<Value, TraversalError> {
        match value {
            Value::Map(data) => {
                let entity = Entity::wrap_deferred(class.construct());
                self.populate(&entity, data)?;
                Ok(Value::Entity(entity))
            }
            Value::Entity(entity) if entity.class().is_subclass_of(class) => Ok(Value::Entity(entity)),
            other => Err(self.path.shape_mismatch("map", &other)),
        }
    }

    fn finish(self, options: &CastOptions) {
        if !options.validate {
            return;
        }
        for entity in &self.filled {
            if entity.has_validators() {
                entity.validate();
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Deserialize

/// Decodes `data` and, given a target, populates it.
///
/// Aliases resolve back to property keys. A property that carries a cast
/// target is deserialized into fresh instances of that class; everything
/// else is taken as-is. Keys matching no property are set as they are, and
/// properties absent from the data are left untouched.
///
/// Without a target the decoded plain value is returned. With one, the
/// target itself is returned, after validation when `options` ask for it.
pub fn deserialize(
    data: impl Into<Serialized>,
    format: Format,
    target: Option<&Entity>,
    options: &CastOptions,
) -> Result<Value, TraversalError> {
    let plain = decode(data.into(), format)?;
    let Some(target) = target else {
        return Ok(plain);
    };

    let mut populator = Populator::default();
    match plain {
        Value::Map(data) => populator.populate(target, data)?,
        other => return Err(populator.path.shape_mismatch("map", &other)),
    }
    populator.finish(options);
    Ok(Value::Entity(target.clone()))
}

// -----------------------------------------------------------------------------
// Cast

/// Deserializes plain data into new instances.
///
/// The target decides the result: one entity, a list of entities or a keyed
/// map of entities. A list or map target always yields a list or map, empty
/// ones included.
///
/// # Examples
///
/// ```
/// use vc_model::class::Class;
/// use vc_model::serde::{CastOptions, CastTarget, cast};
/// use vc_model::value::{Map, Value};
///
/// let point = Class::builder("Point").field("x").build().unwrap();
///
/// let one: Map = [("x", Value::from(1))].into_iter().collect();
/// let data = Value::List(vec![Value::Map(one)]);
///
/// let cast = cast(data, &CastTarget::List(point), &CastOptions::default()).unwrap();
/// let items = cast.as_list().unwrap();
/// assert_eq!(items[0].as_entity().unwrap().get("x"), Value::Int(1));
/// ```
pub fn cast(
    value: impl Into<Value>,
    target: &CastTarget,
    options: &CastOptions,
) -> Result<Value, TraversalError> {
    let mut populator = Populator::default();
    let cast = populator.cast(value.into(), target, false)?;
    populator.finish(options);
    Ok(cast)
}

/// Waits for a pending value, then casts it.
///
/// The cast itself is synchronous; this only sequences it after the input.
pub async fn cast_later<F>(
    pending: F,
    target: &CastTarget,
    options: &CastOptions,
) -> Result<Value, TraversalError>
where
    F: IntoFuture,
    F::Output: Into<Value>,
{
    let value = pending.into_future().await;
    cast(value, target, options)
}

/// Copies an entity through its plain form.
///
/// Properties excluded from serialization are not copied; the copy holds
/// whatever its constructor gave them.
pub fn clone_entity(entity: &Entity) -> Result<Entity, TraversalError> {
    let plain = to_plain(&Value::Entity(entity.clone()))?;
    let copy = wrap(entity.class()).construct();
    deserialize(plain, Format::Plain, Some(&copy), &CastOptions::default())?;
    Ok(copy)
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::{cast, clone_entity, deserialize};
    use crate::behavior::builtin::{alias, cast as cast_behavior, skip_serde, validate};
    use crate::class::Class;
    use crate::error::TraversalError;
    use crate::instance::wrap;
    use crate::serde::{CastOptions, CastTarget, Format};
    use crate::validate::Provider;
    use crate::value::{Map, Value};

    fn map<const N: usize>(entries: [(&str, Value); N]) -> Value {
        Value::Map(entries.into_iter().collect::<Map>())
    }

    #[test]
    fn aliases_resolve_back() {
        let user = Class::builder("User")
            .field("login")
            .field("name")
            .property("login", alias("user_name"))
            .build()
            .unwrap();
        let entity = wrap(&user).construct();

        let data = map([
            ("user_name", Value::from("jd")),
            ("login", Value::from("ignored")),
            ("name", Value::from("Jane")),
        ]);
        deserialize(data, Format::Plain, Some(&entity), &CastOptions::default()).unwrap();
        assert_eq!(entity.get("login"), Value::from("jd"));
        assert_eq!(entity.get("name"), Value::from("Jane"));
    }

    #[test]
    fn absent_and_skipped_properties_are_untouched() {
        let doc = Class::builder("Doc")
            .field_default("title", "untitled")
            .field_default("hidden", 1)
            .property("hidden", skip_serde())
            .build()
            .unwrap();
        let entity = wrap(&doc).construct();

        deserialize(map([("hidden", Value::from(9))]), Format::Plain, Some(&entity), &CastOptions::default())
            .unwrap();
        assert_eq!(entity.get("title"), Value::from("untitled"));
        assert_eq!(entity.get("hidden"), Value::Int(1));
    }

    #[test]
    fn shape_dispatch() {
        let tag = Class::builder("Tag").field("label").build().unwrap();
        let options = CastOptions::default();

        let empty = cast(Value::List(vec![]), &CastTarget::List(tag.clone()), &options).unwrap();
        assert_eq!(empty, Value::List(vec![]));

        let empty = cast(map([]), &CastTarget::Map(tag.clone()), &options).unwrap();
        assert_eq!(empty, Value::Map(Map::new()));

        let keyed = cast(
            map([("a", map([("label", Value::from("x"))]))]),
            &CastTarget::Map(tag.clone()),
            &options,
        )
        .unwrap();
        let entity = keyed.as_map().unwrap().get("a").unwrap().as_entity().unwrap();
        assert_eq!(entity.class(), &tag);
        assert_eq!(entity.get("label"), Value::from("x"));

        let err = cast(Value::from(3), &CastTarget::Single(tag.clone()), &options).unwrap_err();
        assert_eq!(
            err,
            TraversalError::ShapeMismatch { expected: "map", found: "int", path: "$".into() },
        );

        let err = cast(Value::Null, &CastTarget::Single(tag), &options).unwrap_err();
        assert!(matches!(err, TraversalError::ShapeMismatch { found: "null", .. }));
    }

    #[test]
    fn collections_require_their_shape() {
        let tag = Class::builder("Tag").field("label").build().unwrap();
        let options = CastOptions::default();

        let err = cast(Value::from(1), &CastTarget::List(tag.clone()), &options).unwrap_err();
        assert_eq!(
            err,
            TraversalError::ShapeMismatch { expected: "list", found: "int", path: "$".into() },
        );

        let err = cast(Value::List(vec![]), &CastTarget::Map(tag), &options).unwrap_err();
        assert_eq!(
            err,
            TraversalError::ShapeMismatch { expected: "map", found: "list", path: "$".into() },
        );
    }

    #[test]
    fn cast_entities_skip_constructed_state_checks() {
        let named = Class::builder("Named")
            .field_default("name", "")
            .property(
                "name",
                validate(Provider::function(|name, _| name.as_str().is_some_and(|s| !s.is_empty()))),
            )
            .build()
            .unwrap();
        let target = CastTarget::Single(named);

        let john = cast(map([("name", Value::from("John"))]), &target, &CastOptions::UNCHECKED).unwrap();
        let john = john.as_entity().unwrap();
        assert!(john.valid());
        assert!(john.errors().is_empty());

        let blank = cast(map([]), &target, &CastOptions::DEFAULT).unwrap();
        assert!(!blank.as_entity().unwrap().valid());
    }

    #[test]
    fn failed_deserialize_leaves_the_target_untouched() {
        let item = Class::builder("Item").field("name").build().unwrap();
        let order = Class::builder("Order")
            .field_default("title", "orig")
            .field("items")
            .property("items", cast_behavior(CastTarget::List(item)))
            .build()
            .unwrap();
        let entity = wrap(&order).construct();

        let data = map([
            ("title", Value::from("changed")),
            ("items", Value::List(vec![Value::from(true)])),
        ]);
        let err = deserialize(data, Format::Plain, Some(&entity), &CastOptions::default()).unwrap_err();
        assert!(matches!(err, TraversalError::ShapeMismatch { found: "bool", .. }));
        assert_eq!(entity.get("title"), Value::from("orig"));
        assert_eq!(entity.get("items"), Value::Null);
    }

    #[test]
    fn nested_mismatch_reports_path() {
        let item = Class::builder("Item").field("name").build().unwrap();
        let order = Class::builder("Order")
            .field("items")
            .property("items", cast_behavior(CastTarget::List(item)))
            .build()
            .unwrap();
        let entity = wrap(&order).construct();

        let data = map([("items", Value::List(vec![map([]), Value::from(true)]))]);
        let err = deserialize(data, Format::Plain, Some(&entity), &CastOptions::default()).unwrap_err();
        assert_eq!(
            err,
            TraversalError::ShapeMismatch { expected: "map", found: "bool", path: "$.items[1]".into() },
        );
    }

    #[test]
    fn text_requires_a_text_format() {
        let err = deserialize("{}", Format::Plain, None, &CastOptions::default()).unwrap_err();
        assert_eq!(err, TraversalError::FormatMismatch { format: "plain", found: "text" });
    }

    #[test]
    fn clones_are_detached() {
        let note = Class::builder("Note").field_default("text", "hi").build().unwrap();
        let original = wrap(&note).construct();
        let copy = clone_entity(&original).unwrap();

        assert_eq!(copy, original);
        copy.set("text", "changed");
        assert_eq!(original.get("text"), Value::from("hi"));
    }
}
