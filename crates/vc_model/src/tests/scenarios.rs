use alloc::vec;

use super::{map, person};
use crate::behavior::builtin::{SerdeFlags, cast, serializable, skip_serde};
use crate::class::Class;
use crate::instance::{unwrap, wrap};
use crate::serde::{CastOptions, CastTarget, Format, Serialized, deserialize, serialize};
use crate::value::Value;

#[test]
fn alias_symmetry() {
    let person = person();

    let john = wrap(&person).construct();
    john.set("firstName", "John");
    let plain = serialize(&Value::Entity(john), Format::Plain).unwrap();
    assert_eq!(
        plain,
        Serialized::Plain(map([("first_name", Value::from("John")), ("spouse", Value::Null)])),
    );

    let target = wrap(&person).construct();
    let result = deserialize(
        map([("first_name", Value::from("John"))]),
        Format::Plain,
        Some(&target),
        &CastOptions::default(),
    )
    .unwrap();
    assert_eq!(target.get("firstName"), Value::from("John"));
    assert!(result.as_entity().is_some_and(|entity| entity == &target));
}

#[test]
fn nested_spouse_round_trip() {
    let person = person();
    let wrapped = wrap(&person);

    let john = wrapped.construct();
    let jane = wrapped.construct();
    john.set("firstName", "John");
    jane.set("firstName", "Jane");
    john.set("spouse", jane);

    let plain = serialize(&Value::Entity(john.clone()), Format::Plain)
        .unwrap()
        .into_plain()
        .unwrap();
    let spouse = plain.as_map().unwrap().get("spouse").unwrap();
    assert_eq!(spouse.as_map().unwrap().get("first_name"), Some(&Value::from("Jane")));

    let copy = wrapped.construct();
    deserialize(plain, Format::Plain, Some(&copy), &CastOptions::default()).unwrap();
    let spouse = copy.get("spouse");
    let spouse = spouse.as_entity().unwrap();
    assert_eq!(spouse.class(), &person);
    assert_eq!(spouse.get("firstName"), Value::from("Jane"));
    assert_eq!(copy, john);
}

#[cfg(feature = "json")]
#[test]
fn json_round_trip_ignores_excluded_properties() {
    let tag = Class::builder("Tag").field("label").build().unwrap();
    let post = Class::builder("Post")
        .field("title")
        .field("tags")
        .field("by_lang")
        .field_default("views", 0)
        .field_default("draft", true)
        .property("tags", cast(CastTarget::List(tag.clone())))
        .property("by_lang", cast(CastTarget::Map(tag.clone())))
        .property("views", skip_serde())
        .property("draft", serializable(SerdeFlags::SERIALIZE))
        .build()
        .unwrap();
    let wrapped = wrap(&post);

    let label = |text: &str| {
        let entity = wrap(&tag).construct();
        entity.set("label", text);
        Value::Entity(entity)
    };

    let original = wrapped.construct();
    original.set("title", "Hello");
    original.set("tags", vec![label("rust"), label("serde")]);
    original.set("by_lang", map([("en", label("english"))]));
    original.set("views", 12);
    original.set("draft", false);

    let text = serialize(&Value::Entity(original.clone()), Format::Json).unwrap();
    assert_eq!(
        text.as_text(),
        Some(concat!(
            r#"{"title":"Hello","tags":[{"label":"rust"},{"label":"serde"}],"#,
            r#""by_lang":{"en":{"label":"english"}},"draft":false}"#,
        )),
    );

    let copy = wrapped.construct();
    deserialize(text, Format::Json, Some(&copy), &CastOptions::default()).unwrap();
    assert_eq!(copy.get("title"), Value::from("Hello"));
    assert_eq!(copy.get("views"), Value::Int(0));
    assert_eq!(copy.get("draft"), Value::Bool(true));

    let tags = copy.get("tags");
    let tags = tags.as_list().unwrap();
    assert_eq!(tags.len(), 2);
    assert_eq!(tags[1].as_entity().unwrap().get("label"), Value::from("serde"));

    let by_lang = copy.get("by_lang");
    let english = by_lang.as_map().unwrap().get("en").unwrap().as_entity().unwrap();
    assert_eq!(english.class(), &tag);

    // Everything but the excluded properties matches.
    copy.set("views", 12);
    copy.set("draft", false);
    assert_eq!(copy, original);
}

#[cfg(feature = "ron")]
#[test]
fn ron_round_trip() {
    let person = person();
    let john = wrap(&person).construct();
    john.set("firstName", "John");

    let text = serialize(&Value::Entity(john.clone()), Format::Ron).unwrap();
    let copy = wrap(&person).construct();
    deserialize(text, Format::Ron, Some(&copy), &CastOptions::default()).unwrap();
    assert_eq!(copy, john);
}

#[test]
fn unwrap_exposes_the_store() {
    let person = person();
    let john = wrap(&person).construct();
    john.set("firstName", "John");

    let value = Value::Entity(john);
    let store = unwrap(&value).unwrap();
    assert_eq!(store.get("firstName"), Some(&Value::from("John")));
    assert_eq!(store.class(), &person);

    assert!(unwrap(&Value::from("plain")).is_none());
}
