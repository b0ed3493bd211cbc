use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{map, person};
use crate::behavior::BehaviorId;
use crate::behavior::builtin::{Alias, Cast, on_change, validate};
use crate::class::Class;
use crate::error::TraversalError;
use crate::instance::wrap;
use crate::logging::{self, LogLevel};
use crate::registry::{get_class_definition, get_property_definition, verify};
use crate::serde::{CastOptions, CastTarget, Format, cast, cast_later, deserialize, serialize};
use crate::validate::Provider;
use crate::value::Value;

#[test]
fn definitions_resolve_from_instances() {
    let person = person();
    let john = wrap(&person).construct();

    let from_class = get_property_definition(&person, "firstName");
    let from_entity = get_property_definition(&john, "firstName");
    let from_value = get_property_definition(&Value::Entity(john.clone()), "firstName");
    assert_eq!(from_class.descriptors().len(), 1);
    assert_eq!(from_entity.descriptors().len(), 1);
    assert_eq!(
        from_value.payload::<String>(BehaviorId::of::<Alias>()).map(String::as_str),
        Some("first_name"),
    );

    let composed = get_class_definition(&john);
    assert!(composed.property("spouse").unwrap().descriptors().contains(BehaviorId::of::<Cast>()));
    assert!(get_property_definition(&Value::from(1), "firstName").is_empty());
}

#[test]
fn unused_dynamic_behaviors_are_reported_once() {
    let records: Arc<Mutex<Vec<(LogLevel, Option<String>, Option<String>)>>> = Arc::default();
    let sink = records.clone();
    logging::set_sink(move |record| {
        sink.lock()
            .unwrap()
            .push((record.level, record.class.clone(), record.key.clone()));
    });

    let idle = Class::builder("NeverWrapped")
        .field("name")
        .property("name", validate(Provider::function(|_, _| true)))
        .build()
        .unwrap();
    let base = Class::builder("WrappedThroughChild")
        .field("name")
        .property("name", on_change(|_, _, _| {}))
        .build()
        .unwrap();
    let child = Class::builder("Child").extends(&base).build().unwrap();
    let _ = wrap(&child).construct();

    let ours = |warning: &crate::registry::UsageWarning| {
        warning.class == "NeverWrapped" || warning.class == "WrappedThroughChild"
    };

    let warnings: Vec<_> = verify().into_iter().filter(ours).collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].behavior, "validate");
    assert_eq!(warnings[0].key.as_deref(), Some("name"));
    assert_eq!(warnings[0].class_id, idle.id());
    assert_eq!(
        alloc::format!("{}", warnings[0]),
        "class `NeverWrapped` not initialized for dynamic behavior `validate` on property `name`",
    );

    // The queue is drained.
    assert!(!verify().iter().any(ours));

    logging::reset_sink();
    let records = records.lock().unwrap();
    let reported: Vec<_> = records
        .iter()
        .filter(|(_, class, _)| class.as_deref() == Some("NeverWrapped"))
        .collect();
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].0, LogLevel::Warn);
    assert_eq!(reported[0].2.as_deref(), Some("name"));
}

#[test]
fn deserialize_validates_once_with_the_full_tree() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();
    let range = Class::builder("Interval")
        .field_default("low", 0)
        .field_default("high", 0)
        .property(
            "high",
            validate(Provider::function(move |high, entity| {
                seen.fetch_add(1, Ordering::Relaxed);
                high.as_int() >= entity.get("low").as_int()
            })),
        )
        .property(
            "low",
            validate(Provider::function(|low, _| low.as_int().is_some_and(|n| n >= 0))),
        )
        .build()
        .unwrap();

    let entity = wrap(&range).construct();
    assert_eq!(calls.load(Ordering::Relaxed), 1);

    // `high` arrives first; validating per field would see a stale `low`.
    let data = map([("high", Value::from(10)), ("low", Value::from(5))]);
    deserialize(data, Format::Plain, Some(&entity), &CastOptions::default()).unwrap();
    assert_eq!(calls.load(Ordering::Relaxed), 2);
    assert!(entity.valid());

    let data = map([("low", Value::from(-1))]);
    deserialize(data, Format::Plain, Some(&entity), &CastOptions::UNCHECKED).unwrap();
    assert_eq!(calls.load(Ordering::Relaxed), 2);
    assert!(entity.valid());
    assert!(!entity.validate());
    assert_eq!(entity.errors().keys().collect::<Vec<_>>(), ["low"]);
}

#[test]
fn cycles_fail_instead_of_recursing() {
    let person = person();
    let wrapped = wrap(&person);
    let john = wrapped.construct();
    let jane = wrapped.construct();
    john.set("spouse", jane.clone());
    jane.set("spouse", john.clone());

    let err = serialize(&Value::Entity(john), Format::Plain).unwrap_err();
    assert_eq!(
        err,
        TraversalError::Cycle { class: "Person".into(), path: "$.spouse.spouse".into() },
    );
}

#[test]
fn pending_values_are_cast_when_ready() {
    let person = person();
    let pending = futures_lite::future::ready(Value::List(vec![
        map([("first_name", Value::from("Ann"))]),
        Value::Null,
    ]));

    let target = CastTarget::List(person.clone());
    let people = futures_lite::future::block_on(cast_later(pending, &target, &CastOptions::default()))
        .unwrap();
    let items = people.as_list().unwrap();
    assert_eq!(items[0].as_entity().unwrap().get("firstName"), Value::from("Ann"));
    assert_eq!(items[1], Value::Null);

    let single = cast(map([]), &CastTarget::Single(person.clone()), &CastOptions::default()).unwrap();
    assert_eq!(single.as_entity().unwrap().class(), &person);
}
