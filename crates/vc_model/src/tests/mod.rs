//! End-to-end scenarios across the definition store, the interception
//! engine, traversal and validation.

mod lifecycle;
mod scenarios;

use crate::behavior::builtin::{alias, cast};
use crate::class::Class;
use crate::registry::{Target, attach};
use crate::serde::CastTarget;
use crate::value::{Map, Value};

/// `Person { firstName as "first_name", spouse: Person }`.
///
/// The spouse cast names the class itself, so it is attached after `build`.
fn person() -> Class {
    let person = Class::builder("Person")
        .field("firstName")
        .field("spouse")
        .property("firstName", alias("first_name"))
        .build()
        .unwrap();
    attach(
        Target::Property(&person, "spouse"),
        cast(CastTarget::Single(person.clone())),
    )
    .unwrap();
    person
}

fn map<const N: usize>(entries: [(&str, Value); N]) -> Value {
    Value::Map(entries.into_iter().collect::<Map>())
}
