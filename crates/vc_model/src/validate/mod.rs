//! Validation and revert.
//!
//! Validators are attached to properties with the
//! [`validate`](crate::behavior::builtin::validate) behavior. Each entity
//! keeps a [`ValidityRecord`]: the current errors per property, and a
//! snapshot of every property's stored value from the last time it
//! validated cleanly.
//!
//! Validation never fails with an `Err`. Errors are data, read back through
//! [`Entity::valid`] and [`Entity::errors`]; [`Entity::revert`] is the one
//! corrective operation.

// -----------------------------------------------------------------------------
// Modules

mod provider;

// -----------------------------------------------------------------------------
// Exports

pub use provider::{Outcome, Provider, Validate, ValidateFn, ValidationError};

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::behavior::BehaviorId;
use crate::behavior::builtin::Validator;
use crate::instance::Entity;
use crate::registry::{get_class_definition, get_property_definition};
use crate::value::Value;

// -----------------------------------------------------------------------------
// ValidityRecord

/// Per-entity validation state.
#[derive(Clone, Default, Debug)]
pub struct ValidityRecord {
    errors: BTreeMap<String, Vec<ValidationError>>,
    snapshot: BTreeMap<String, Value>,
}

impl ValidityRecord {
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    #[inline]
    pub fn errors(&self) -> &BTreeMap<String, Vec<ValidationError>> {
        &self.errors
    }

    /// The stored value recorded when `key` last validated cleanly.
    #[inline]
    pub fn snapshot(&self, key: &str) -> Option<&Value> {
        self.snapshot.get(key)
    }

    fn record(&mut self, key: &str, errors: Vec<ValidationError>, raw: Option<Value>) {
        if errors.is_empty() {
            self.errors.remove(key);
            if let Some(raw) = raw {
                self.snapshot.insert(String::from(key), raw);
            }
        } else {
            self.errors.insert(String::from(key), errors);
        }
    }
}

// -----------------------------------------------------------------------------
// Entity API

impl Entity {
    /// Validates every property that carries validators.
    ///
    /// Returns [`valid`](Self::valid) afterwards.
    pub fn validate(&self) -> bool {
        let id = BehaviorId::of::<Validator>();
        let keys: Vec<String> = get_class_definition(self.class())
            .properties()
            .iter()
            .filter(|property| property.descriptors().contains(id))
            .map(|property| String::from(property.key()))
            .collect();

        for key in &keys {
            self.validate_property(key);
        }
        self.valid()
    }

    /// Validates one property, returning whether it is now free of errors.
    ///
    /// Every provider runs against the value the get pipeline yields. A
    /// property with N failing providers gets at least N errors.
    pub fn validate_property(&self, key: &str) -> bool {
        let composed = get_property_definition(self.class(), key);
        let providers: Vec<&Provider> = composed
            .descriptors()
            .group(BehaviorId::of::<Validator>())
            .filter_map(|descriptor| descriptor.payload::<Provider>())
            .collect();
        if providers.is_empty() {
            return true;
        }

        let value = self.get(key);
        let errors: Vec<ValidationError> = providers
            .iter()
            .flat_map(|provider| provider.run(&value, self).into_errors())
            .collect();
        let clean = errors.is_empty();

        if !clean {
            log::trace!("`{}`.{key} failed {} check(s)", self.class(), errors.len());
        }
        let raw = self.raw(key);
        self.validity().borrow_mut().record(key, errors, raw);
        clean
    }

    /// `true` when no property currently has errors.
    #[inline]
    pub fn valid(&self) -> bool {
        self.validity().borrow().is_valid()
    }

    /// The current errors, keyed by property.
    pub fn errors(&self) -> BTreeMap<String, Vec<ValidationError>> {
        self.validity().borrow().errors().clone()
    }

    /// The current errors of one property.
    pub fn property_errors(&self, key: &str) -> Vec<ValidationError> {
        self.validity()
            .borrow()
            .errors()
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    /// Restores erroneous properties to their last clean values.
    ///
    /// With `Some(key)` only that property is considered. A property without
    /// errors, or one that never validated cleanly, is left unchanged, so
    /// calling this on a valid entity does nothing. Restored properties are
    /// validated again.
    pub fn revert(&self, key: Option<&str>) {
        let restore: Vec<(String, Value)> = {
            let record = self.validity().borrow();
            record
                .errors()
                .keys()
                .filter(|errored| key.is_none_or(|only| only == errored.as_str()))
                .filter_map(|errored| {
                    let snapshot = record.snapshot(errored)?;
                    Some((errored.clone(), snapshot.clone()))
                })
                .collect()
        };

        for (key, value) in restore {
            log::trace!("reverting `{}`.{key}", self.class());
            self.write_raw(&key, value);
            self.validate_property(&key);
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::sync::Arc;
    use core::sync::atomic::{AtomicUsize, Ordering};

    use super::{Provider, Validate, ValidationError};
    use crate::behavior::builtin::validate;
    use crate::class::Class;
    use crate::instance::wrap;
    use crate::value::Value;

    fn min_len(len: usize) -> Provider {
        Provider::function(move |value, _| {
            match value.as_str() {
                Some(s) if s.len() < len => alloc::format!("shorter than {len}"),
                _ => String::new(),
            }
        })
    }

    struct NoDigits;

    impl Validate for NoDigits {
        fn validate(&self, value: &Value) -> Option<ValidationError> {
            let s = value.as_str()?;
            s.chars()
                .any(|c| c.is_ascii_digit())
                .then(|| ValidationError::new("contains digits"))
        }
    }

    fn account() -> Class {
        Class::builder("Account")
            .field_default("name", "anonymous")
            .field_default("age", 30)
            .property("name", validate(min_len(3)))
            .property("name", validate(min_len(5)))
            .property("name", validate(Provider::object(NoDigits)))
            .build()
            .unwrap()
    }

    #[test]
    fn errors_aggregate_per_provider() {
        let entity = wrap(&account()).construct();
        assert!(entity.valid());

        entity.set("name", "a1");
        assert!(!entity.valid());
        assert_eq!(entity.property_errors("name").len(), 3);

        entity.set("name", "abc1");
        assert_eq!(entity.property_errors("name").len(), 2);

        entity.set("name", "abcdef");
        assert!(entity.valid());
        assert!(entity.errors().is_empty());
    }

    #[test]
    fn revert_on_valid_entity_changes_nothing() {
        let entity = wrap(&account()).construct();
        entity.set("age", 41);
        let before = entity.get_all();

        entity.revert(None);
        assert_eq!(entity.get_all(), before);
        assert!(entity.valid());
    }

    #[test]
    fn revert_restores_last_clean_value() {
        let entity = wrap(&account()).construct();
        entity.set("name", "valid name");
        entity.set("name", "x");
        assert!(!entity.valid());

        entity.revert(Some("age"));
        assert_eq!(entity.get("name"), Value::from("x"));

        entity.revert(Some("name"));
        assert_eq!(entity.get("name"), Value::from("valid name"));
        assert!(entity.valid());
    }

    #[test]
    fn never_clean_property_is_left_alone() {
        let strict = Class::builder("Strict")
            .field_default("code", "?")
            .property("code", validate(Provider::function(|_, _| false)))
            .build()
            .unwrap();

        let entity = wrap(&strict).construct();
        assert!(!entity.valid());
        assert_eq!(entity.property_errors("code")[0].message(), ValidationError::GENERIC);

        entity.revert(None);
        assert_eq!(entity.get("code"), Value::from("?"));
    }

    #[test]
    fn validators_see_the_entity() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let range = Class::builder("Range")
            .field_default("low", 0)
            .field_default("high", 10)
            .property(
                "high",
                validate(Provider::function(move |value, entity| {
                    seen.fetch_add(1, Ordering::Relaxed);
                    let low = entity.get("low");
                    value.as_int() >= low.as_int()
                })),
            )
            .build()
            .unwrap();

        let entity = wrap(&range).construct();
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert!(entity.valid());

        entity.set("low", 20);
        // `low` has no validators, so nothing re-runs.
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert!(!entity.validate());
    }
}
