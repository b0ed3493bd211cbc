use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use thiserror::Error;

use crate::instance::Entity;
use crate::value::Value;

// -----------------------------------------------------------------------------
// ValidationError

/// One failed check on one property.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    /// The message used when a provider rejects a value without saying why.
    pub const GENERIC: &'static str = "invalid value";

    #[inline]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

// -----------------------------------------------------------------------------
// Outcome

/// What a provider reported, normalized to a list of errors.
///
/// Providers may answer with whatever is convenient:
///
/// | Answer                        | Meaning                               |
/// |-------------------------------|---------------------------------------|
/// | `true` / `false`              | valid / one generic error             |
/// | `&str`, `String`              | empty is valid, otherwise one error   |
/// | `ValidationError`             | one error                             |
/// | `Vec<ValidationError>`        | one entry per element                 |
/// | `Option<T>`                   | `None` is valid                       |
/// | `Result<(), E>`               | `Ok` is valid                         |
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct Outcome {
    errors: Vec<ValidationError>,
}

impl Outcome {
    #[inline]
    pub const fn valid() -> Self {
        Self { errors: Vec::new() }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    #[inline]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    #[inline]
    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }
}

impl From<bool> for Outcome {
    fn from(value: bool) -> Self {
        if value {
            Outcome::valid()
        } else {
            ValidationError::new(ValidationError::GENERIC).into()
        }
    }
}

impl From<ValidationError> for Outcome {
    #[inline]
    fn from(value: ValidationError) -> Self {
        Self {
            errors: vec![value],
        }
    }
}

impl From<Vec<ValidationError>> for Outcome {
    #[inline]
    fn from(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }
}

impl From<String> for Outcome {
    fn from(value: String) -> Self {
        if value.is_empty() {
            Outcome::valid()
        } else {
            ValidationError::new(value).into()
        }
    }
}

impl From<&str> for Outcome {
    #[inline]
    fn from(value: &str) -> Self {
        String::from(value).into()
    }
}

impl<T: Into<Outcome>> From<Option<T>> for Outcome {
    #[inline]
    fn from(value: Option<T>) -> Self {
        value.map_or_else(Outcome::valid, Into::into)
    }
}

impl<E: Into<Outcome>> From<Result<(), E>> for Outcome {
    #[inline]
    fn from(value: Result<(), E>) -> Self {
        match value {
            Ok(()) => Outcome::valid(),
            Err(err) => err.into(),
        }
    }
}

// -----------------------------------------------------------------------------
// Provider

/// An object-style validation provider.
pub trait Validate: Send + Sync {
    /// Checks one value, returning the error if it is rejected.
    fn validate(&self, value: &Value) -> Option<ValidationError>;
}

pub type ValidateFn = Arc<dyn Fn(&Value, &Entity) -> Outcome + Send + Sync>;

/// A validation provider attached through the `validate` behavior.
///
/// # Examples
///
/// ```
/// use vc_model::validate::{Provider, Validate, ValidationError};
/// use vc_model::value::Value;
///
/// let not_empty = Provider::function(|value, _| match value.as_str() {
///     Some("") => "must not be empty",
///     _ => "",
/// });
///
/// struct Positive;
///
/// impl Validate for Positive {
///     fn validate(&self, value: &Value) -> Option<ValidationError> {
///         match value.as_int() {
///             Some(n) if n <= 0 => Some(ValidationError::new("must be positive")),
///             _ => None,
///         }
///     }
/// }
///
/// let positive = Provider::object(Positive);
/// # let _ = (not_empty, positive);
/// ```
#[derive(Clone)]
pub enum Provider {
    Function(ValidateFn),
    Object(Arc<dyn Validate>),
}

impl Provider {
    pub fn function<F, O>(f: F) -> Self
    where
        F: Fn(&Value, &Entity) -> O + Send + Sync + 'static,
        O: Into<Outcome>,
    {
        Provider::Function(Arc::new(move |value, entity| f(value, entity).into()))
    }

    pub fn object(validator: impl Validate + 'static) -> Self {
        Provider::Object(Arc::new(validator))
    }

    /// Runs the provider and normalizes its answer.
    pub(crate) fn run(&self, value: &Value, entity: &Entity) -> Outcome {
        match self {
            Provider::Function(f) => f(value, entity),
            Provider::Object(validator) => validator.validate(value).into(),
        }
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Function(_) => f.write_str("Provider::Function"),
            Provider::Object(_) => f.write_str("Provider::Object"),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec;

    use super::{Outcome, ValidationError};

    #[test]
    fn outcome_normalization() {
        assert!(Outcome::from(true).is_valid());
        assert_eq!(Outcome::from(false).errors()[0].message(), ValidationError::GENERIC);

        assert!(Outcome::from("").is_valid());
        assert!(Outcome::from(String::new()).is_valid());
        assert_eq!(Outcome::from("too short").errors().len(), 1);

        let many = vec![ValidationError::new("a"), ValidationError::new("b")];
        assert_eq!(Outcome::from(many).errors().len(), 2);
        assert!(Outcome::from(Vec::<ValidationError>::new()).is_valid());

        assert!(Outcome::from(None::<ValidationError>).is_valid());
        assert!(!Outcome::from(Some(ValidationError::new("x"))).is_valid());

        assert!(Outcome::from(Ok::<(), &str>(())).is_valid());
        assert_eq!(Outcome::from(Err::<(), _>("bad")).errors()[0].message(), "bad");
    }
}
