use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::class::Class;
use crate::error::DefinitionError;

// -----------------------------------------------------------------------------
// CastTarget

/// What a cast produces.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum CastTarget {
    /// One instance of the class.
    Single(Class),
    /// A list of instances.
    List(Class),
    /// A keyed map of instances.
    Map(Class),
}

impl CastTarget {
    #[inline]
    pub fn class(&self) -> &Class {
        match self {
            CastTarget::Single(class) | CastTarget::List(class) | CastTarget::Map(class) => class,
        }
    }
}

impl From<Class> for CastTarget {
    #[inline]
    fn from(value: Class) -> Self {
        CastTarget::Single(value)
    }
}

impl From<&Class> for CastTarget {
    #[inline]
    fn from(value: &Class) -> Self {
        CastTarget::Single(value.clone())
    }
}

impl fmt::Display for CastTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CastTarget::Single(class) => write!(f, "{class}"),
            CastTarget::List(class) => write!(f, "[{class}]"),
            CastTarget::Map(class) => write!(f, "{{{class}}}"),
        }
    }
}

// -----------------------------------------------------------------------------
// TargetShape

/// A loosely-shaped cast target: a class, a list holding one class, or a map
/// holding one class.
///
/// Converting into a [`CastTarget`] checks the shape.
///
/// # Examples
///
/// ```
/// use vc_model::class::Class;
/// use vc_model::serde::{CastTarget, TargetShape};
///
/// let tag = Class::builder("Tag").build().unwrap();
///
/// let list = TargetShape::List(vec![TargetShape::Class(tag.clone())]);
/// assert_eq!(CastTarget::try_from(list), Ok(CastTarget::List(tag.clone())));
///
/// let two = TargetShape::List(vec![TargetShape::Class(tag.clone()), TargetShape::Class(tag)]);
/// assert!(CastTarget::try_from(two).is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum TargetShape {
    Class(Class),
    List(Vec<TargetShape>),
    Map(Vec<(String, TargetShape)>),
}

impl TargetShape {
    fn describe(&self) -> String {
        match self {
            TargetShape::Class(class) => String::from(class.name()),
            TargetShape::List(items) => {
                let inner: Vec<String> = items.iter().map(TargetShape::describe).collect();
                alloc::format!("[{}]", inner.join(", "))
            }
            TargetShape::Map(entries) => {
                let inner: Vec<String> = entries
                    .iter()
                    .map(|(key, shape)| alloc::format!("{key}: {}", shape.describe()))
                    .collect();
                alloc::format!("{{{}}}", inner.join(", "))
            }
        }
    }
}

impl TryFrom<TargetShape> for CastTarget {
    type Error = DefinitionError;

    fn try_from(shape: TargetShape) -> Result<Self, Self::Error> {
        let malformed = |shape: &TargetShape| {
            DefinitionError::MalformedCastTarget(alloc::format!(
                "expected a class, [class] or {{key: class}}, found {}",
                shape.describe()
            ))
        };

        match &shape {
            TargetShape::Class(class) => Ok(CastTarget::Single(class.clone())),
            TargetShape::List(items) => match items.as_slice() {
                [TargetShape::Class(class)] => Ok(CastTarget::List(class.clone())),
                _ => Err(malformed(&shape)),
            },
            TargetShape::Map(entries) => match entries.as_slice() {
                [(_, TargetShape::Class(class))] => Ok(CastTarget::Map(class.clone())),
                _ => Err(malformed(&shape)),
            },
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec;

    use super::{CastTarget, TargetShape};
    use crate::class::Class;
    use crate::error::DefinitionError;

    #[test]
    fn shape_checks() {
        let item = Class::builder("Item").build().unwrap();
        let class = || TargetShape::Class(item.clone());

        assert_eq!(CastTarget::try_from(class()), Ok(CastTarget::Single(item.clone())));
        assert_eq!(
            CastTarget::try_from(TargetShape::Map(vec![(String::from("any"), class())])),
            Ok(CastTarget::Map(item.clone())),
        );

        let nested = TargetShape::List(vec![TargetShape::List(vec![class()])]);
        let err = CastTarget::try_from(nested).unwrap_err();
        assert_eq!(
            err,
            DefinitionError::MalformedCastTarget(String::from(
                "expected a class, [class] or {key: class}, found [[Item]]"
            )),
        );

        assert!(CastTarget::try_from(TargetShape::Map(vec![])).is_err());
        assert_eq!(alloc::format!("{}", CastTarget::Map(item)), "{Item}");
    }
}
