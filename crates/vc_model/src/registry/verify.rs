use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::mem;

use crate::class::ClassId;
use crate::logging::{self, LogRecord};

// -----------------------------------------------------------------------------
// UsageWarning

/// A behavior that needs wrapped instances, on a class that never was wrapped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UsageWarning {
    pub class: String,
    pub class_id: ClassId,
    pub key: Option<String>,
    pub behavior: &'static str,
}

impl fmt::Display for UsageWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "class `{}` not initialized for dynamic behavior `{}`",
            self.class, self.behavior
        )?;
        if let Some(key) = &self.key {
            write!(f, " on property `{key}`")?;
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// verify

/// Runs the deferred consistency check once.
///
/// Every queued attachment is checked and removed from the queue. Those whose
/// class (or a subclass) still has not been wrapped are reported through the
/// logging sink as warnings and returned. Nothing here ever fails.
pub fn verify() -> Vec<UsageWarning> {
    let pending = mem::take(&mut super::write().pending);

    let warnings: Vec<UsageWarning> = {
        let store = super::read();
        pending
            .into_iter()
            .filter(|check| !store.is_initialized(&check.class))
            .map(|check| UsageWarning {
                class: String::from(check.class.name()),
                class_id: check.class.id(),
                key: check.key,
                behavior: check.behavior,
            })
            .collect()
    };

    for warning in &warnings {
        logging::emit(
            LogRecord::warn(alloc::format!("{warning}"))
                .with_class(warning.class.clone())
                .with_key(warning.key.clone()),
        );
    }
    warnings
}
