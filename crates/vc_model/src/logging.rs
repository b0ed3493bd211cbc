//! The logging collaborator.
//!
//! The engine reports structured records to a single, process-wide sink.
//! The default sink forwards to the [`log`] facade; [`set_sink`] replaces it
//! wholesale and [`reset_sink`] restores the default.

use alloc::string::String;
use alloc::sync::Arc;
use std::sync::{PoisonError, RwLock};

// -----------------------------------------------------------------------------
// LogRecord

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// One structured message from the engine.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    pub class: Option<String>,
    pub key: Option<String>,
}

impl LogRecord {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            class: None,
            key: None,
        }
    }

    #[inline]
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, message)
    }

    #[inline]
    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warn, message)
    }

    #[inline]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, message)
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn with_key(mut self, key: Option<String>) -> Self {
        self.key = key;
        self
    }
}

// -----------------------------------------------------------------------------
// Sink

pub type Sink = Arc<dyn Fn(&LogRecord) + Send + Sync>;

static SINK: RwLock<Option<Sink>> = RwLock::new(None);

/// Replaces the sink.
pub fn set_sink(sink: impl Fn(&LogRecord) + Send + Sync + 'static) {
    *SINK.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(sink));
}

/// Restores the default sink, which forwards to the `log` facade.
pub fn reset_sink() {
    *SINK.write().unwrap_or_else(PoisonError::into_inner) = None;
}

pub(crate) fn emit(record: LogRecord) {
    let sink = SINK
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();

    match sink {
        Some(sink) => sink(&record),
        None => forward(&record),
    }
}

fn forward(record: &LogRecord) {
    let class = record.class.as_deref().unwrap_or("-");
    match record.level {
        LogLevel::Info => log::info!("[{class}] {}", record.message),
        LogLevel::Warn => log::warn!("[{class}] {}", record.message),
        LogLevel::Error => log::error!("[{class}] {}", record.message),
    }
}
