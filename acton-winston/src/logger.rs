//! Leveled logger interface and the entries passed to it
//!
//! Anything exposing `debug`, `info`, `warn` and `error` can receive
//! forwarded events. [`TracingLogger`] is the default and forwards
//! into `tracing`.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

use crate::event::EventError;
use crate::level::Level;

/// Tags as attached to a log line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TagField {
    /// Tags joined with the configured separator
    Joined(String),
    /// Tags in their original order
    List(Vec<String>),
}

/// Request fields attached to a log line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestSummary {
    /// HTTP method
    pub method: String,
    /// Request headers serialized as a JSON object
    pub headers: String,
    /// Request path
    pub url: String,
}

/// Structured fields shaped from an event
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Event tags, when tag inclusion is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<TagField>,

    /// Request summary, for request-scoped events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_info: Option<RequestSummary>,

    /// Non-string event data, when data inclusion is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_info: Option<Value>,

    /// Event data fields merged at the top level
    #[serde(flatten)]
    pub merged: Map<String, Value>,
}

impl Metadata {
    /// Top-level keys owned by the plugin; merged data never replaces them
    pub const RESERVED_FIELDS: [&'static str; 3] = ["tags", "requestInfo", "baseInfo"];

    /// Whether no field is set
    pub fn is_empty(&self) -> bool {
        self.tags.is_none()
            && self.request_info.is_none()
            && self.base_info.is_none()
            && self.merged.is_empty()
    }

    /// JSON rendering of the metadata
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// One call's worth of arguments for a leveled logger method
#[derive(Debug, Clone)]
pub enum LogEntry {
    /// An error value, logged as-is
    Error(EventError),
    /// A message with structured metadata
    Record {
        /// Message text, empty when the event carried none
        message: String,
        /// Shaped fields
        meta: Metadata,
    },
}

impl LogEntry {
    /// Message-only entry
    pub fn message(message: impl Into<String>) -> Self {
        LogEntry::Record {
            message: message.into(),
            meta: Metadata::default(),
        }
    }

    /// Message with metadata
    pub fn record(message: impl Into<String>, meta: Metadata) -> Self {
        LogEntry::Record {
            message: message.into(),
            meta,
        }
    }

    /// The metadata, when this is a record
    pub fn meta(&self) -> Option<&Metadata> {
        match self {
            LogEntry::Error(_) => None,
            LogEntry::Record { meta, .. } => Some(meta),
        }
    }
}

impl From<EventError> for LogEntry {
    fn from(err: EventError) -> Self {
        LogEntry::Error(err)
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogEntry::Error(err) => write!(f, "{err}"),
            LogEntry::Record { message, meta } if meta.is_empty() => f.write_str(message),
            LogEntry::Record { message, meta } => write!(f, "{message} {}", meta.to_json()),
        }
    }
}

/// Leveled logger the plugin forwards to
pub trait Logger: Send + Sync {
    /// Log at debug level
    fn debug(&self, entry: LogEntry);

    /// Log at info level
    fn info(&self, entry: LogEntry);

    /// Log at warn level
    fn warn(&self, entry: LogEntry);

    /// Log at error level
    fn error(&self, entry: LogEntry);

    /// Dispatch to the method named by `level`
    fn log(&self, level: Level, entry: LogEntry) {
        match level {
            Level::Debug => self.debug(entry),
            Level::Info => self.info(entry),
            Level::Warn => self.warn(entry),
            Level::Error => self.error(entry),
        }
    }
}

/// Logger that emits `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    /// Create a tracing-backed logger
    pub fn new() -> Self {
        Self
    }
}

macro_rules! emit {
    ($level:ident, $entry:expr) => {
        match $entry {
            LogEntry::Error(err) => {
                tracing::$level!(target: "acton_winston", error = %err, "{}", err);
            }
            LogEntry::Record { message, meta } if meta.is_empty() => {
                tracing::$level!(target: "acton_winston", "{}", message);
            }
            LogEntry::Record { message, meta } => {
                tracing::$level!(target: "acton_winston", meta = %meta.to_json(), "{}", message);
            }
        }
    };
}

impl Logger for TracingLogger {
    fn debug(&self, entry: LogEntry) {
        emit!(debug, entry)
    }

    fn info(&self, entry: LogEntry) {
        emit!(info, entry)
    }

    fn warn(&self, entry: LogEntry) {
        emit!(warn, entry)
    }

    fn error(&self, entry: LogEntry) {
        emit!(error, entry)
    }
}
