//! Server events and their payloads
//!
//! These are the shapes the host server hands to subscribed listeners.
//! The plugin only reads them.

use http::{HeaderMap, Method};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::level::Tags;

/// Names of the server events the plugin subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    /// Server-wide log event
    Log,
    /// Application log event scoped to a request
    Request,
    /// Framework-internal diagnostic event scoped to a request
    RequestInternal,
    /// A request failed
    RequestError,
}

impl EventName {
    /// Every event name, in subscription order
    pub const ALL: [EventName; 4] = [
        EventName::Log,
        EventName::Request,
        EventName::RequestInternal,
        EventName::RequestError,
    ];

    /// Wire name of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::Request => "request",
            Self::RequestInternal => "request-internal",
            Self::RequestError => "request-error",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error value carried by an event
///
/// Cheap to clone; the underlying error is shared.
#[derive(Clone)]
pub struct EventError(Arc<dyn std::error::Error + Send + Sync>);

impl EventError {
    /// Wrap an error
    pub fn new<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self(Arc::new(err))
    }

    /// Build an error from a plain message
    pub fn msg(message: impl Into<String>) -> Self {
        Self(Arc::new(MessageError(message.into())))
    }

    /// The wrapped error
    pub fn inner(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

impl fmt::Debug for EventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for EventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for EventError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

#[derive(Debug)]
struct MessageError(String);

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for MessageError {}

/// Non-error event body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventData {
    /// Ordered tags as the emitter supplied them
    pub tags: Option<Vec<String>>,
    /// Arbitrary event data; `None` means the emitter passed nothing
    pub data: Option<Value>,
}

impl EventData {
    /// Event with only data
    pub fn new(data: impl Into<Value>) -> Self {
        Self {
            tags: None,
            data: Some(data.into()),
        }
    }

    /// Attach ordered tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Tag set view of the ordered tags
    pub fn tag_set(&self) -> Tags {
        self.tags
            .as_deref()
            .map(|tags| tags.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

/// What an event carries: either an error or an event body
#[derive(Debug, Clone)]
pub enum Payload {
    /// The event is an error value
    Error(EventError),
    /// The event is a body with optional tags and data
    Event(EventData),
}

impl From<EventError> for Payload {
    fn from(err: EventError) -> Self {
        Payload::Error(err)
    }
}

impl From<EventData> for Payload {
    fn from(data: EventData) -> Self {
        Payload::Event(data)
    }
}

/// Read-only view of the request an event belongs to
#[derive(Debug, Clone)]
pub struct RequestInfo {
    /// HTTP method
    pub method: Method,
    /// Request headers
    pub headers: HeaderMap,
    /// Request path, without the query string
    pub path: String,
}

impl RequestInfo {
    /// Create a request view
    pub fn new(method: Method, headers: HeaderMap, path: impl Into<String>) -> Self {
        Self {
            method,
            headers,
            path: path.into(),
        }
    }

    /// Capture the parts of an HTTP request the plugin reads
    pub fn from_request<B>(req: &http::Request<B>) -> Self {
        Self {
            method: req.method().clone(),
            headers: req.headers().clone(),
            path: req.uri().path().to_string(),
        }
    }
}

/// An event raised by the host server
#[derive(Debug, Clone)]
pub enum ServerEvent {
    /// Server-wide log event
    Log {
        /// Event body
        event: Payload,
        /// Tag set of the event
        tags: Tags,
    },
    /// Request-scoped application log event
    Request {
        /// Request the event belongs to
        request: RequestInfo,
        /// Event body
        event: Payload,
        /// Tag set of the event
        tags: Tags,
    },
    /// Framework-internal request event
    RequestInternal {
        /// Request the event belongs to
        request: RequestInfo,
        /// Event body
        event: Payload,
        /// Tag set of the event
        tags: Tags,
    },
    /// A request failed with an error
    RequestError {
        /// Request that failed
        request: RequestInfo,
        /// The failure
        error: EventError,
    },
}

impl ServerEvent {
    /// Name the event is dispatched under
    pub fn name(&self) -> EventName {
        match self {
            Self::Log { .. } => EventName::Log,
            Self::Request { .. } => EventName::Request,
            Self::RequestInternal { .. } => EventName::RequestInternal,
            Self::RequestError { .. } => EventName::RequestError,
        }
    }

    /// Request the event belongs to, if any
    pub fn request(&self) -> Option<&RequestInfo> {
        match self {
            Self::Log { .. } => None,
            Self::Request { request, .. }
            | Self::RequestInternal { request, .. }
            | Self::RequestError { request, .. } => Some(request),
        }
    }

    /// Tags the host attached; request errors carry none
    pub fn tags(&self) -> Option<&Tags> {
        match self {
            Self::Log { tags, .. }
            | Self::Request { tags, .. }
            | Self::RequestInternal { tags, .. } => Some(tags),
            Self::RequestError { .. } => None,
        }
    }
}
