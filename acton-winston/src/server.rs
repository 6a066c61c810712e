//! Host server interface
//!
//! [`Server`] is the surface a plugin registers against: named event
//! subscriptions plus the per-request `onRequest` extension point.
//! [`EventHub`] is the in-process implementation used with
//! [`crate::middleware::EventLayer`].

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::HostError;
use crate::event::{EventData, EventName, RequestInfo, ServerEvent};
use crate::level::Tags;

/// Subscriber for a named server event
pub type Listener = Arc<dyn Fn(&ServerEvent) + Send + Sync>;

/// Extension run for every request before any other request event
pub type OnRequest = Arc<dyn Fn(&mut http::Extensions) + Send + Sync>;

/// Extension points a plugin can hook into
pub trait Server {
    /// Subscribe `listener` to events named `event`
    fn on(&mut self, event: EventName, listener: Listener) -> Result<(), HostError>;

    /// Run `ext` at the start of every request
    fn ext_on_request(&mut self, ext: OnRequest) -> Result<(), HostError>;
}

/// Synchronous in-process event dispatcher
///
/// Listeners run on the emitting task, in subscription order.
#[derive(Default)]
pub struct EventHub {
    listeners: HashMap<EventName, Vec<Listener>>,
    on_request: Vec<OnRequest>,
    closed: bool,
}

impl EventHub {
    /// Create an empty hub
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop accepting subscriptions
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Whether subscriptions are still accepted
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Freeze the hub for sharing with request handling
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Dispatch an event to its subscribers
    pub fn emit(&self, event: &ServerEvent) {
        let Some(listeners) = self.listeners.get(&event.name()) else {
            return;
        };

        tracing::trace!(event = %event.name(), listeners = listeners.len(), "Dispatching server event");
        for listener in listeners {
            listener(event);
        }
    }

    /// Emit a server-level `log` event with `tags` and optional `data`
    pub fn log<I, S>(&self, tags: I, data: Option<Value>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (event, tags) = tagged_event(tags, data);
        self.emit(&ServerEvent::Log {
            event: event.into(),
            tags,
        });
    }

    /// Run every `onRequest` extension against a request's extensions
    pub fn run_on_request(&self, extensions: &mut http::Extensions) {
        for ext in &self.on_request {
            ext(extensions);
        }
    }

    /// Number of listeners subscribed to `event`
    pub fn listener_count(&self, event: EventName) -> usize {
        self.listeners.get(&event).map_or(0, Vec::len)
    }

    /// Number of listeners across all events
    pub fn total_listeners(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }

    /// Number of registered `onRequest` extensions
    pub fn on_request_count(&self) -> usize {
        self.on_request.len()
    }
}

impl Server for EventHub {
    fn on(&mut self, event: EventName, listener: Listener) -> Result<(), HostError> {
        if self.closed {
            return Err(HostError::Closed);
        }
        tracing::debug!(event = %event, "Subscribing listener");
        self.listeners.entry(event).or_default().push(listener);
        Ok(())
    }

    fn ext_on_request(&mut self, ext: OnRequest) -> Result<(), HostError> {
        if self.closed {
            return Err(HostError::Closed);
        }
        self.on_request.push(ext);
        Ok(())
    }
}

impl fmt::Debug for EventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHub")
            .field("listeners", &self.total_listeners())
            .field("on_request", &self.on_request.len())
            .field("closed", &self.closed)
            .finish()
    }
}

/// The host's per-request event entry point
///
/// Placed in the request extensions before `onRequest` extensions run.
#[derive(Clone)]
pub struct RequestEvents {
    hub: Arc<EventHub>,
    request: RequestInfo,
}

impl RequestEvents {
    /// Bind a request to the hub
    pub fn new(hub: Arc<EventHub>, request: RequestInfo) -> Self {
        Self { hub, request }
    }

    /// Request this handle emits for
    pub fn request(&self) -> &RequestInfo {
        &self.request
    }

    /// Emit a `request` event with `tags` and optional `data`
    pub fn log<I, S>(&self, tags: I, data: Option<Value>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (event, tags) = tagged_event(tags, data);
        self.hub.emit(&ServerEvent::Request {
            request: self.request.clone(),
            event: event.into(),
            tags,
        });
    }

    /// Emit a framework-internal `request-internal` event
    pub fn internal<I, S>(&self, tags: I, data: Option<Value>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (event, tags) = tagged_event(tags, data);
        self.hub.emit(&ServerEvent::RequestInternal {
            request: self.request.clone(),
            event: event.into(),
            tags,
        });
    }
}

fn tagged_event<I, S>(tags: I, data: Option<Value>) -> (EventData, Tags)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let event = EventData {
        tags: Some(tags.into_iter().map(Into::into).collect()),
        data,
    };
    let tags = event.tag_set();
    (event, tags)
}

impl fmt::Debug for RequestEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestEvents")
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Payload;
    use http::{HeaderMap, Method};
    use serde_json::json;
    use std::sync::Mutex;

    fn collector(hub: &mut EventHub, name: EventName) -> Arc<Mutex<Vec<ServerEvent>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        hub.on(
            name,
            Arc::new(move |event: &ServerEvent| sink.lock().unwrap().push(event.clone())),
        )
        .unwrap();
        seen
    }

    #[test]
    fn test_emit_reaches_only_named_listeners() {
        let mut hub = EventHub::new();
        let logs = collector(&mut hub, EventName::Log);
        let errors = collector(&mut hub, EventName::RequestError);

        hub.emit(&ServerEvent::Log {
            event: EventData::new("hi").into(),
            tags: Tags::new(),
        });

        assert_eq!(logs.lock().unwrap().len(), 1);
        assert!(errors.lock().unwrap().is_empty());
        assert_eq!(hub.listener_count(EventName::Log), 1);
        assert_eq!(hub.total_listeners(), 2);
    }

    #[test]
    fn test_hub_log_emits_log_event() {
        let mut hub = EventHub::new();
        let logs = collector(&mut hub, EventName::Log);

        hub.log(["db", "error"], Some(json!({"pool": "exhausted"})));

        let logs = logs.lock().unwrap();
        assert_eq!(logs.len(), 1);
        match &logs[0] {
            ServerEvent::Log { event, tags } => {
                assert!(tags.contains("error"));
                assert_eq!(tags.len(), 2);
                match event {
                    Payload::Event(data) => {
                        assert_eq!(data.tags.as_deref().unwrap(), ["db", "error"]);
                        assert_eq!(data.data, Some(json!({"pool": "exhausted"})));
                    }
                    Payload::Error(err) => panic!("unexpected error payload {err}"),
                }
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_closed_hub_rejects_subscriptions() {
        let mut hub = EventHub::new();
        hub.close();
        assert!(hub.is_closed());
        assert_eq!(hub.on(EventName::Log, Arc::new(|_: &ServerEvent| {})), Err(HostError::Closed));
        assert_eq!(
            hub.ext_on_request(Arc::new(|_: &mut http::Extensions| {})),
            Err(HostError::Closed)
        );
        assert_eq!(hub.total_listeners(), 0);
    }

    #[test]
    fn test_on_request_extensions_run_in_order() {
        let mut hub = EventHub::new();
        hub.ext_on_request(Arc::new(|ext: &mut http::Extensions| {
            ext.insert(vec!["first"]);
        }))
        .unwrap();
        hub.ext_on_request(Arc::new(|ext: &mut http::Extensions| {
            if let Some(seen) = ext.get_mut::<Vec<&'static str>>() {
                seen.push("second");
            }
        }))
        .unwrap();

        let mut extensions = http::Extensions::new();
        hub.run_on_request(&mut extensions);
        assert_eq!(extensions.get::<Vec<&'static str>>().unwrap(), &vec!["first", "second"]);
        assert_eq!(hub.on_request_count(), 2);
    }

    #[test]
    fn test_request_events_emit_request_event() {
        let mut hub = EventHub::new();
        let seen = collector(&mut hub, EventName::Request);
        let hub = hub.into_shared();

        let events = RequestEvents::new(hub, RequestInfo::new(Method::GET, HeaderMap::new(), "/a"));
        events.log(["warn", "cache"], Some(json!("miss")));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        match &seen[0] {
            ServerEvent::Request { request, event, tags } => {
                assert_eq!(request.path, "/a");
                assert!(tags.contains("warn"));
                match event {
                    Payload::Event(data) => {
                        assert_eq!(data.tags.as_deref().unwrap(), ["warn", "cache"]);
                        assert_eq!(data.data, Some(json!("miss")));
                    }
                    Payload::Error(err) => panic!("unexpected error payload {err}"),
                }
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
