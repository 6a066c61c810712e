//! HTTP integration
//!
//! [`EventLayer`] drives an [`EventHub`] from an axum/tower stack: it binds
//! each request to the hub, runs the `onRequest` extensions and raises the
//! request lifecycle events. [`RequestLog`] is the per-request logging
//! handle the plugin installs, extractable directly in handlers.

use axum::extract::FromRequestParts;
use axum::http::{request::Parts, Request, Response, StatusCode};
use futures::future::BoxFuture;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

use crate::event::{EventError, RequestInfo, ServerEvent};
use crate::logger::{LogEntry, Logger};
use crate::server::{EventHub, RequestEvents};

/// Per-request logging handle
///
/// Leveled methods go straight to the plugin's logger; [`RequestLog::log`]
/// keeps the host behaviour of raising a `request` event.
///
/// ```rust,ignore
/// async fn handler(log: RequestLog) -> &'static str {
///     log.info(LogEntry::message("listing users"));
///     log.log(["cache", "warn"], Some(json!("cold cache")));
///     "ok"
/// }
/// ```
#[derive(Clone)]
pub struct RequestLog {
    events: Option<RequestEvents>,
    logger: Arc<dyn Logger>,
}

impl RequestLog {
    /// Decorate the host's request events with a leveled logger
    pub fn new(events: Option<RequestEvents>, logger: Arc<dyn Logger>) -> Self {
        Self { events, logger }
    }

    /// Raise a `request` event through the host
    pub fn log<I, S>(&self, tags: I, data: Option<Value>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match &self.events {
            Some(events) => events.log(tags, data),
            None => tracing::trace!("No request events bound; dropping request log"),
        }
    }

    /// Forward to the logger's `debug`
    pub fn debug(&self, entry: impl Into<LogEntry>) {
        self.logger.debug(entry.into());
    }

    /// Forward to the logger's `info`
    pub fn info(&self, entry: impl Into<LogEntry>) {
        self.logger.info(entry.into());
    }

    /// Forward to the logger's `warn`
    pub fn warn(&self, entry: impl Into<LogEntry>) {
        self.logger.warn(entry.into());
    }

    /// Forward to the logger's `error`
    pub fn error(&self, entry: impl Into<LogEntry>) {
        self.logger.error(entry.into());
    }

    /// The logger itself
    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    /// The request this handle belongs to, when bound by the host
    pub fn request(&self) -> Option<&RequestInfo> {
        self.events.as_ref().map(RequestEvents::request)
    }
}

impl fmt::Debug for RequestLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestLog")
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl<S> FromRequestParts<S> for RequestLog
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<RequestLog>().cloned().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "request logging is not configured",
        ))
    }
}

/// Layer that raises server events for every HTTP request
#[derive(Clone, Debug)]
pub struct EventLayer {
    hub: Arc<EventHub>,
}

impl EventLayer {
    /// Drive `hub` from the wrapped service
    pub fn new(hub: Arc<EventHub>) -> Self {
        Self { hub }
    }
}

impl<S> Layer<S> for EventLayer {
    type Service = EventService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        EventService {
            inner,
            hub: Arc::clone(&self.hub),
        }
    }
}

/// Service produced by [`EventLayer`]
#[derive(Clone, Debug)]
pub struct EventService<S> {
    inner: S,
    hub: Arc<EventHub>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for EventService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let mut inner = self.inner.clone();
        let hub = Arc::clone(&self.hub);

        let info = RequestInfo::from_request(&req);
        let events = RequestEvents::new(Arc::clone(&hub), info.clone());

        req.extensions_mut().insert(events.clone());
        hub.run_on_request(req.extensions_mut());
        events.internal(["received"], None);

        Box::pin(async move {
            let result = inner.call(req).await;

            if let Ok(response) = &result {
                let status = response.status();
                events.internal(["response"], Some(json!(status.as_u16())));

                if status.is_server_error() {
                    hub.emit(&ServerEvent::RequestError {
                        request: info,
                        error: EventError::msg(format!("request failed with status {status}")),
                    });
                }
            }

            result
        })
    }
}
