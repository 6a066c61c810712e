//! # acton-winston
//!
//! Forwards server lifecycle events to a pluggable leveled logger.
//!
//! The plugin subscribes to the host's `log`, `request`, `request-internal`
//! and `request-error` events, picks a level from each event's tags, shapes
//! the payload according to [`Settings`] and makes at most one call into
//! the configured [`Logger`]. It also gives every request a [`RequestLog`]
//! whose leveled methods go straight to that logger.
//!
//! Logging never takes the server down: apart from a missing logger at
//! registration, every failure is reported to a [`Diagnostics`] sink and
//! swallowed.
//!
//! ## Example
//!
//! ```rust,ignore
//! use acton_winston::prelude::*;
//! use axum::{routing::get, Router};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load()?;
//!     init_tracing(&config.log)?;
//!
//!     let mut hub = EventHub::new();
//!     register(
//!         &mut hub,
//!         PluginOptions::from_config(&config).with_logger(Arc::new(TracingLogger)),
//!     )
//!     .await?;
//!
//!     let app: Router = Router::new()
//!         .route("/", get(|log: RequestLog| async move {
//!             log.info(LogEntry::message("hello"));
//!             "hello"
//!         }))
//!         .layer(EventLayer::new(hub.into_shared()));
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod handler;
pub mod level;
pub mod logger;
pub mod middleware;
pub mod observability;
pub mod plugin;
pub mod server;
pub mod translate;

#[cfg(test)]
mod test_support;

pub use config::{Config, LogConfig, Settings};
pub use context::{Context, ContextFactory};
pub use error::{Error, HostError, Result, TranslateError};
pub use event::{EventData, EventError, EventName, Payload, RequestInfo, ServerEvent};
pub use handler::{EventHandler, Handled, NoopHandler};
pub use level::{Level, Tags};
pub use logger::{LogEntry, Logger, Metadata, RequestSummary, TagField, TracingLogger};
pub use middleware::{EventLayer, EventService, RequestLog};
pub use observability::{init_tracing, Diagnostics, TracingDiagnostics};
pub use plugin::{register, Plugin, PluginOptions, WinstonPlugin, PLUGIN_NAME};
pub use server::{EventHub, Listener, OnRequest, RequestEvents, Server};
pub use translate::{shape, translate};

/// Commonly used items
pub mod prelude {
    pub use crate::config::{Config, LogConfig, Settings};
    pub use crate::error::{Error, Result};
    pub use crate::event::{EventData, EventError, Payload, ServerEvent};
    pub use crate::handler::{EventHandler, Handled};
    pub use crate::level::{Level, Tags};
    pub use crate::logger::{LogEntry, Logger, TracingLogger};
    pub use crate::middleware::{EventLayer, RequestLog};
    pub use crate::observability::init_tracing;
    pub use crate::plugin::{register, Plugin, PluginOptions, WinstonPlugin};
    pub use crate::server::{EventHub, Server};
}
