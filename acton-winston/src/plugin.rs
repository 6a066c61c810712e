//! Plugin registration
//!
//! [`register`] validates the options, captures the settings and wires
//! four event listeners plus one `onRequest` extension into the host:
//!
//! | event              | fallback level | notes                                   |
//! |--------------------|----------------|-----------------------------------------|
//! | `log`              | info           | no request                              |
//! | `request`          | info           |                                         |
//! | `request-internal` | debug          | dropped unless a tag raises the level   |
//! | `request-error`    | error          | tags are ignored                        |
//!
//! Only a missing logger rejects registration. Wiring and translation
//! failures are reported to the diagnostics channel and never reach the
//! host.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::config::{Config, Settings};
use crate::context::{Context, ContextFactory};
use crate::error::{Error, HostError, Result};
use crate::event::{EventName, Payload, RequestInfo, ServerEvent};
use crate::handler::{EventHandler, NoopHandler};
use crate::level::{Level, Tags};
use crate::logger::Logger;
use crate::middleware::RequestLog;
use crate::observability::{Diagnostics, TracingDiagnostics};
use crate::server::{RequestEvents, Server};
use crate::translate::translate;

/// Name the plugin registers under
pub const PLUGIN_NAME: &str = "acton-winston";

/// Options accepted by [`register`]
#[derive(Clone, Default)]
pub struct PluginOptions {
    /// Logger events are forwarded to (required)
    pub logger: Option<Arc<dyn Logger>>,
    /// Override hook run before default translation
    pub handler: Option<Arc<dyn EventHandler>>,
    /// Sink for swallowed failures; defaults to [`TracingDiagnostics`]
    pub diagnostics: Option<Arc<dyn Diagnostics>>,
    /// Shaping flags
    pub settings: Settings,
}

impl PluginOptions {
    /// Options with default settings and no logger
    pub fn new() -> Self {
        Self::default()
    }

    /// Options using the plugin section of a loaded configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new().with_settings(config.plugin.clone())
    }

    /// Set the logger
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Set the override handler
    pub fn with_handler(mut self, handler: impl EventHandler + 'static) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Set the diagnostics sink
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    /// Replace the shaping flags
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }
}

impl fmt::Debug for PluginOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginOptions")
            .field("logger", &self.logger.is_some())
            .field("handler", &self.handler.is_some())
            .field("diagnostics", &self.diagnostics.is_some())
            .field("settings", &self.settings)
            .finish()
    }
}

/// A plugin the host can register
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Registry name
    fn name(&self) -> &'static str;

    /// Hook the plugin into `server`
    async fn register(&self, server: &mut (dyn Server + Send), options: PluginOptions) -> Result<()>;
}

/// The event logging plugin
#[derive(Debug, Clone, Copy, Default)]
pub struct WinstonPlugin;

#[async_trait]
impl Plugin for WinstonPlugin {
    fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    async fn register(&self, server: &mut (dyn Server + Send), options: PluginOptions) -> Result<()> {
        register(server, options).await
    }
}

/// Register the plugin on `server`
///
/// Fails with [`Error::LoggerRequired`] when no logger is supplied, in which
/// case nothing is subscribed. Any failure while wiring is reported to the
/// diagnostics channel and registration still completes.
pub async fn register<S>(server: &mut S, mut options: PluginOptions) -> Result<()>
where
    S: Server + ?Sized,
{
    let Some(logger) = options.logger.take() else {
        return Err(Error::LoggerRequired);
    };
    let handler = options
        .handler
        .take()
        .unwrap_or_else(|| Arc::new(NoopHandler));
    let diagnostics = options
        .diagnostics
        .take()
        .unwrap_or_else(|| Arc::new(TracingDiagnostics));

    let bridge = Arc::new(Bridge {
        contexts: ContextFactory::new(Arc::clone(&logger), options.settings),
        handler,
        diagnostics: Arc::clone(&diagnostics),
    });

    match wire(server, bridge, logger) {
        Ok(()) => tracing::info!(plugin = PLUGIN_NAME, "Plugin registered"),
        Err(err) => diagnostics.report("register", &err),
    }

    Ok(())
}

fn wire<S>(server: &mut S, bridge: Arc<Bridge>, logger: Arc<dyn Logger>) -> std::result::Result<(), HostError>
where
    S: Server + ?Sized,
{
    server.ext_on_request(Arc::new(move |extensions: &mut http::Extensions| {
        let events = extensions.get::<RequestEvents>().cloned();
        extensions.insert(RequestLog::new(events, Arc::clone(&logger)));
    }))?;

    for name in EventName::ALL {
        let bridge = Arc::clone(&bridge);
        server.on(name, Arc::new(move |event: &ServerEvent| bridge.dispatch(event)))?;
        tracing::debug!(plugin = PLUGIN_NAME, event = %name, "Listener subscribed");
    }

    Ok(())
}

/// State shared by every subscribed listener
struct Bridge {
    contexts: ContextFactory,
    handler: Arc<dyn EventHandler>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl Bridge {
    fn dispatch(&self, server_event: &ServerEvent) {
        match server_event {
            ServerEvent::Log { event, tags } => {
                let ctx = self.contexts.make(tags, Level::Info);
                self.deliver(&ctx, server_event, Some(event), None);
            }
            ServerEvent::Request { request, event, tags } => {
                let ctx = self.contexts.make(tags, Level::Info);
                self.deliver(&ctx, server_event, Some(event), Some(request));
            }
            ServerEvent::RequestInternal { request, event, tags } => {
                let ctx = self.contexts.make(tags, Level::Debug);
                if ctx.level == Level::Debug {
                    return;
                }
                self.deliver(&ctx, server_event, Some(event), Some(request));
            }
            ServerEvent::RequestError { request, error } => {
                let ctx = self.contexts.make(&Tags::new(), Level::Error);
                let payload = Payload::Error(error.clone());
                self.deliver(&ctx, server_event, Some(&payload), Some(request));
            }
        }
    }

    fn deliver(
        &self,
        ctx: &Context,
        server_event: &ServerEvent,
        payload: Option<&Payload>,
        request: Option<&RequestInfo>,
    ) {
        if self.handler.handle(ctx, server_event).is_handled() {
            return;
        }

        if let Err(err) = translate(ctx, payload, request) {
            self.diagnostics.report("translate", &err);
        }
    }
}
