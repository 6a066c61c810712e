//! Error types for plugin registration and event translation

use thiserror::Error;

/// Result type alias using the crate [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to whoever registers the plugin
#[derive(Debug, Error)]
pub enum Error {
    /// No logger was supplied in the plugin options
    #[error("logger required")]
    LoggerRequired,

    /// Configuration could not be loaded or extracted
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// The host server refused a subscription
    #[error("Host error: {0}")]
    Host(#[from] HostError),

    /// The tracing subscriber could not be installed
    #[error("Tracing error: {0}")]
    Tracing(String),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

impl Error {
    /// Whether this error rejects plugin setup (as opposed to a wiring failure)
    pub fn is_config(&self) -> bool {
        matches!(self, Error::LoggerRequired | Error::Config(_))
    }
}

/// Failure while shaping or emitting a single log line
///
/// These never reach the host server. The wiring in [`crate::plugin`]
/// reports them to the fallback diagnostics channel and drops the event.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// The logger panicked while handling the entry
    #[error("logger panicked: {message}")]
    LoggerPanicked {
        /// Panic message, when it was a string
        message: String,
    },

    /// Request headers could not be serialized
    #[error("failed to serialize request headers: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors raised by the host server's extension points
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The hub has been closed and accepts no new subscriptions
    #[error("event hub is closed to new subscriptions")]
    Closed,
}
