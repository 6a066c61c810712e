//! Tracing setup and the fallback diagnostics channel
//!
//! Failures inside the plugin never reach the host server. They are
//! written to a [`Diagnostics`] sink instead, which by default is a
//! `tracing` error event.

use std::error::Error as StdError;
use tracing_subscriber::EnvFilter;

use crate::{
    config::LogConfig,
    error::{Error, Result},
};

/// Tracing target diagnostics are written to
pub const DIAGNOSTICS_TARGET: &str = "acton_winston::diagnostics";

/// Initialize a tracing subscriber from the log configuration
///
/// Returns `Ok(false)` when a global subscriber was already installed.
pub fn init_tracing(config: &LogConfig) -> Result<bool> {
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = if config.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };

    match installed {
        Ok(()) => {
            tracing::info!(level = %config.level, json = config.json, "Tracing initialized");
            Ok(true)
        }
        Err(e) if tracing::dispatcher::has_been_set() => {
            tracing::debug!("Tracing already initialized: {}", e);
            Ok(false)
        }
        Err(e) => Err(Error::Tracing(e.to_string())),
    }
}

/// Side channel for failures the plugin swallows
pub trait Diagnostics: Send + Sync {
    /// Record a failure that happened in `scope`
    fn report(&self, scope: &'static str, error: &dyn StdError);
}

/// Writes diagnostics as `tracing` error events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn report(&self, scope: &'static str, error: &dyn StdError) {
        tracing::error!(
            target: DIAGNOSTICS_TARGET,
            scope,
            error = %error,
            "acton-winston {} failed: {}",
            scope,
            error
        );
    }
}
