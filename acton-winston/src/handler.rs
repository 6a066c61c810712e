//! User override hook for event handling
//!
//! A handler sees every event before the default translation runs and can
//! take it over entirely by returning [`Handled::Handled`].

use crate::context::Context;
use crate::event::ServerEvent;

/// Outcome of a handler override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Handled {
    /// The handler dealt with the event; default translation is skipped
    Handled,
    /// Fall through to default translation
    #[default]
    NotHandled,
}

impl Handled {
    /// Whether default translation should be skipped
    pub fn is_handled(self) -> bool {
        matches!(self, Handled::Handled)
    }
}

impl From<bool> for Handled {
    fn from(handled: bool) -> Self {
        if handled {
            Handled::Handled
        } else {
            Handled::NotHandled
        }
    }
}

/// Override hook invoked with the event's context before translation
pub trait EventHandler: Send + Sync {
    /// Inspect or take over an event
    fn handle(&self, ctx: &Context, event: &ServerEvent) -> Handled;
}

impl<F> EventHandler for F
where
    F: Fn(&Context, &ServerEvent) -> Handled + Send + Sync,
{
    fn handle(&self, ctx: &Context, event: &ServerEvent) -> Handled {
        self(ctx, event)
    }
}

/// Handler that never takes over an event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHandler;

impl EventHandler for NoopHandler {
    fn handle(&self, _ctx: &Context, _event: &ServerEvent) -> Handled {
        Handled::NotHandled
    }
}
