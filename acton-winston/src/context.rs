//! Per-event logging context

use std::fmt;
use std::sync::Arc;

use crate::config::Settings;
use crate::level::{Level, Tags};
use crate::logger::Logger;

/// Everything needed to log one event
///
/// Built fresh for each event and never mutated afterwards.
#[derive(Clone)]
pub struct Context {
    /// Level the event is logged at
    pub level: Level,
    /// Logger the event is forwarded to
    pub logger: Arc<dyn Logger>,
    /// Attach tags to the log line
    pub include_tags: bool,
    /// Attach non-string data to the log line
    pub include_data: bool,
    /// Merge object data into the top level
    pub merge_data: bool,
    /// Drop events that carry nothing to log
    pub skip_undefined: bool,
    /// Separator for joining tags
    pub join_tags: Option<String>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("level", &self.level)
            .field("include_tags", &self.include_tags)
            .field("include_data", &self.include_data)
            .field("merge_data", &self.merge_data)
            .field("skip_undefined", &self.skip_undefined)
            .field("join_tags", &self.join_tags)
            .finish_non_exhaustive()
    }
}

/// Builds contexts from the settings captured at registration
#[derive(Clone)]
pub struct ContextFactory {
    logger: Arc<dyn Logger>,
    settings: Arc<Settings>,
}

impl ContextFactory {
    /// Capture the logger and settings for the lifetime of the plugin
    pub fn new(logger: Arc<dyn Logger>, settings: Settings) -> Self {
        Self {
            logger,
            settings: Arc::new(settings),
        }
    }

    /// Context for an event with `tags`, logged at `fallback` unless a tag names a level
    pub fn make(&self, tags: &Tags, fallback: Level) -> Context {
        Context {
            level: Level::resolve(tags, fallback),
            logger: Arc::clone(&self.logger),
            include_tags: self.settings.include_tags,
            include_data: self.settings.include_data,
            merge_data: self.settings.merge_data,
            skip_undefined: self.settings.skip_undefined,
            join_tags: self.settings.join_tags.clone(),
        }
    }

    /// Settings every context is built from
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::TracingLogger;

    fn factory(settings: Settings) -> ContextFactory {
        ContextFactory::new(Arc::new(TracingLogger), settings)
    }

    #[test]
    fn test_context_copies_settings() {
        let settings = Settings::default()
            .with_include_tags(true)
            .with_merge_data(true)
            .with_join_tags(",");
        let ctx = factory(settings).make(&Tags::new(), Level::Info);

        assert_eq!(ctx.level, Level::Info);
        assert!(ctx.include_tags);
        assert!(ctx.include_data);
        assert!(ctx.merge_data);
        assert!(ctx.skip_undefined);
        assert_eq!(ctx.join_tags.as_deref(), Some(","));
    }

    #[test]
    fn test_context_level_from_tags() {
        let contexts = factory(Settings::default());
        assert_eq!(contexts.make(&Tags::from(["warn"]), Level::Info).level, Level::Warn);
        assert_eq!(
            contexts.make(&Tags::from(["error", "info"]), Level::Debug).level,
            Level::Error
        );
        assert_eq!(contexts.make(&Tags::from(["db"]), Level::Debug).level, Level::Debug);
    }

    #[test]
    fn test_contexts_share_logger() {
        let contexts = factory(Settings::default());
        let a = contexts.make(&Tags::new(), Level::Info);
        let b = contexts.make(&Tags::new(), Level::Info);
        assert!(Arc::ptr_eq(&a.logger, &b.logger));
    }
}
