//! Log levels and event tags
//!
//! The host tags every event with a set of strings. When one of those tags
//! names a level, it decides the severity the event is logged at.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Severity an event is forwarded at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Verbose diagnostics
    Debug,
    /// Normal operation
    Info,
    /// Something unexpected but recoverable
    Warn,
    /// A failure
    Error,
}

impl Level {
    /// All levels, lowest severity first
    pub const ALL: [Level; 4] = [Level::Debug, Level::Info, Level::Warn, Level::Error];

    /// Tag lookup order. The first level whose name is tagged wins.
    const PRECEDENCE: [Level; 4] = [Level::Error, Level::Warn, Level::Info, Level::Debug];

    /// Pick the level for an event from its tags, or `fallback` when no tag names a level
    pub fn resolve(tags: &Tags, fallback: Level) -> Level {
        Self::PRECEDENCE
            .into_iter()
            .find(|level| tags.contains(level.as_str()))
            .unwrap_or(fallback)
    }

    /// Lowercase level name, as used in tags
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

impl From<Level> for tracing::Level {
    fn from(level: Level) -> Self {
        match level {
            Level::Debug => tracing::Level::DEBUG,
            Level::Info => tracing::Level::INFO,
            Level::Warn => tracing::Level::WARN,
            Level::Error => tracing::Level::ERROR,
        }
    }
}

/// Set of tags attached to an event
///
/// Presence of a tag is what counts; the host's `{error: true}` mapping
/// becomes a set containing `"error"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(BTreeSet<String>);

impl Tags {
    /// Empty tag set
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a tag is present
    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    /// Add a tag
    pub fn insert(&mut self, tag: impl Into<String>) {
        self.0.insert(tag.into());
    }

    /// Number of distinct tags
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no tags are present
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the tags in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Tags {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for Tags {
    fn from(tags: [S; N]) -> Self {
        tags.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_beats_info() {
        let tags = Tags::from(["error", "info"]);
        assert_eq!(Level::resolve(&tags, Level::Debug), Level::Error);
    }

    #[test]
    fn test_precedence_holds_for_every_combination() {
        // Every subset of the four level tags resolves to its most severe member
        for mask in 1u8..16 {
            let tags: Tags = Level::ALL
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, level)| level.as_str())
                .collect();
            let expected = Level::ALL
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, level)| *level)
                .max()
                .unwrap();
            assert_eq!(Level::resolve(&tags, Level::Info), expected, "tags: {tags:?}");
        }
    }

    #[test]
    fn test_fallback_when_no_level_tag() {
        let tags = Tags::from(["handler", "received"]);
        assert_eq!(Level::resolve(&tags, Level::Info), Level::Info);
        assert_eq!(Level::resolve(&Tags::new(), Level::Debug), Level::Debug);
    }

    #[test]
    fn test_level_tag_overrides_higher_fallback() {
        let tags = Tags::from(["debug"]);
        assert_eq!(Level::resolve(&tags, Level::Error), Level::Debug);
    }

    #[test]
    fn test_level_parse_and_display() {
        assert_eq!("WARN".parse::<Level>().unwrap(), Level::Warn);
        assert_eq!("warning".parse::<Level>().unwrap(), Level::Warn);
        assert!("trace".parse::<Level>().is_err());
        assert_eq!(Level::Error.to_string(), "error");
    }

    #[test]
    fn test_tags_deduplicate() {
        let tags = Tags::from(["a", "b", "a"]);
        assert_eq!(tags.len(), 2);
        assert_eq!(tags.iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
