//! Configuration lookup seam.
//!
//! Where link configurations actually live (database, file, registry) is a
//! host concern. The reader only needs [`ConfigSource::resolve`]; a lookup
//! miss falls back to the hard-coded default, so an attempt can always
//! proceed.

use scanlink_core::SerialLinkConfig;
use std::collections::HashMap;

/// Lookup of link configuration by reader identity.
pub trait ConfigSource: Send + Sync {
    /// Resolve the configuration for `reader_id`, or `None` on a miss.
    fn resolve(&self, reader_id: &str) -> Option<SerialLinkConfig>;
}

/// In-memory configuration source.
///
/// # Examples
///
/// ```
/// use scanlink_core::SerialLinkConfig;
/// use scanlink_reader::{ConfigSource, StaticConfigSource};
///
/// let source = StaticConfigSource::new().with(
///     "line-3-entry",
///     SerialLinkConfig {
///         port_name: "/dev/ttyUSB0".to_string(),
///         ..SerialLinkConfig::fallback()
///     },
/// );
///
/// assert!(source.resolve("line-3-entry").is_some());
/// assert!(source.resolve("unknown").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticConfigSource {
    configs: HashMap<String, SerialLinkConfig>,
}

impl StaticConfigSource {
    /// Create an empty source; every lookup misses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a configuration for a reader identity.
    pub fn insert(&mut self, reader_id: impl Into<String>, config: SerialLinkConfig) {
        self.configs.insert(reader_id.into(), config);
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, reader_id: impl Into<String>, config: SerialLinkConfig) -> Self {
        self.insert(reader_id, config);
        self
    }
}

impl ConfigSource for StaticConfigSource {
    fn resolve(&self, reader_id: &str) -> Option<SerialLinkConfig> {
        self.configs.get(reader_id).cloned()
    }
}
