//! Default values for the configuration schema.

use crate::schema::{CacheConfig, CacheSizeMode, GlossaConfig};
use glossa_common::LoggingConfig;

/// Capacity of the translation cache in [`CacheSizeMode::Default`] mode.
pub const DEFAULT_CACHE_SIZE: usize = 1000;

/// Lower bound for automatically sized caches.
pub const MIN_AUTOMATIC_CACHE_SIZE: usize = 100;

/// Upper bound for automatically sized caches.
pub const MAX_AUTOMATIC_CACHE_SIZE: usize = 50_000;

impl Default for GlossaConfig {
    fn default() -> Self {
        Self {
            default_locale: None,
            cache: CacheConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            mode: CacheSizeMode::Default,
            manual_size: DEFAULT_CACHE_SIZE,
        }
    }
}
