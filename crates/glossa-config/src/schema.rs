//! Configuration schema definitions using serde.

use glossa_common::LoggingConfig;
use serde::{Deserialize, Serialize};

/// Main configuration structure for Glossa.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlossaConfig {
    /// Locale tag used as fallback when a requested locale lacks a translation.
    pub default_locale: Option<String>,
    /// Translation cache configuration.
    pub cache: CacheConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// How the capacity of the translation cache is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheSizeMode {
    /// Derived from available system memory, clamped to a sane range.
    Automatic,
    /// Caller supplied capacity, see [`CacheConfig::manual_size`].
    Manual,
    /// Fixed capacity of [`crate::DEFAULT_CACHE_SIZE`] entries.
    #[default]
    Default,
}

/// Translation cache configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Sizing policy.
    pub mode: CacheSizeMode,
    /// Capacity used when `mode` is [`CacheSizeMode::Manual`]. Must be positive.
    pub manual_size: usize,
}

impl CacheConfig {
    /// A manually sized cache.
    pub const fn manual(size: usize) -> Self {
        Self {
            mode: CacheSizeMode::Manual,
            manual_size: size,
        }
    }

    /// A cache sized from available memory.
    pub const fn automatic() -> Self {
        Self {
            mode: CacheSizeMode::Automatic,
            manual_size: crate::DEFAULT_CACHE_SIZE,
        }
    }
}
