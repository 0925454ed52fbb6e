//! Runtime validation of loaded configuration.

use crate::schema::{CacheSizeMode, GlossaConfig};
use glossa_common::{GlossaError, Result};

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates a configuration.
    pub fn validate(config: &GlossaConfig) -> Result<()> {
        config.validate()
    }
}

impl GlossaConfig {
    /// Validates the configuration.
    ///
    /// Locale tags are only checked for presence here; their syntax is
    /// checked when the translation service parses them.
    pub fn validate(&self) -> Result<()> {
        if let Some(locale) = &self.default_locale {
            if locale.trim().is_empty() {
                return Err(GlossaError::validation_field(
                    "Default locale cannot be blank",
                    "default_locale",
                ));
            }
        }

        if self.cache.mode == CacheSizeMode::Manual && self.cache.manual_size == 0 {
            return Err(GlossaError::validation_field(
                "Manual cache size must be greater than zero",
                "cache.manual_size",
            ));
        }

        if self.logging.level.trim().is_empty() {
            return Err(GlossaError::validation_field(
                "Log level cannot be empty",
                "logging.level",
            ));
        }

        Ok(())
    }
}
