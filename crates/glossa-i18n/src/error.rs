//! Error types for translation lookups

use glossa_common::GlossaError;
use thiserror::Error;

/// Errors that can occur during translation operations
#[derive(Error, Debug)]
pub enum I18nError {
    /// Structurally required input was empty or malformed
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Strict key lookup found no interned key
    #[error("Translation key does not exist: {key}")]
    KeyNotFound {
        /// Normalized key name
        key: String,
    },

    /// A locale store was required but is not loaded
    #[error("Locale not supported: {0}")]
    LocaleNotSupported(String),

    /// Neither the requested nor the default locale has the key
    #[error("Translation not found for key {key} in locale {locale}")]
    TranslationKeyNotFound {
        /// Normalized key name
        key: String,
        /// Requested locale tag
        locale: String,
    },

    /// Cache capacity must be positive
    #[error("Invalid cache size {size}: cache size must be greater than zero")]
    InvalidCacheSize {
        /// Rejected capacity
        size: usize,
    },

    /// Configuration could not be applied
    #[error(transparent)]
    Config(#[from] GlossaError),
}

impl I18nError {
    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn locale_not_supported(msg: impl Into<String>) -> Self {
        Self::LocaleNotSupported(msg.into())
    }
}

/// Result type for translation operations
pub type I18nResult<T> = Result<T, I18nError>;
