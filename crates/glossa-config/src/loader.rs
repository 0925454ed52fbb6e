//! Configuration loading from TOML, YAML or JSON files with environment overrides.

use crate::schema::{CacheSizeMode, GlossaConfig};
use glossa_common::{GlossaError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable overriding [`GlossaConfig::default_locale`].
pub const ENV_DEFAULT_LOCALE: &str = "GLOSSA_DEFAULT_LOCALE";
/// Environment variable overriding the cache sizing mode.
pub const ENV_CACHE_MODE: &str = "GLOSSA_CACHE_MODE";
/// Environment variable overriding the manual cache size.
pub const ENV_CACHE_SIZE: &str = "GLOSSA_CACHE_SIZE";
/// Environment variable overriding the log level filter.
pub const ENV_LOG_LEVEL: &str = "GLOSSA_LOG_LEVEL";

/// Serialization format of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.toml`
    Toml,
    /// `.yaml` / `.yml`
    Yaml,
    /// `.json`
    Json,
}

impl ConfigFormat {
    /// Picks the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(Self::Toml),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            _ => Err(GlossaError::config(format!(
                "Unsupported configuration file extension: {}",
                path.display()
            ))),
        }
    }

    /// Parses `content` in this format.
    pub fn parse(self, content: &str) -> Result<GlossaConfig> {
        match self {
            Self::Toml => toml::from_str(content)
                .map_err(|e| GlossaError::serialization_with_source("TOML parsing error", e)),
            Self::Yaml => serde_yaml::from_str(content)
                .map_err(|e| GlossaError::serialization_with_source("YAML parsing error", e)),
            Self::Json => Ok(serde_json::from_str(content)?),
        }
    }
}

/// Configuration loader.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    path: PathBuf,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path this loader reads from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads, overrides from the process environment, and validates.
    pub fn load(&self) -> Result<GlossaConfig> {
        self.load_with_env(|name| std::env::var(name).ok())
    }

    /// Like [`ConfigLoader::load`] with an explicit environment lookup.
    pub fn load_with_env<F>(&self, lookup: F) -> Result<GlossaConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let format = ConfigFormat::from_path(&self.path)?;
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            GlossaError::config_with_source(
                format!("Failed to read configuration file {}", self.path.display()),
                e,
            )
        })?;

        let mut config = format.parse(&content)?;
        apply_env_overrides(&mut config, lookup)?;
        config.validate()?;

        info!(path = %self.path.display(), "Loaded configuration");
        Ok(config)
    }
}

/// Applies `GLOSSA_*` overrides found through `lookup`.
pub fn apply_env_overrides<F>(config: &mut GlossaConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(locale) = lookup(ENV_DEFAULT_LOCALE) {
        debug!(locale = %locale, "Default locale overridden from environment");
        config.default_locale = Some(locale);
    }

    if let Some(mode) = lookup(ENV_CACHE_MODE) {
        config.cache.mode = match mode.trim().to_ascii_lowercase().as_str() {
            "automatic" => CacheSizeMode::Automatic,
            "manual" => CacheSizeMode::Manual,
            "default" => CacheSizeMode::Default,
            other => {
                return Err(GlossaError::validation_field(
                    format!("Unknown cache mode '{other}'"),
                    ENV_CACHE_MODE,
                ))
            }
        };
    }

    if let Some(size) = lookup(ENV_CACHE_SIZE) {
        config.cache.manual_size = size.trim().parse().map_err(|_| {
            GlossaError::validation_field(
                format!("Cache size '{size}' is not a non-negative integer"),
                ENV_CACHE_SIZE,
            )
        })?;
    }

    if let Some(level) = lookup(ENV_LOG_LEVEL) {
        config.logging.level = level;
    }

    Ok(())
}
