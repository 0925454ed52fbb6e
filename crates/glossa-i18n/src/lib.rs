//! # Glossa I18n
//!
//! Translation lookup for applications that load their own translation
//! files.
//!
//! Keys are interned into [`TranslationKey`] handles, locales into
//! [`LocaleSource`] handles. A [`TranslationService`] holds one
//! [`LocaleTranslations`] store per locale, falls back to the default locale
//! when a translation is missing, and keeps recently resolved content in a
//! bounded [`TranslationCache`].
//!
//! ```
//! use glossa_i18n::{LocaleSource, LocaleTranslations, Replacer, TranslationService};
//!
//! let service = TranslationService::new();
//! service.update_default_locale_source("en_US").unwrap();
//! service
//!     .update_translations([LocaleTranslations::builder(LocaleSource::new("en_US").unwrap())
//!         .text("doc_welcome", "Welcome, {name}!")
//!         .unwrap()
//!         .build()])
//!     .unwrap();
//!
//! let text = service.find_text_or_default("pl_PL", "doc_welcome").unwrap();
//! let greeting = text.replace_all(&Replacer::new().set("name", "Ada"));
//! assert_eq!(greeting.as_str(), "Welcome, Ada!");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod cache;
pub mod content;
pub mod error;
pub mod key;
pub mod locale;
pub mod service;
pub mod store;

pub use batch::*;
pub use cache::*;
pub use content::*;
pub use error::*;
pub use key::*;
pub use locale::*;
pub use service::*;
pub use store::*;

pub use glossa_config::{CacheConfig, CacheSizeMode};
