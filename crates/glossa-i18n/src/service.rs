//! The translation service: locale stores, default-locale fallback and the
//! shared lookup cache.
//!
//! Readers load an immutable snapshot of the loaded stores without locking.
//! Writers take the write lock, build a new snapshot and publish it in one
//! atomic swap, so a reader sees either the whole old set of stores or the
//! whole new one.

use crate::cache::{capacity_for, CacheKey, CacheStatistics, TranslationCache};
use crate::content::{Content, ContentKind, Message, Text};
use crate::error::{I18nError, I18nResult};
use crate::key::{TranslationKey, TranslationKeyProvider};
use crate::locale::{LocaleSource, LocaleSourceProvider};
use crate::store::LocaleTranslations;
use arc_swap::ArcSwap;
use glossa_config::{CacheConfig, GlossaConfig};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Lifecycle of a [`TranslationService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceState {
    /// No default locale is configured.
    Uninitialized,
    /// A default locale is configured but no fallback store is designated.
    Configured,
    /// Lookups can fall back to the default locale's store.
    Ready,
}

/// One published set of stores.
#[derive(Debug, Default)]
pub(crate) struct TranslationState {
    generation: u64,
    default_source: Option<LocaleSource>,
    default_translations: Option<Arc<LocaleTranslations>>,
    translations: HashMap<LocaleSource, Arc<LocaleTranslations>>,
}

impl TranslationState {
    fn store_for(&self, locale: &LocaleSource) -> Option<&Arc<LocaleTranslations>> {
        self.translations.get(locale)
    }

    fn fallback(&self) -> Option<&Arc<LocaleTranslations>> {
        self.default_translations.as_ref()
    }

    fn service_state(&self) -> ServiceState {
        match (&self.default_source, &self.default_translations) {
            (None, _) => ServiceState::Uninitialized,
            (Some(_), None) => ServiceState::Configured,
            (Some(_), Some(_)) => ServiceState::Ready,
        }
    }

    fn with_default(&self, source: Option<LocaleSource>, translations: Option<Arc<LocaleTranslations>>) -> Self {
        Self {
            generation: self.generation,
            default_source: source,
            default_translations: translations,
            translations: self.translations.clone(),
        }
    }
}

/// Thread-safe translation lookup over a set of [`LocaleTranslations`].
pub struct TranslationService {
    state: ArcSwap<TranslationState>,
    write_lock: Mutex<()>,
    cache: TranslationCache,
    cache_config: RwLock<CacheConfig>,
}

impl TranslationService {
    /// Creates a service with a default-sized cache and no locales.
    pub fn new() -> Self {
        Self {
            state: ArcSwap::from_pointee(TranslationState::default()),
            write_lock: Mutex::new(()),
            cache: TranslationCache::default(),
            cache_config: RwLock::new(CacheConfig::default()),
        }
    }

    /// Creates a service whose cache is sized by `config`.
    pub fn with_cache_config(config: CacheConfig) -> I18nResult<Self> {
        let cache = TranslationCache::from_config(&config)?;
        Ok(Self {
            cache,
            cache_config: RwLock::new(config),
            ..Self::new()
        })
    }

    /// Creates a service from a validated library configuration, applying
    /// its cache sizing and default locale.
    pub fn from_config(config: &GlossaConfig) -> I18nResult<Self> {
        config.validate()?;
        let service = Self::with_cache_config(config.cache)?;
        if let Some(locale) = config.default_locale.as_deref() {
            service.update_default_locale_source(locale)?;
        }
        Ok(service)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ServiceState {
        self.state.load().service_state()
    }

    /// Sizing policy the cache was last configured with.
    pub fn cache_config(&self) -> CacheConfig {
        *self.cache_config.read()
    }

    /// Snapshot of the cache counters.
    pub fn cache_statistics(&self) -> CacheStatistics {
        self.cache.statistics()
    }

    /// Re-sizes the cache. Entries are kept unless the new capacity is
    /// smaller, in which case the least recently used ones go.
    #[instrument(skip(self))]
    pub fn reconfigure_cache(&self, config: CacheConfig) -> I18nResult<()> {
        let _guard = self.write_lock.lock();
        let capacity = capacity_for(&config)?;
        self.cache.set_capacity(capacity)?;
        *self.cache_config.write() = config;
        info!(capacity, mode = ?config.mode, "Reconfigured translation cache");
        Ok(())
    }

    /// Sets the default locale.
    ///
    /// A designated fallback store for a different locale stops being the
    /// fallback; it stays loaded and can be designated again through
    /// [`TranslationService::update_default_locale_translations`].
    #[instrument(skip_all)]
    pub fn update_default_locale_source<L>(&self, provider: &L) -> I18nResult<()>
    where
        L: LocaleSourceProvider + ?Sized,
    {
        let source = provider.locale_source()?;
        let _guard = self.write_lock.lock();
        let current = self.state.load_full();

        let translations = current
            .default_translations
            .as_ref()
            .filter(|store| store.locale_source() == &source)
            .cloned();
        self.state
            .store(Arc::new(current.with_default(Some(source.clone()), translations)));
        info!(locale = %source, "Updated default locale");
        Ok(())
    }

    /// Designates the loaded store of the default locale as the fallback.
    #[instrument(skip_all)]
    pub fn update_default_locale_translations(&self) -> I18nResult<()> {
        let _guard = self.write_lock.lock();
        let current = self.state.load_full();

        let source = current.default_source.clone().ok_or_else(|| {
            I18nError::locale_not_supported(
                "no default locale configured; call update_default_locale_source first",
            )
        })?;
        let translations = current.store_for(&source).cloned().ok_or_else(|| {
            I18nError::locale_not_supported(format!(
                "no translations loaded for default locale {source}"
            ))
        })?;

        self.state
            .store(Arc::new(current.with_default(Some(source.clone()), Some(translations))));
        info!(locale = %source, "Updated default locale translations");
        Ok(())
    }

    /// Replaces every loaded store at once and clears the cache.
    ///
    /// When a default locale is configured its store becomes the fallback;
    /// if the new set lacks it, nothing changes and `LocaleNotSupported` is
    /// returned. Later stores for the same locale replace earlier ones.
    #[instrument(skip_all)]
    pub fn update_translations<I, T>(&self, translations: I) -> I18nResult<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<Arc<LocaleTranslations>>,
    {
        let _guard = self.write_lock.lock();
        let current = self.state.load_full();

        let mut loaded = HashMap::new();
        for store in translations {
            let store: Arc<LocaleTranslations> = store.into();
            let source = store.locale_source().clone();
            if loaded.insert(source.clone(), store).is_some() {
                warn!(locale = %source, "Duplicate locale translations, keeping the last one");
            }
        }

        let default_translations = match &current.default_source {
            Some(source) => Some(loaded.get(source).cloned().ok_or_else(|| {
                I18nError::locale_not_supported(format!(
                    "default locale {source} is missing from the provided translations"
                ))
            })?),
            None => None,
        };

        let locales = loaded.len();
        let generation = self.cache.clear();
        self.state.store(Arc::new(TranslationState {
            generation,
            default_source: current.default_source.clone(),
            default_translations,
            translations: loaded,
        }));
        info!(locales, generation, "Updated translations");
        Ok(())
    }

    /// Drops every store, the default locale and the cache contents.
    #[instrument(skip_all)]
    pub fn clear(&self) {
        let _guard = self.write_lock.lock();
        let generation = self.cache.clear();
        self.state.store(Arc::new(TranslationState {
            generation,
            ..TranslationState::default()
        }));
        info!("Cleared translation service");
    }

    /// Text for `key` in `locale` only; `None` if either is missing.
    pub fn find_text_or_null<L, K>(&self, locale: &L, key: &K) -> I18nResult<Option<Text>>
    where
        L: LocaleSourceProvider + ?Sized,
        K: TranslationKeyProvider + ?Sized,
    {
        Ok(self
            .find_or_null(locale, key, ContentKind::Text)?
            .and_then(Content::into_text))
    }

    /// Message for `key` in `locale` only; `None` if either is missing.
    pub fn find_message_or_null<L, K>(&self, locale: &L, key: &K) -> I18nResult<Option<Message>>
    where
        L: LocaleSourceProvider + ?Sized,
        K: TranslationKeyProvider + ?Sized,
    {
        Ok(self
            .find_or_null(locale, key, ContentKind::Message)?
            .and_then(Content::into_message))
    }

    /// Text for `key` in `locale`, falling back to the default locale.
    pub fn find_text_or_default<L, K>(&self, locale: &L, key: &K) -> I18nResult<Text>
    where
        L: LocaleSourceProvider + ?Sized,
        K: TranslationKeyProvider + ?Sized,
    {
        let key = key.translation_key()?;
        let locale = locale.locale_source()?;
        self.find_or_default(&locale, &key, ContentKind::Text)?
            .into_text()
            .ok_or_else(|| not_found(&key, &locale))
    }

    /// Message for `key` in `locale`, falling back to the default locale.
    pub fn find_message_or_default<L, K>(&self, locale: &L, key: &K) -> I18nResult<Message>
    where
        L: LocaleSourceProvider + ?Sized,
        K: TranslationKeyProvider + ?Sized,
    {
        let key = key.translation_key()?;
        let locale = locale.locale_source()?;
        self.find_or_default(&locale, &key, ContentKind::Message)?
            .into_message()
            .ok_or_else(|| not_found(&key, &locale))
    }

    /// The loaded store for `locale`, if any.
    pub fn find_locale_translations_or_null<L>(
        &self,
        locale: &L,
    ) -> I18nResult<Option<Arc<LocaleTranslations>>>
    where
        L: LocaleSourceProvider + ?Sized,
    {
        let locale = locale.locale_source()?;
        Ok(self.state.load().store_for(&locale).cloned())
    }

    /// The loaded store for `locale`, or the fallback store.
    pub fn find_locale_translations_or_default<L>(
        &self,
        locale: &L,
    ) -> I18nResult<Arc<LocaleTranslations>>
    where
        L: LocaleSourceProvider + ?Sized,
    {
        let locale = locale.locale_source()?;
        let state = self.state.load();
        state
            .store_for(&locale)
            .or_else(|| state.fallback())
            .cloned()
            .ok_or_else(|| {
                I18nError::locale_not_supported(format!(
                    "no translations for {locale} and no default locale translations"
                ))
            })
    }

    /// Locales with a loaded store.
    pub fn loaded_locale_sources(&self) -> Vec<LocaleSource> {
        self.state.load().translations.keys().cloned().collect()
    }

    /// Every loaded store.
    pub fn loaded_locale_translations(&self) -> Vec<Arc<LocaleTranslations>> {
        self.state.load().translations.values().cloned().collect()
    }

    /// The configured default locale.
    pub fn default_locale_source(&self) -> Option<LocaleSource> {
        self.state.load().default_source.clone()
    }

    /// The designated fallback store.
    pub fn default_locale_translations(&self) -> Option<Arc<LocaleTranslations>> {
        self.state.load().default_translations.clone()
    }

    /// Number of loaded stores.
    pub fn number_of_locales(&self) -> usize {
        self.state.load().translations.len()
    }

    /// Texts summed over every loaded store.
    pub fn number_of_texts(&self) -> usize {
        self.state
            .load()
            .translations
            .values()
            .map(|store| store.number_of_texts())
            .sum()
    }

    /// Messages summed over every loaded store.
    pub fn number_of_messages(&self) -> usize {
        self.state
            .load()
            .translations
            .values()
            .map(|store| store.number_of_messages())
            .sum()
    }

    fn find_or_null<L, K>(&self, locale: &L, key: &K, kind: ContentKind) -> I18nResult<Option<Content>>
    where
        L: LocaleSourceProvider + ?Sized,
        K: TranslationKeyProvider + ?Sized,
    {
        let key = key.translation_key()?;
        let locale = locale.locale_source()?;
        let state = self.state.load();
        Ok(state
            .store_for(&locale)
            .and_then(|store| self.lookup(&state, store, &key, kind)))
    }

    pub(crate) fn find_or_default(
        &self,
        locale: &LocaleSource,
        key: &TranslationKey,
        kind: ContentKind,
    ) -> I18nResult<Content> {
        let state = self.state.load();
        let requested = state.store_for(locale);

        if let Some(found) = requested.and_then(|store| self.lookup(&state, store, key, kind)) {
            return Ok(found);
        }

        let fallback = match (requested, state.fallback()) {
            (_, Some(fallback)) if fallback.locale_source() != locale => fallback,
            (Some(_), _) | (None, Some(_)) => return Err(not_found(key, locale)),
            (None, None) => {
                return Err(I18nError::locale_not_supported(format!(
                    "no translations for {locale} and no default locale translations"
                )))
            }
        };

        debug!(
            key = %key,
            locale = %locale,
            fallback = %fallback.locale_source(),
            "Falling back to default locale"
        );
        self.lookup(&state, fallback, key, kind)
            .ok_or_else(|| not_found(key, locale))
    }

    /// Cache first, then the store; store hits are cached for this snapshot's
    /// generation only.
    fn lookup(
        &self,
        state: &TranslationState,
        store: &LocaleTranslations,
        key: &TranslationKey,
        kind: ContentKind,
    ) -> Option<Content> {
        let cache_key = CacheKey::new(store.locale_source(), key, kind);
        if let Some(cached) = self.cache.get_if_generation(&cache_key, state.generation) {
            return Some(cached);
        }

        let found = store.find(key, kind)?;
        self.cache
            .put_if_generation(cache_key, found.clone(), state.generation);
        Some(found)
    }
}

fn not_found(key: &TranslationKey, locale: &LocaleSource) -> I18nError {
    I18nError::TranslationKeyNotFound {
        key: key.name().to_owned(),
        locale: locale.localization().to_owned(),
    }
}

impl Default for TranslationService {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TranslationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.load();
        f.debug_struct("TranslationService")
            .field("state", &state.service_state())
            .field("default_locale", &state.default_source)
            .field("locales", &state.translations.len())
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
