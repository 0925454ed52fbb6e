//! Per-locale translation tables.

use crate::content::{Content, ContentKind, Message, Text};
use crate::error::I18nResult;
use crate::key::{TranslationKey, TranslationKeyProvider};
use crate::locale::LocaleSource;
use std::collections::HashMap;
use tracing::debug;

/// Texts and messages of one locale, keyed by [`TranslationKey`].
///
/// A key is expected to appear in at most one of the two tables; loaders are
/// responsible for that and nothing here checks it.
///
/// Mutation needs `&mut self`, so a store handed to a
/// [`TranslationService`](crate::TranslationService) behind an `Arc` is
/// frozen and the service cache can never disagree with it.
#[derive(Debug, Clone)]
pub struct LocaleTranslations {
    source: LocaleSource,
    texts: HashMap<TranslationKey, Text>,
    messages: HashMap<TranslationKey, Message>,
}

impl LocaleTranslations {
    /// Creates an empty store for `source`.
    pub fn new(source: LocaleSource) -> Self {
        Self {
            source,
            texts: HashMap::new(),
            messages: HashMap::new(),
        }
    }

    /// Starts populating a store for `source`.
    pub fn builder(source: LocaleSource) -> LocaleTranslationsBuilder {
        LocaleTranslationsBuilder {
            store: Self::new(source),
        }
    }

    /// Locale these translations belong to.
    pub fn locale_source(&self) -> &LocaleSource {
        &self.source
    }

    /// Text stored under `key`.
    pub fn find_text(&self, key: &TranslationKey) -> Option<Text> {
        self.texts.get(key).cloned()
    }

    /// Message stored under `key`.
    pub fn find_message(&self, key: &TranslationKey) -> Option<Message> {
        self.messages.get(key).cloned()
    }

    /// Looks `key` up in the table selected by `kind`.
    pub fn find(&self, key: &TranslationKey, kind: ContentKind) -> Option<Content> {
        match kind {
            ContentKind::Text => self.find_text(key).map(Content::Text),
            ContentKind::Message => self.find_message(key).map(Content::Message),
        }
    }

    /// Resolves the key first; only that resolution can fail.
    pub fn find_text_or_null<K>(&self, key: &K) -> I18nResult<Option<Text>>
    where
        K: TranslationKeyProvider + ?Sized,
    {
        Ok(self.find_text(&key.translation_key()?))
    }

    /// Resolves the key first; only that resolution can fail.
    pub fn find_message_or_null<K>(&self, key: &K) -> I18nResult<Option<Message>>
    where
        K: TranslationKeyProvider + ?Sized,
    {
        Ok(self.find_message(&key.translation_key()?))
    }

    /// Whether `key` has a text or a message.
    pub fn contains_key(&self, key: &TranslationKey) -> bool {
        self.texts.contains_key(key) || self.messages.contains_key(key)
    }

    /// Number of texts.
    pub fn number_of_texts(&self) -> usize {
        self.texts.len()
    }

    /// Number of messages.
    pub fn number_of_messages(&self) -> usize {
        self.messages.len()
    }

    /// Whether both tables are empty.
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty() && self.messages.is_empty()
    }

    /// Adds or replaces a text.
    pub fn insert_text(&mut self, key: TranslationKey, text: impl Into<Text>) -> Option<Text> {
        self.texts.insert(key, text.into())
    }

    /// Adds or replaces a message.
    pub fn insert_message(&mut self, key: TranslationKey, message: impl Into<Message>) -> Option<Message> {
        self.messages.insert(key, message.into())
    }

    /// Empties both tables and drops the locale's cached descriptor.
    pub fn clear(&mut self) {
        self.texts.clear();
        self.messages.clear();
        self.source.invalidate();
        debug!(locale = %self.source, "Cleared locale translations");
    }
}

/// Collects entries for a [`LocaleTranslations`] before it is shared.
#[derive(Debug)]
pub struct LocaleTranslationsBuilder {
    store: LocaleTranslations,
}

impl LocaleTranslationsBuilder {
    /// Adds a text under `key`, interning string keys in the global registry.
    pub fn text<K>(mut self, key: &K, text: impl Into<Text>) -> I18nResult<Self>
    where
        K: TranslationKeyProvider + ?Sized,
    {
        self.store.insert_text(key.translation_key()?, text);
        Ok(self)
    }

    /// Adds a message under `key`, interning string keys in the global registry.
    pub fn message<K>(mut self, key: &K, message: impl Into<Message>) -> I18nResult<Self>
    where
        K: TranslationKeyProvider + ?Sized,
    {
        self.store.insert_message(key.translation_key()?, message);
        Ok(self)
    }

    /// Finishes the store.
    pub fn build(self) -> LocaleTranslations {
        debug!(
            locale = %self.store.source,
            texts = self.store.number_of_texts(),
            messages = self.store.number_of_messages(),
            "Built locale translations"
        );
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::I18nError;
    use crate::key::KeyRegistry;

    fn polish() -> LocaleSource {
        LocaleSource::new("pl_PL").unwrap()
    }

    #[test]
    fn test_builder_and_lookups() {
        let registry = KeyRegistry::new();
        let title = registry.intern_or_create("title").unwrap();
        let rules = registry.intern_or_create("rules").unwrap();
        let absent = registry.intern_or_create("absent").unwrap();

        let store = LocaleTranslations::builder(polish())
            .text(&title, "Tytuł")
            .unwrap()
            .message(&rules, &["Pierwsza", "Druga"][..])
            .unwrap()
            .build();

        assert_eq!(store.find_text(&title).unwrap().as_str(), "Tytuł");
        assert_eq!(store.find_message(&rules).unwrap().len(), 2);
        assert!(store.find_text(&rules).is_none());
        assert!(store.find_message(&title).is_none());
        assert!(store.find(&absent, ContentKind::Text).is_none());
        assert_eq!(
            store.find(&rules, ContentKind::Message).map(|c| c.kind()),
            Some(ContentKind::Message)
        );

        assert!(store.contains_key(&title));
        assert!(!store.contains_key(&absent));
        assert_eq!(store.number_of_texts(), 1);
        assert_eq!(store.number_of_messages(), 1);
        assert_eq!(store.locale_source(), &polish());
    }

    #[test]
    fn test_provider_lookups() {
        let store = LocaleTranslations::builder(polish())
            .text("store_provider_greeting", "Cześć")
            .unwrap()
            .build();

        let found = store.find_text_or_null("STORE_PROVIDER_GREETING").unwrap();
        assert_eq!(found.map(|t| t.to_string()), Some("Cześć".to_string()));
        assert!(store.find_message_or_null("store_provider_greeting").unwrap().is_none());
        assert!(matches!(
            store.find_text_or_null(" "),
            Err(I18nError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_clear_invalidates_descriptor() {
        let source = polish();
        source.descriptor().unwrap();
        let mut store = LocaleTranslations::builder(source.clone())
            .text("store_clear_key", "x")
            .unwrap()
            .build();

        store.clear();

        assert!(store.is_empty());
        assert!(!source.is_descriptor_cached());
    }

    #[test]
    fn test_clone_is_detached_from_original() {
        let registry = KeyRegistry::new();
        let title = registry.intern_or_create("title").unwrap();
        let original = LocaleTranslations::builder(polish())
            .text(&title, "stary")
            .unwrap()
            .build();

        let mut edited = original.clone();
        edited.insert_text(title.clone(), "nowy");

        assert_eq!(original.find_text(&title).unwrap().as_str(), "stary");
        assert_eq!(edited.find_text(&title).unwrap().as_str(), "nowy");
    }
}
