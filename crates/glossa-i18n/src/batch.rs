//! Resolving one key for many receivers at once.
//!
//! Receivers are anything with a locale. A batch keeps each distinct locale
//! once, in first-seen order, and resolves a key a single time per locale.

use crate::content::{Content, ContentKind, Message, Replacer, Text};
use crate::error::{I18nError, I18nResult};
use crate::key::TranslationKeyProvider;
use crate::locale::{LocaleSource, LocaleSourceProvider};
use crate::service::TranslationService;
use std::collections::{HashMap, HashSet};
use tracing::trace;

/// Distinct receiver locales bound to a [`TranslationService`].
#[derive(Debug, Clone)]
pub struct TranslationBatch<'a> {
    service: &'a TranslationService,
    locales: Vec<LocaleSource>,
}

impl TranslationService {
    /// Groups `receivers` by locale for batched lookups.
    ///
    /// Fails with `InvalidArgument` when there are no receivers, or with the
    /// first error raised while resolving a receiver's locale.
    pub fn batch<I>(&self, receivers: I) -> I18nResult<TranslationBatch<'_>>
    where
        I: IntoIterator,
        I::Item: LocaleSourceProvider,
    {
        let mut seen = HashSet::new();
        let mut locales = Vec::new();
        let mut receivers_count = 0_usize;
        for receiver in receivers {
            receivers_count += 1;
            let locale = receiver.locale_source()?;
            if seen.insert(locale.clone()) {
                locales.push(locale);
            }
        }

        if locales.is_empty() {
            return Err(I18nError::invalid_argument(
                "a translation batch needs at least one receiver",
            ));
        }
        trace!(receivers = receivers_count, locales = locales.len(), "Created translation batch");
        Ok(TranslationBatch {
            service: self,
            locales,
        })
    }
}

impl TranslationBatch<'_> {
    /// Distinct locales in first-seen order.
    pub fn locales(&self) -> &[LocaleSource] {
        &self.locales
    }

    /// Text for `key` in every locale, with default-locale fallback.
    pub fn texts<K>(&self, key: &K) -> I18nResult<HashMap<LocaleSource, Text>>
    where
        K: TranslationKeyProvider + ?Sized,
    {
        self.resolve(key, ContentKind::Text, |content| content.into_text())
    }

    /// Like [`TranslationBatch::texts`], with `replacer` applied to each text.
    pub fn texts_with<K>(&self, key: &K, replacer: &Replacer) -> I18nResult<HashMap<LocaleSource, Text>>
    where
        K: TranslationKeyProvider + ?Sized,
    {
        self.resolve(key, ContentKind::Text, |content| {
            content.into_text().map(|text| text.replace_all(replacer))
        })
    }

    /// Message for `key` in every locale, with default-locale fallback.
    pub fn messages<K>(&self, key: &K) -> I18nResult<HashMap<LocaleSource, Message>>
    where
        K: TranslationKeyProvider + ?Sized,
    {
        self.resolve(key, ContentKind::Message, |content| content.into_message())
    }

    /// Like [`TranslationBatch::messages`], with `replacer` applied to each
    /// message.
    pub fn messages_with<K>(
        &self,
        key: &K,
        replacer: &Replacer,
    ) -> I18nResult<HashMap<LocaleSource, Message>>
    where
        K: TranslationKeyProvider + ?Sized,
    {
        self.resolve(key, ContentKind::Message, |content| {
            content.into_message().map(|message| message.replace_all(replacer))
        })
    }

    fn resolve<K, T>(
        &self,
        key: &K,
        kind: ContentKind,
        convert: impl Fn(Content) -> Option<T>,
    ) -> I18nResult<HashMap<LocaleSource, T>>
    where
        K: TranslationKeyProvider + ?Sized,
    {
        let key = key.translation_key()?;
        self.locales
            .iter()
            .map(|locale| {
                let content = self.service.find_or_default(locale, &key, kind)?;
                let value = convert(content).ok_or_else(|| I18nError::TranslationKeyNotFound {
                    key: key.name().to_owned(),
                    locale: locale.localization().to_owned(),
                })?;
                Ok((locale.clone(), value))
            })
            .collect()
    }
}
