//! Translation keys and the registry that interns them.
//!
//! A [`TranslationKey`] is a flyweight handle: every string that normalizes to
//! the same value (trimmed, uppercased) maps to one key with one ordinal.
//! Ordinals come from a single process-wide counter shared by every
//! [`KeyRegistry`], so keys from different registries never compare equal.
//! They are never reused, even after [`KeyRegistry::clear`].

use crate::error::{I18nError, I18nResult};
use dashmap::DashMap;
use once_cell::sync::{Lazy, OnceCell};
use std::cmp::Ordering as CmpOrdering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::trace;

static GLOBAL_KEYS: Lazy<KeyRegistry> = Lazy::new(KeyRegistry::new);
static NEXT_ORDINAL: AtomicU32 = AtomicU32::new(0);

/// Interned identifier of one translatable unit.
///
/// Equality, ordering and hashing consider the ordinal only.
#[derive(Clone)]
pub struct TranslationKey {
    ordinal: u32,
    name: Arc<str>,
}

impl TranslationKey {
    /// Process-wide ordinal assigned at interning time.
    pub const fn ordinal(&self) -> u32 {
        self.ordinal
    }

    /// Normalized (trimmed, uppercase) name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for TranslationKey {
    fn eq(&self, other: &Self) -> bool {
        self.ordinal == other.ordinal
    }
}

impl Eq for TranslationKey {}

impl Hash for TranslationKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ordinal.hash(state);
    }
}

impl PartialOrd for TranslationKey {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for TranslationKey {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.ordinal.cmp(&other.ordinal)
    }
}

impl fmt::Debug for TranslationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TranslationKey({}#{})", self.name, self.ordinal)
    }
}

impl fmt::Display for TranslationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Normalizes key content: trims and uppercases with Unicode default casing.
pub fn normalize_key(content: &str) -> I18nResult<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(I18nError::invalid_argument(
            "translation key content must not be empty",
        ));
    }
    Ok(trimmed.to_uppercase())
}

/// Maps normalized key strings to their canonical [`TranslationKey`].
///
/// Interning the same name in two registries yields two distinct keys.
#[derive(Debug, Default)]
pub struct KeyRegistry {
    keys: DashMap<String, TranslationKey>,
}

impl KeyRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used by string-based providers.
    pub fn global() -> &'static Self {
        &GLOBAL_KEYS
    }

    /// Returns the key for `content`, creating it if needed.
    ///
    /// Concurrent calls for the same normalized content all receive the same
    /// key; the shard lock held by the map entry is the only decision point.
    pub fn intern_or_create(&self, content: &str) -> I18nResult<TranslationKey> {
        let normalized = normalize_key(content)?;
        if let Some(existing) = self.keys.get(&normalized) {
            return Ok(existing.clone());
        }

        let name: Arc<str> = Arc::from(normalized.as_str());
        let key = self
            .keys
            .entry(normalized)
            .or_insert_with(|| {
                let ordinal = NEXT_ORDINAL.fetch_add(1, Ordering::Relaxed);
                trace!(key = %name, ordinal, "Interned translation key");
                TranslationKey { ordinal, name }
            })
            .clone();
        Ok(key)
    }

    /// Returns the existing key for `content` without creating one.
    pub fn intern_or_fail(&self, content: &str) -> I18nResult<TranslationKey> {
        let normalized = normalize_key(content)?;
        self.keys
            .get(&normalized)
            .map(|key| key.clone())
            .ok_or(I18nError::KeyNotFound { key: normalized })
    }

    /// Looks up `content` without creating it; `None` for empty content too.
    pub fn find(&self, content: &str) -> Option<TranslationKey> {
        let normalized = normalize_key(content).ok()?;
        self.keys.get(&normalized).map(|key| key.clone())
    }

    /// Whether `key` is the canonical key registered under its name.
    pub fn exists(&self, key: &TranslationKey) -> bool {
        self.keys
            .get(key.name())
            .is_some_and(|registered| registered.ordinal == key.ordinal)
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether no keys are registered.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Forgets every registered name. Ordinals keep counting from where they
    /// were, so keys handed out earlier never compare equal to new ones.
    pub fn clear(&self) {
        self.keys.clear();
    }
}

/// Anything able to yield a [`TranslationKey`] on demand.
pub trait TranslationKeyProvider {
    /// Resolves the key.
    fn translation_key(&self) -> I18nResult<TranslationKey>;
}

impl TranslationKeyProvider for TranslationKey {
    fn translation_key(&self) -> I18nResult<TranslationKey> {
        Ok(self.clone())
    }
}

impl TranslationKeyProvider for str {
    fn translation_key(&self) -> I18nResult<TranslationKey> {
        KeyRegistry::global().intern_or_create(self)
    }
}

impl TranslationKeyProvider for String {
    fn translation_key(&self) -> I18nResult<TranslationKey> {
        self.as_str().translation_key()
    }
}

impl<F> TranslationKeyProvider for F
where
    F: Fn() -> I18nResult<TranslationKey>,
{
    fn translation_key(&self) -> I18nResult<TranslationKey> {
        self()
    }
}

/// A key declaration usable in `static` items.
///
/// The name is interned in the global registry on first use and the handle
/// is cached afterwards.
///
/// ```
/// use glossa_i18n::{LazyKey, TranslationKeyProvider};
///
/// static GREETING: LazyKey = LazyKey::new("greeting");
///
/// let key = GREETING.translation_key().unwrap();
/// assert_eq!(key.name(), "GREETING");
/// ```
#[derive(Debug)]
pub struct LazyKey {
    name: &'static str,
    cell: OnceCell<TranslationKey>,
}

impl LazyKey {
    /// Declares a key named `name`.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            cell: OnceCell::new(),
        }
    }

    /// The declared, not yet normalized, name.
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl TranslationKeyProvider for LazyKey {
    fn translation_key(&self) -> I18nResult<TranslationKey> {
        self.cell
            .get_or_try_init(|| KeyRegistry::global().intern_or_create(self.name))
            .cloned()
    }
}
