//! Locale descriptors, their parsing cache, and locale handles.
//!
//! Tags such as `en_US`, `pl-PL` or `zh_Hans_CN` are parsed into a
//! [`LocaleDescriptor`]. A [`LocaleSource`] is the handle used everywhere
//! else: it is identified by its normalized tag alone, and computes its
//! descriptor on first access.

use crate::error::{I18nError, I18nResult};
use arc_swap::ArcSwapOption;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::trace;
use unic_langid::LanguageIdentifier;

static GLOBAL_LOCALES: Lazy<LocaleRegistry> = Lazy::new(LocaleRegistry::new);

/// Parsed language, script, region and variant subtags.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocaleDescriptor {
    language: String,
    script: Option<String>,
    region: Option<String>,
    variant: Option<String>,
}

impl LocaleDescriptor {
    /// Lowercase language subtag (`en`).
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Title-cased script subtag (`Hans`), if present.
    pub fn script(&self) -> Option<&str> {
        self.script.as_deref()
    }

    /// Uppercase region subtag (`US`, `419`), if present.
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// Variant, exactly as written in the tag.
    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }

    /// Converts to a BCP 47 identifier.
    ///
    /// Fails when the variant is not a valid BCP 47 variant subtag.
    pub fn to_language_identifier(&self) -> I18nResult<LanguageIdentifier> {
        let mut tag = self.language.clone();
        for subtag in [&self.script, &self.region, &self.variant].into_iter().flatten() {
            tag.push('-');
            tag.push_str(subtag);
        }
        tag.parse()
            .map_err(|_| I18nError::invalid_argument(format!("'{tag}' is not a valid BCP 47 identifier")))
    }
}

impl fmt::Display for LocaleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.language)?;
        for subtag in [&self.script, &self.region, &self.variant].into_iter().flatten() {
            write!(f, "_{subtag}")?;
        }
        Ok(())
    }
}

fn is_separator(c: char) -> bool {
    c == '_' || c == '-'
}

fn is_language(subtag: &str) -> bool {
    let len = subtag.len();
    ((2..=3).contains(&len) && subtag.bytes().all(|b| b.is_ascii_alphabetic()))
        || (len == 3 && subtag.bytes().all(|b| b.is_ascii_digit()))
}

fn is_script(subtag: &str) -> bool {
    subtag.len() == 4 && subtag.bytes().all(|b| b.is_ascii_alphabetic())
}

fn is_region(subtag: &str) -> bool {
    (subtag.len() == 2 && subtag.bytes().all(|b| b.is_ascii_alphabetic()))
        || (subtag.len() == 3 && subtag.bytes().all(|b| b.is_ascii_digit()))
}

fn parse_region(subtag: &str, tag: &str) -> I18nResult<String> {
    if is_region(subtag) {
        Ok(subtag.to_ascii_uppercase())
    } else {
        Err(I18nError::invalid_argument(format!(
            "malformed region '{subtag}' in locale tag '{tag}'"
        )))
    }
}

fn parse_variant(subtag: Option<&str>, tag: &str) -> I18nResult<Option<String>> {
    match subtag {
        Some("") => Err(I18nError::invalid_argument(format!(
            "empty variant in locale tag '{tag}'"
        ))),
        other => Ok(other.map(str::to_owned)),
    }
}

fn title_case(subtag: &str) -> String {
    let lower = subtag.to_ascii_lowercase();
    let mut chars = lower.chars();
    chars
        .next()
        .map(|first| first.to_ascii_uppercase().to_string() + chars.as_str())
        .unwrap_or_default()
}

/// Parses a locale tag without consulting any cache.
///
/// At most three components are split off: language, then either a region
/// or a four letter script (in which case the region follows), then the
/// variant, taken verbatim.
pub fn parse_locale_tag(tag: &str) -> I18nResult<LocaleDescriptor> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        return Err(I18nError::invalid_argument("locale tag must not be empty"));
    }

    let mut parts = trimmed.splitn(3, is_separator);
    let language = parts.next().unwrap_or_default();
    if !is_language(language) {
        return Err(I18nError::invalid_argument(format!(
            "malformed language '{language}' in locale tag '{trimmed}'"
        )));
    }

    let mut descriptor = LocaleDescriptor {
        language: language.to_ascii_lowercase(),
        script: None,
        region: None,
        variant: None,
    };

    let Some(second) = parts.next() else {
        return Ok(descriptor);
    };
    let rest = parts.next();

    if is_script(second) {
        descriptor.script = Some(title_case(second));
        if let Some(rest) = rest {
            let mut tail = rest.splitn(2, is_separator);
            descriptor.region = Some(parse_region(tail.next().unwrap_or_default(), trimmed)?);
            descriptor.variant = parse_variant(tail.next(), trimmed)?;
        }
    } else {
        descriptor.region = Some(parse_region(second, trimmed)?);
        descriptor.variant = parse_variant(rest, trimmed)?;
    }

    Ok(descriptor)
}

/// Cache of parsed locale descriptors keyed by the lowercased tag.
#[derive(Debug, Default)]
pub struct LocaleRegistry {
    descriptors: DashMap<String, Arc<LocaleDescriptor>>,
}

impl LocaleRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used by [`LocaleSource`].
    pub fn global() -> &'static Self {
        &GLOBAL_LOCALES
    }

    /// Parses `tag`, serving repeated tags from the cache.
    ///
    /// Failed parses are not cached. Two threads parsing the same new tag may
    /// both do the work; the first insertion wins and both get it back.
    ///
    /// Entries are keyed by the trimmed, lowercased tag while variants are
    /// kept verbatim, so tags differing only in variant case share the
    /// descriptor of whichever was parsed first: after `en_US_posix`, a
    /// later `en_US_POSIX` yields the `posix` variant.
    pub fn parse(&self, tag: &str) -> I18nResult<Arc<LocaleDescriptor>> {
        let cache_key = tag.trim().to_lowercase();
        if let Some(hit) = self.descriptors.get(&cache_key) {
            return Ok(Arc::clone(&hit));
        }

        let parsed = Arc::new(parse_locale_tag(tag)?);
        trace!(tag = %cache_key, locale = %parsed, "Parsed locale tag");
        Ok(Arc::clone(&self.descriptors.entry(cache_key).or_insert(parsed)))
    }

    /// Number of cached descriptors.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Drops every cached descriptor.
    pub fn clear(&self) {
        self.descriptors.clear();
    }
}

struct LocaleSourceInner {
    localization: Arc<str>,
    descriptor: ArcSwapOption<LocaleDescriptor>,
}

/// Handle identifying a locale by its normalized tag.
///
/// Clones share one descriptor slot, so [`LocaleSource::invalidate`] is
/// observed by every holder.
#[derive(Clone)]
pub struct LocaleSource {
    inner: Arc<LocaleSourceInner>,
}

impl LocaleSource {
    /// Creates a handle for `tag`.
    ///
    /// Well-formed tags are normalized (`EN-us` becomes `en_US`); anything
    /// else is kept as written with `-` turned into `_`, and fails later in
    /// [`LocaleSource::descriptor`]. Only an empty tag is rejected here.
    pub fn new(tag: &str) -> I18nResult<Self> {
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            return Err(I18nError::invalid_argument("locale tag must not be empty"));
        }

        let localization = match LocaleRegistry::global().parse(trimmed) {
            Ok(descriptor) => descriptor.to_string(),
            Err(_) => trimmed.replace('-', "_"),
        };
        Ok(Self::with_slot(localization, None))
    }

    /// Creates a handle from an already parsed descriptor.
    pub fn from_descriptor(descriptor: LocaleDescriptor) -> Self {
        let localization = descriptor.to_string();
        Self::with_slot(localization, Some(Arc::new(descriptor)))
    }

    fn with_slot(localization: String, descriptor: Option<Arc<LocaleDescriptor>>) -> Self {
        Self {
            inner: Arc::new(LocaleSourceInner {
                localization: Arc::from(localization),
                descriptor: ArcSwapOption::new(descriptor),
            }),
        }
    }

    /// Normalized tag, e.g. `en_US`.
    pub fn localization(&self) -> &str {
        &self.inner.localization
    }

    pub(crate) fn localization_handle(&self) -> Arc<str> {
        Arc::clone(&self.inner.localization)
    }

    /// Parsed form, computed on first access and cached until invalidated.
    pub fn descriptor(&self) -> I18nResult<Arc<LocaleDescriptor>> {
        if let Some(cached) = self.inner.descriptor.load_full() {
            return Ok(cached);
        }
        let parsed = LocaleRegistry::global().parse(&self.inner.localization)?;
        self.inner.descriptor.store(Some(Arc::clone(&parsed)));
        Ok(parsed)
    }

    /// Whether the descriptor is currently cached.
    pub fn is_descriptor_cached(&self) -> bool {
        self.inner.descriptor.load().is_some()
    }

    /// Drops the cached descriptor; the next access recomputes it.
    pub fn invalidate(&self) {
        self.inner.descriptor.store(None);
    }
}

impl PartialEq for LocaleSource {
    fn eq(&self, other: &Self) -> bool {
        self.inner.localization == other.inner.localization
    }
}

impl Eq for LocaleSource {}

impl Hash for LocaleSource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.localization.hash(state);
    }
}

impl fmt::Debug for LocaleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LocaleSource").field(&self.localization()).finish()
    }
}

impl fmt::Display for LocaleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.localization())
    }
}

impl From<LocaleDescriptor> for LocaleSource {
    fn from(descriptor: LocaleDescriptor) -> Self {
        Self::from_descriptor(descriptor)
    }
}

/// Anything able to yield a [`LocaleSource`] on demand.
pub trait LocaleSourceProvider {
    /// Resolves the locale.
    fn locale_source(&self) -> I18nResult<LocaleSource>;
}

impl LocaleSourceProvider for LocaleSource {
    fn locale_source(&self) -> I18nResult<LocaleSource> {
        Ok(self.clone())
    }
}

impl LocaleSourceProvider for LocaleDescriptor {
    fn locale_source(&self) -> I18nResult<LocaleSource> {
        Ok(LocaleSource::from_descriptor(self.clone()))
    }
}

impl LocaleSourceProvider for str {
    fn locale_source(&self) -> I18nResult<LocaleSource> {
        LocaleSource::new(self)
    }
}

impl LocaleSourceProvider for String {
    fn locale_source(&self) -> I18nResult<LocaleSource> {
        LocaleSource::new(self)
    }
}

impl<F> LocaleSourceProvider for F
where
    F: Fn() -> I18nResult<LocaleSource>,
{
    fn locale_source(&self) -> I18nResult<LocaleSource> {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn test_parse_language_and_region() {
        let descriptor = parse_locale_tag("pl-pl").unwrap();
        assert_eq!(descriptor.language(), "pl");
        assert_eq!(descriptor.region(), Some("PL"));
        assert_eq!(descriptor.script(), None);
        assert_eq!(descriptor.variant(), None);
        assert_eq!(descriptor.to_string(), "pl_PL");
    }

    #[test]
    fn test_parse_script_region_and_variant() {
        let chinese = parse_locale_tag("zh_hans_cn").unwrap();
        assert_eq!(chinese.script(), Some("Hans"));
        assert_eq!(chinese.region(), Some("CN"));
        assert_eq!(chinese.to_string(), "zh_Hans_CN");

        let posix = parse_locale_tag("en_US_POSIX").unwrap();
        assert_eq!(posix.region(), Some("US"));
        assert_eq!(posix.variant(), Some("POSIX"));

        let numeric = parse_locale_tag("es-419").unwrap();
        assert_eq!(numeric.region(), Some("419"));

        let language_only = parse_locale_tag(" FIL ").unwrap();
        assert_eq!(language_only.to_string(), "fil");
    }

    #[test]
    fn test_variant_kept_verbatim() {
        let descriptor = parse_locale_tag("de_DE_1901-x").unwrap();
        assert_eq!(descriptor.variant(), Some("1901-x"));
    }

    #[test]
    fn test_registry_variant_case_follows_first_parse() {
        let registry = LocaleRegistry::new();
        let lower = registry.parse("en_US_posix").unwrap();
        let upper = registry.parse("en_US_POSIX").unwrap();

        assert!(Arc::ptr_eq(&lower, &upper));
        assert_eq!(upper.variant(), Some("posix"));
        assert_eq!(parse_locale_tag("en_US_POSIX").unwrap().variant(), Some("POSIX"));
    }

    #[test]
    fn test_parse_errors() {
        for tag in ["", "   ", "e_US", "english_US", "en_USA", "en__", "en_US_", "1a_US"] {
            assert!(
                matches!(parse_locale_tag(tag), Err(I18nError::InvalidArgument(_))),
                "{tag:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_registry_does_not_cache_failures() {
        let registry = LocaleRegistry::new();
        assert!(registry.parse("x_US").is_err());
        assert!(registry.is_empty());

        let first = registry.parse("en_US").unwrap();
        let second = registry.parse("EN_us").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);

        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_concurrent_parse_yields_equivalent_descriptors() {
        let registry = Arc::new(LocaleRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.parse("pt_BR").unwrap())
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.iter().all(|d| d.as_ref() == results[0].as_ref()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_locale_source_equality_ignores_case_and_origin() {
        let lower = LocaleSource::new("en_US").unwrap();
        let upper = LocaleSource::new("EN_US").unwrap();
        let dashed = LocaleSource::new("en-us").unwrap();
        let parsed = LocaleSource::from_descriptor(parse_locale_tag("en_US").unwrap());

        assert_eq!(lower, upper);
        assert_eq!(lower, dashed);
        assert_eq!(lower, parsed);

        let set: HashSet<LocaleSource> = [lower, upper, dashed, parsed].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_equality_independent_of_descriptor_cache() {
        let computed = LocaleSource::new("fr_FR").unwrap();
        let fresh = LocaleSource::new("fr_FR").unwrap();
        computed.descriptor().unwrap();

        assert!(computed.is_descriptor_cached());
        assert!(!fresh.is_descriptor_cached());
        assert_eq!(computed, fresh);
    }

    #[test]
    fn test_descriptor_cached_and_invalidated_across_clones() {
        let source = LocaleSource::new("it_IT").unwrap();
        let clone = source.clone();
        assert!(!source.is_descriptor_cached());

        let descriptor = source.descriptor().unwrap();
        assert_eq!(descriptor.language(), "it");
        assert!(clone.is_descriptor_cached());

        clone.invalidate();
        assert!(!source.is_descriptor_cached());
        assert_eq!(source.descriptor().unwrap().region(), Some("IT"));
    }

    #[test]
    fn test_malformed_source_fails_lazily() {
        assert!(LocaleSource::new("  ").is_err());

        let source = LocaleSource::new("klingon-Qo").unwrap();
        assert_eq!(source.localization(), "klingon_Qo");
        assert!(source.descriptor().is_err());
        assert!(!source.is_descriptor_cached());
    }

    #[test]
    fn test_language_identifier_conversion() {
        let identifier = parse_locale_tag("zh_Hans_CN")
            .unwrap()
            .to_language_identifier()
            .unwrap();
        assert_eq!(identifier.to_string(), "zh-Hans-CN");

        let invalid_variant = parse_locale_tag("en_US_x").unwrap();
        assert!(invalid_variant.to_language_identifier().is_err());
    }

    #[test]
    fn test_providers() {
        let expected = LocaleSource::new("pl_PL").unwrap();
        assert_eq!("pl-PL".locale_source().unwrap(), expected);
        assert_eq!(String::from("PL_pl").locale_source().unwrap(), expected);
        assert_eq!((|| LocaleSource::new("pl_PL")).locale_source().unwrap(), expected);
        assert_eq!(
            parse_locale_tag("pl_PL").unwrap().locale_source().unwrap(),
            expected
        );
    }
}
