//! Concurrent access to the registries and the translation service.

use glossa_i18n::{
    KeyRegistry, LocaleRegistry, LocaleSource, LocaleTranslations, TranslationKey,
    TranslationService,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

const LOCALES: [&str; 3] = ["en_US", "pl_PL", "de_DE"];

fn stores(keys: &[TranslationKey], tag: &str) -> Vec<LocaleTranslations> {
    LOCALES
        .iter()
        .map(|locale| {
            let mut store = LocaleTranslations::new(LocaleSource::new(locale).unwrap());
            for key in keys {
                store.insert_text(key.clone(), format!("{tag}:{locale}:{}", key.name()));
            }
            store
        })
        .collect()
}

fn tag_of(text: &str) -> &str {
    text.split(':').next().unwrap_or_default()
}

#[test]
fn test_readers_see_whole_snapshots_during_swaps() {
    let registry = KeyRegistry::new();
    let keys: Vec<_> = (0..16)
        .map(|i| registry.intern_or_create(&format!("swap_{i}")).unwrap())
        .collect();

    let service = Arc::new(TranslationService::new());
    service.update_default_locale_source("en_US").unwrap();
    service.update_translations(stores(&keys, "initial")).unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let readers: Vec<_> = (0..4)
        .map(|r| {
            let service = Arc::clone(&service);
            let keys = keys.clone();
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut reads = 0_u64;
                while !done.load(Ordering::Acquire) {
                    let locale = LOCALES[(r + reads as usize) % LOCALES.len()];
                    let key = &keys[reads as usize % keys.len()];
                    let text = service.find_text_or_default(locale, key).unwrap();
                    let expected_suffix = format!(":{locale}:{}", key.name());
                    assert!(text.as_str().ends_with(&expected_suffix), "{text}");

                    let loaded = service.loaded_locale_translations();
                    assert_eq!(loaded.len(), LOCALES.len());
                    let tags: HashSet<String> = loaded
                        .iter()
                        .flat_map(|store| {
                            keys.iter().map(|key| {
                                let text = store.find_text(key).unwrap();
                                tag_of(text.as_str()).to_owned()
                            })
                        })
                        .collect();
                    assert_eq!(tags.len(), 1, "mixed generations {tags:?}");
                    reads += 1;
                }
                reads
            })
        })
        .collect();

    for round in 0..50 {
        service
            .update_translations(stores(&keys, &format!("round{round}")))
            .unwrap();
    }
    service.update_translations(stores(&keys, "final")).unwrap();
    done.store(true, Ordering::Release);

    let total: u64 = readers.into_iter().map(|h| h.join().unwrap()).sum();
    assert!(total > 0);

    for locale in LOCALES {
        for key in &keys {
            let text = service.find_text_or_default(locale, key).unwrap();
            assert_eq!(tag_of(text.as_str()), "final", "stale content {text}");
        }
    }
}

#[test]
fn test_key_interning_is_unique_under_contention() {
    let registry = Arc::new(KeyRegistry::new());
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                (0..500)
                    .map(|i| {
                        let name = if (t + i) % 3 == 0 {
                            format!("shared_{}", i % 50)
                        } else {
                            format!("SHARED_{} ", i % 50)
                        };
                        registry.intern_or_create(&name).unwrap()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let keys: Vec<TranslationKey> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();

    let ordinals: HashSet<u32> = keys.iter().map(TranslationKey::ordinal).collect();
    assert_eq!(ordinals.len(), 50);
    assert_eq!(registry.len(), 50);
    for key in &keys {
        assert_eq!(registry.intern_or_fail(key.name()).unwrap(), *key);
    }
}

#[test]
fn test_locale_parsing_under_contention() {
    let registry = Arc::new(LocaleRegistry::new());
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let tag = if t % 2 == 0 { "zh_Hans_CN" } else { "ZH_HANS_CN" };
                registry.parse(tag).unwrap()
            })
        })
        .collect();

    let descriptors: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(descriptors.iter().all(|d| d.to_string() == "zh_Hans_CN"));
    assert_eq!(registry.len(), 1);
}
