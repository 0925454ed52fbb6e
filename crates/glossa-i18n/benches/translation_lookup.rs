//! Benchmarks for translation lookups.
//!
//! Measures:
//! - Cached and uncached text resolution through the service
//! - Default-locale fallback
//! - Placeholder replacement on resolved content

use criterion::{criterion_group, criterion_main, Criterion};
use glossa_i18n::{
    CacheConfig, KeyRegistry, LocaleSource, LocaleTranslations, Replacer, TranslationKey,
    TranslationService,
};
use std::hint::black_box;

const KEY_COUNT: usize = 512;

fn loaded_service(keys: &[TranslationKey], cache_size: usize) -> TranslationService {
    let service = TranslationService::with_cache_config(CacheConfig::manual(cache_size)).unwrap();
    service.update_default_locale_source("en_US").unwrap();

    let mut english = LocaleTranslations::new(LocaleSource::new("en_US").unwrap());
    let mut polish = LocaleTranslations::new(LocaleSource::new("pl_PL").unwrap());
    for (i, key) in keys.iter().enumerate() {
        english.insert_text(key.clone(), format!("Entry {i} for {{user}}"));
        if i % 2 == 0 {
            polish.insert_text(key.clone(), format!("Wpis {i} dla {{user}}"));
        }
    }
    service.update_translations([english, polish]).unwrap();
    service
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("translation_lookup");

    let registry = KeyRegistry::new();
    let keys: Vec<_> = (0..KEY_COUNT)
        .map(|i| registry.intern_or_create(&format!("bench_{i}")).unwrap())
        .collect();

    let cached = loaded_service(&keys, KEY_COUNT * 2);
    group.bench_function("cached_text", |b| {
        let mut i = 0;
        b.iter(|| {
            i = (i + 2) % KEY_COUNT;
            black_box(cached.find_text_or_default("pl_PL", &keys[i]).unwrap());
        });
    });

    group.bench_function("fallback_text", |b| {
        let mut i = 1;
        b.iter(|| {
            i = (i + 2) % KEY_COUNT;
            black_box(cached.find_text_or_default("pl_PL", &keys[i]).unwrap());
        });
    });

    let thrashing = loaded_service(&keys, 16);
    group.bench_function("evicting_text", |b| {
        let mut i = 0;
        b.iter(|| {
            i = (i + 1) % KEY_COUNT;
            black_box(thrashing.find_text_or_default("en_US", &keys[i]).unwrap());
        });
    });

    group.finish();
}

fn bench_replacement(c: &mut Criterion) {
    let mut group = c.benchmark_group("translation_replacement");

    let registry = KeyRegistry::new();
    let keys = vec![registry.intern_or_create("bench_replace").unwrap()];
    let service = loaded_service(&keys, 8);
    let replacer = Replacer::new().set("user", "Ada").set("count", 3);

    group.bench_function("resolve_and_replace", |b| {
        b.iter(|| {
            let text = service.find_text_or_default("pl_PL", &keys[0]).unwrap();
            black_box(text.replace_all(&replacer));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_lookup, bench_replacement);
criterion_main!(benches);
