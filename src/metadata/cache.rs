use super::extractor::MetadataExtractor;
use super::lifecycle::LifecycleMetadata;
use crate::config::MetadataCacheConfig;
use crate::error::{LifemarkError, Result};
use crate::invoke::HandleCache;
use crate::reflect::{ClassDescriptor, Described, TypeLoader};
use moka::sync::Cache;
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Lookup counters. Thread-safe, relaxed ordering.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    extractions: AtomicU64,
    failures: AtomicU64,
}

impl CacheStats {
    #[inline]
    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn record_extraction(&self) {
        self.extractions.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Lookups that did not find a finished entry. Concurrent misses on one
    /// key share a single extraction.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Times the extractor actually ran.
    pub fn extractions(&self) -> u64 {
        self.extractions.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Hit rate in `[0.0, 1.0]`; zero before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

/// Outcome of [`MetadataCache::preload`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreloadReport {
    pub loaded: usize,
    pub failed: usize,
}

/// Concurrent, bounded cache from type name to [`LifecycleMetadata`].
///
/// Concurrent requests for an uncached type block on one extraction and all
/// receive the same `Arc`. Failed extractions are returned to every waiter
/// and are not stored.
pub struct MetadataCache {
    entries: Cache<Arc<str>, Arc<LifecycleMetadata>>,
    loader: Arc<dyn TypeLoader>,
    handles: Arc<HandleCache>,
    stats: CacheStats,
}

impl MetadataCache {
    pub fn new(
        config: &MetadataCacheConfig,
        loader: Arc<dyn TypeLoader>,
        handles: Arc<HandleCache>,
    ) -> Self {
        let mut builder = Cache::builder()
            .initial_capacity(config.initial_capacity)
            .max_capacity(config.max_capacity);
        if let Some(secs) = config.time_to_idle_secs {
            builder = builder.time_to_idle(Duration::from_secs(secs));
        }

        Self {
            entries: builder.build(),
            loader,
            handles,
            stats: CacheStats::default(),
        }
    }

    pub fn get(&self, class: &ClassDescriptor) -> Result<Arc<LifecycleMetadata>> {
        if let Some(metadata) = self.entries.get(class.name()) {
            self.stats.record_hit();
            return Ok(metadata);
        }
        self.stats.record_miss();

        self.entries
            .try_get_with(Arc::from(class.name()), || {
                self.stats.record_extraction();
                MetadataExtractor::new(&*self.loader, &self.handles)
                    .extract(class)
                    .map(Arc::new)
            })
            .map_err(|source| {
                self.stats.record_failure();
                tracing::warn!(class = class.name(), error = %source, "Lifecycle metadata extraction failed");
                LifemarkError::Caching {
                    class: class.name().to_string(),
                    source,
                }
            })
    }

    /// Looks the type up through the loader on a miss.
    pub fn get_by_name(&self, name: &str) -> Result<Arc<LifecycleMetadata>> {
        if let Some(metadata) = self.entries.get(name) {
            self.stats.record_hit();
            return Ok(metadata);
        }
        let class = self.loader.load(name)?;
        self.get(&class)
    }

    pub fn get_described<T: Described>(&self) -> Result<Arc<LifecycleMetadata>> {
        self.get(&T::descriptor())
    }

    /// Extracts every class on `pool`. Failures are counted, not propagated.
    pub fn preload(&self, pool: &rayon::ThreadPool, classes: &[Arc<ClassDescriptor>]) -> PreloadReport {
        let failed = pool.install(|| {
            classes
                .par_iter()
                .filter(|class| self.get(class).is_err())
                .count()
        });
        let report = PreloadReport {
            loaded: classes.len() - failed,
            failed,
        };
        tracing::info!(
            loaded = report.loaded,
            failed = report.failed,
            threads = pool.current_num_threads(),
            "Preloaded lifecycle metadata"
        );
        report
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn invalidate(&self, name: &str) {
        self.entries.invalidate(name);
    }

    pub fn invalidate_all(&self) {
        self.entries.invalidate_all();
    }

    /// Number of cached entries after pending maintenance has run.
    pub fn entry_count(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn handles(&self) -> &Arc<HandleCache> {
        &self.handles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::MarkerKind;
    use crate::metadata::ExtractError;
    use crate::reflect::{MethodDescriptor, TypeRef, TypeRegistry};
    use std::sync::Barrier;

    fn cache_with(loader: Arc<dyn TypeLoader>) -> MetadataCache {
        MetadataCache::new(
            &MetadataCacheConfig::default(),
            loader,
            Arc::new(HandleCache::default()),
        )
    }

    fn service(name: &str) -> Arc<ClassDescriptor> {
        Arc::new(
            ClassDescriptor::builder(name)
                .method(MethodDescriptor::new("start").with_marker(MarkerKind::PostConstruct))
                .build(),
        )
    }

    #[test]
    fn test_second_lookup_is_a_hit() {
        let cache = cache_with(Arc::new(TypeRegistry::new()));
        let class = service("app::Mailer");

        let first = cache.get(&class).unwrap();
        let second = cache.get(&class).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats().hits(), 1);
        assert_eq!(cache.stats().misses(), 1);
        assert_eq!(cache.stats().extractions(), 1);
        assert_eq!(cache.entry_count(), 1);
    }

    #[test]
    fn test_concurrent_misses_extract_once() {
        let cache = cache_with(Arc::new(TypeRegistry::new()));
        let class = service("app::Indexer");
        let barrier = Barrier::new(16);

        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        cache.get(&class).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(results.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(cache.stats().extractions(), 1);
    }

    #[test]
    fn test_failure_is_not_cached() {
        let registry = TypeRegistry::new();
        let derived = Arc::new(
            ClassDescriptor::builder("app::Derived")
                .extends(TypeRef::named("app::Base"))
                .build(),
        );
        registry.register(Arc::clone(&derived));
        registry.register(Arc::new(
            ClassDescriptor::builder("app::Base")
                .extends(TypeRef::named("app::Derived"))
                .build(),
        ));
        let cache = cache_with(Arc::new(registry.clone()));

        let error = cache.get(&derived).unwrap_err();
        match &error {
            LifemarkError::Caching { class, source } => {
                assert_eq!(class, "app::Derived");
                assert!(matches!(**source, ExtractError::CyclicHierarchy { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!cache.contains("app::Derived"));
        assert_eq!(cache.stats().failures(), 1);

        registry.register(service("app::Base"));
        let metadata = cache.get(&derived).unwrap();
        assert_eq!(metadata.methods(MarkerKind::PostConstruct).len(), 1);
        assert_eq!(cache.stats().extractions(), 2);
    }

    #[test]
    fn test_bounded_cache_evicts_and_reextracts() {
        let config = MetadataCacheConfig {
            max_capacity: 8,
            ..MetadataCacheConfig::default()
        };
        let cache = MetadataCache::new(
            &config,
            Arc::new(TypeRegistry::new()),
            Arc::new(HandleCache::default()),
        );
        let classes: Vec<_> = (0..200).map(|i| service(&format!("app::Job{i}"))).collect();

        for class in &classes {
            cache.get(class).unwrap();
        }
        assert!(cache.entry_count() <= 8);
        assert_eq!(cache.stats().extractions(), 200);

        let evicted = classes
            .iter()
            .find(|class| !cache.contains(class.name()))
            .unwrap();
        let metadata = cache.get(evicted).unwrap();
        assert_eq!(metadata.class_name(), evicted.name());
        assert_eq!(cache.stats().extractions(), 201);
    }

    #[test]
    fn test_get_by_name_and_invalidate() {
        let registry = TypeRegistry::new();
        registry.register(service("app::Queue"));
        let cache = cache_with(Arc::new(registry));

        let first = cache.get_by_name("app::Queue").unwrap();
        assert!(cache.contains("app::Queue"));
        assert!(matches!(
            cache.get_by_name("app::Missing"),
            Err(LifemarkError::Reflect(_))
        ));

        cache.invalidate("app::Queue");
        assert!(!cache.contains("app::Queue"));
        let second = cache.get_by_name("app::Queue").unwrap();
        assert!(!Arc::ptr_eq(&first, &second));

        cache.invalidate_all();
        assert_eq!(cache.entry_count(), 0);
    }

    #[test]
    fn test_preload_counts_failures() {
        let cache = cache_with(Arc::new(TypeRegistry::new()));
        let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        let cyclic = Arc::new(
            ClassDescriptor::builder("app::Loop")
                .extends(TypeRef::Linked(|| {
                    Arc::new(
                        ClassDescriptor::builder("app::Loop")
                            .extends(TypeRef::named("app::Loop"))
                            .build(),
                    )
                }))
                .build(),
        );
        let classes = vec![service("app::A"), service("app::B"), cyclic];

        let report = cache.preload(&pool, &classes);

        assert_eq!(report, PreloadReport { loaded: 2, failed: 1 });
        assert!(cache.contains("app::A"));
        assert!(!cache.contains("app::Loop"));
    }
}
