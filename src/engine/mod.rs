//! Engine facade
//!
//! Wires the loader, both caches and the invoker together. Orchestrators
//! (a DI container, a bootstrap sequence) hold one engine per process and
//! ask it for metadata and hook invocation.

mod builder;

pub use builder::EngineBuilder;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::invoke::{HandleCache, Invoker};
use crate::marker::MarkerKind;
use crate::metadata::{LifecycleMetadata, MetadataCache, PreloadReport};
use crate::reflect::{ClassDescriptor, Described, TypeLoader};
use rayon::ThreadPool;
use std::sync::{Arc, OnceLock};

pub struct LifecycleEngine {
    config: EngineConfig,
    loader: Arc<dyn TypeLoader>,
    handles: Arc<HandleCache>,
    metadata: MetadataCache,
    invoker: Invoker,
    pool: OnceLock<ThreadPool>,
}

impl LifecycleEngine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Engine with default configuration over `loader`.
    pub fn new(loader: impl TypeLoader + 'static) -> Result<Self> {
        EngineBuilder::new().loader(loader).build()
    }

    pub fn from_config(config: EngineConfig, loader: impl TypeLoader + 'static) -> Result<Self> {
        EngineBuilder::new().config(config).loader(loader).build()
    }

    pub fn metadata(&self, class: &ClassDescriptor) -> Result<Arc<LifecycleMetadata>> {
        self.metadata.get(class)
    }

    pub fn metadata_by_name(&self, name: &str) -> Result<Arc<LifecycleMetadata>> {
        self.metadata.get_by_name(name)
    }

    pub fn metadata_for<T: Described>(&self) -> Result<Arc<LifecycleMetadata>> {
        self.metadata.get_described::<T>()
    }

    /// Run every `kind` hook of `target`, most-derived first.
    ///
    /// Returns the number of hooks run.
    pub fn run_hooks<T: Described>(&self, target: &mut T, kind: MarkerKind) -> Result<usize> {
        let metadata = self.metadata_for::<T>()?;
        Ok(self.invoker.invoke_all(&metadata, kind, target)?)
    }

    /// Extract metadata for `classes` in parallel ahead of first use.
    pub fn preload(&self, classes: &[Arc<ClassDescriptor>]) -> Result<PreloadReport> {
        Ok(self.metadata.preload(self.pool()?, classes))
    }

    fn pool(&self) -> Result<&ThreadPool> {
        if let Some(pool) = self.pool.get() {
            return Ok(pool);
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.preload_threads)
            .thread_name(|i| format!("lifemark-preload-{i}"))
            .build()?;
        // A concurrent first preload may have won; its pool is kept.
        Ok(self.pool.get_or_init(|| pool))
    }

    pub fn invoker(&self) -> &Invoker {
        &self.invoker
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.metadata
    }

    pub fn handles(&self) -> &Arc<HandleCache> {
        &self.handles
    }

    pub fn loader(&self) -> &Arc<dyn TypeLoader> {
        &self.loader
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LifemarkError;
    use crate::invoke::BindPolicy;
    use crate::reflect::{MethodDescriptor, TypeRef, TypeRegistry};

    fn registry() -> TypeRegistry {
        let registry = TypeRegistry::new();
        registry.register(Arc::new(
            ClassDescriptor::builder("app::Base")
                .method(MethodDescriptor::new("init").with_marker(MarkerKind::PostConstruct))
                .build(),
        ));
        registry.register(Arc::new(
            ClassDescriptor::builder("app::Derived")
                .extends(TypeRef::named("app::Base"))
                .build(),
        ));
        registry
    }

    #[test]
    fn test_engine_resolves_by_name() {
        let engine = LifecycleEngine::new(registry()).unwrap();
        let meta = engine.metadata_by_name("app::Derived").unwrap();
        assert_eq!(meta.methods(MarkerKind::PostConstruct).len(), 1);
        assert!(Arc::ptr_eq(&meta, &engine.metadata_by_name("app::Derived").unwrap()));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = LifecycleEngine::builder().max_capacity(0).build();
        assert!(matches!(result, Err(LifemarkError::Config(_))));
    }

    #[test]
    fn test_preload_runs_on_configured_pool() {
        let registry = registry();
        let engine = LifecycleEngine::builder()
            .loader(registry.clone())
            .bind_policy(BindPolicy::Disabled)
            .preload_threads(2)
            .build()
            .unwrap();
        let classes = ["app::Base", "app::Derived"]
            .map(|name| registry.load(name).unwrap())
            .to_vec();

        let report = engine.preload(&classes).unwrap();

        assert_eq!(report, PreloadReport { loaded: 2, failed: 0 });
        assert_eq!(engine.cache().entry_count(), 2);
        assert_eq!(engine.pool().unwrap().current_num_threads(), 2);
    }
}
