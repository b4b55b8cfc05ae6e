use super::LifecycleEngine;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::invoke::{BindPolicy, HandleCache, Invoker};
use crate::metadata::MetadataCache;
use crate::reflect::{TypeLoader, TypeRegistry};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Builder for [`LifecycleEngine`].
///
/// # Example
/// ```
/// use lifemark::{BindPolicy, LifecycleEngine};
/// use lifemark::reflect::TypeRegistry;
///
/// let registry = TypeRegistry::new();
/// let engine = LifecycleEngine::builder()
///     .loader(registry.clone())
///     .bind_policy(BindPolicy::PublicOnly)
///     .max_capacity(1024)
///     .build()
///     .unwrap();
/// assert_eq!(engine.handles().policy(), BindPolicy::PublicOnly);
/// ```
pub struct EngineBuilder {
    config: EngineConfig,
    loader: Option<Arc<dyn TypeLoader>>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            loader: None,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Loader used to resolve supertypes and member links. Defaults to an
    /// empty [`TypeRegistry`].
    pub fn loader(self, loader: impl TypeLoader + 'static) -> Self {
        self.shared_loader(Arc::new(loader))
    }

    pub fn shared_loader(mut self, loader: Arc<dyn TypeLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn bind_policy(mut self, policy: BindPolicy) -> Self {
        self.config.bind_policy = policy;
        self
    }

    pub fn max_capacity(mut self, max_capacity: u64) -> Self {
        self.config.metadata_cache.max_capacity = max_capacity;
        self
    }

    /// Idle expiry, rounded up to whole seconds. A zero duration is rejected
    /// by [`build`](Self::build).
    pub fn time_to_idle(mut self, idle: Duration) -> Self {
        let secs = idle.as_secs() + u64::from(idle.subsec_nanos() > 0);
        self.config.metadata_cache.time_to_idle_secs = Some(secs);
        self
    }

    pub fn preload_threads(mut self, threads: usize) -> Self {
        self.config.preload_threads = threads;
        self
    }

    pub fn build(self) -> Result<LifecycleEngine> {
        self.config.validate()?;

        let loader = self
            .loader
            .unwrap_or_else(|| Arc::new(TypeRegistry::new()));
        let handles = Arc::new(HandleCache::with_capacity(
            self.config.bind_policy,
            self.config.handle_cache.initial_capacity,
        ));
        let metadata = MetadataCache::new(
            &self.config.metadata_cache,
            Arc::clone(&loader),
            Arc::clone(&handles),
        );

        tracing::info!(
            bind_policy = %self.config.bind_policy,
            max_capacity = self.config.metadata_cache.max_capacity,
            time_to_idle_secs = ?self.config.metadata_cache.time_to_idle_secs,
            "Lifecycle engine ready"
        );

        Ok(LifecycleEngine {
            invoker: Invoker::new(Arc::clone(&handles)),
            config: self.config,
            loader,
            handles,
            metadata,
            pool: OnceLock::new(),
        })
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LifemarkError;

    #[test]
    fn test_time_to_idle_rounds_up() {
        let engine = EngineBuilder::new()
            .time_to_idle(Duration::from_millis(250))
            .build()
            .unwrap();
        assert_eq!(engine.config().metadata_cache.time_to_idle_secs, Some(1));

        let engine = EngineBuilder::new()
            .time_to_idle(Duration::from_millis(1500))
            .build()
            .unwrap();
        assert_eq!(engine.config().metadata_cache.time_to_idle_secs, Some(2));

        let engine = EngineBuilder::new()
            .time_to_idle(Duration::from_secs(30))
            .build()
            .unwrap();
        assert_eq!(engine.config().metadata_cache.time_to_idle_secs, Some(30));
    }

    #[test]
    fn test_zero_idle_is_rejected() {
        let result = EngineBuilder::new().time_to_idle(Duration::ZERO).build();
        assert!(matches!(result, Err(LifemarkError::Config(_))));
    }
}
