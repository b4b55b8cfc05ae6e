//! Lifecycle metadata: extraction over a type hierarchy and the shared cache

mod cache;
mod extractor;
mod lifecycle;

pub use cache::{CacheStats, MetadataCache, PreloadReport};
pub use extractor::{ExtractError, MetadataExtractor};
pub use lifecycle::LifecycleMetadata;
