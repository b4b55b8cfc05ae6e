use crate::invoke::InvokeError;
use crate::metadata::ExtractError;
use crate::reflect::ReflectError;
use std::sync::Arc;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LifemarkError>;

#[derive(Debug, Error)]
pub enum LifemarkError {
    /// Metadata could not be computed. Shared by every caller that waited on
    /// the same extraction.
    #[error("Failed to build lifecycle metadata for {class}")]
    Caching {
        class: String,
        #[source]
        source: Arc<ExtractError>,
    },

    #[error(transparent)]
    Reflect(#[from] ReflectError),

    #[error(transparent)]
    Invoke(#[from] InvokeError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to start the preload pool")]
    Preload(#[from] rayon::ThreadPoolBuildError),
}
