//! Type-loading errors

use thiserror::Error;

/// Errors raised while resolving a type or enumerating its members.
#[derive(Debug, Clone, Error)]
pub enum ReflectError {
    /// The type is not known to the current loader
    #[error("Type {type_name} could not be resolved")]
    Unresolved {
        /// Name that failed to resolve
        type_name: String,
    },

    /// Linking a type's member tables failed because of another error
    #[error("Failed to link {type_name}")]
    Linkage {
        /// Type whose members were being enumerated
        type_name: String,
        /// What went wrong underneath
        #[source]
        source: Box<ReflectError>,
    },

    /// The loader itself failed
    #[error("Loader failed for {type_name}: {message}")]
    Loader {
        /// Type being loaded
        type_name: String,
        /// Error message
        message: String,
    },
}

impl ReflectError {
    /// Create an unresolved-type error
    pub fn unresolved(type_name: impl Into<String>) -> Self {
        Self::Unresolved {
            type_name: type_name.into(),
        }
    }

    /// Create a linkage error wrapping its cause
    pub fn linkage(type_name: impl Into<String>, source: ReflectError) -> Self {
        Self::Linkage {
            type_name: type_name.into(),
            source: Box::new(source),
        }
    }

    /// Create a loader failure error
    pub fn loader(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Loader {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// Whether a resolution failure sits anywhere along this error's chain.
    pub fn is_unresolved(&self) -> bool {
        match self {
            Self::Unresolved { .. } => true,
            Self::Linkage { source, .. } => source.is_unresolved(),
            Self::Loader { .. } => false,
        }
    }
}
