//! # Lifemark
//!
//! Lifecycle metadata discovery and fast hook invocation for
//! dependency-injected Rust services.
//!
//! An orchestrator (a DI container, an application bootstrap) asks the
//! engine which members of a type carry lifecycle markers: configuration
//! fields, construction and teardown hooks, resource declarations, warm-up
//! routines. The answer covers the whole type hierarchy, is computed once
//! per type and shared. Hooks are then run through direct handles, with a
//! by-name fallback that behaves identically.
//!
//! ## Features
//!
//! - **Hierarchy-aware extraction**: subtype members shadow ancestor members
//!   of the same name; unresolvable supertypes are skipped, not fatal
//! - **Single-flight caching**: concurrent first requests extract once
//! - **Direct handles**: each member is bound at most once
//! - **Compile-time member tables**: `#[derive(Lifecycle)]` and `#[hooks]`
//!
//! ## Quick Start
//!
//! ```rust
//! use lifemark::prelude::*;
//!
//! #[derive(Lifecycle, Default)]
//! #[lifecycle(hooks)]
//! pub struct Mailer {
//!     #[configuration("smtp.host")]
//!     host: String,
//!     connected: bool,
//! }
//!
//! #[hooks]
//! impl Mailer {
//!     #[post_construct]
//!     fn connect(&mut self) -> anyhow::Result<()> {
//!         anyhow::ensure!(!self.host.is_empty(), "smtp.host is not configured");
//!         self.connected = true;
//!         Ok(())
//!     }
//! }
//!
//! let engine = LifecycleEngine::new(TypeRegistry::new()).unwrap();
//! let metadata = engine.metadata_for::<Mailer>().unwrap();
//! assert!(metadata.has_lifecycle_work());
//!
//! let mut mailer = Mailer::default();
//! let host = &metadata.fields(MarkerKind::Configuration)[0];
//! engine
//!     .invoker()
//!     .set_field(host, Some(&mut mailer), Box::new(String::from("mx.local")))
//!     .unwrap();
//! engine.run_hooks(&mut mailer, MarkerKind::PostConstruct).unwrap();
//! assert!(mailer.connected);
//! ```

extern crate self as lifemark;

pub mod config;
pub mod engine;
pub mod error;
pub mod invoke;
pub mod marker;
pub mod metadata;
pub mod reflect;

// Re-export core types
pub use config::EngineConfig;
pub use engine::{EngineBuilder, LifecycleEngine};
pub use error::{LifemarkError, Result};
pub use invoke::{BindPolicy, HandleCache, InvokeError, Invoker};
pub use marker::{Marker, MarkerKind};
pub use metadata::{LifecycleMetadata, MetadataCache, MetadataExtractor};

// Re-export macros
pub use lifemark_macro::{Lifecycle, hooks};

/// Prelude module for convenient imports
///
/// ```
/// use lifemark::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::engine::{EngineBuilder, LifecycleEngine};
    pub use crate::error::{LifemarkError, Result};
    pub use crate::invoke::{BindPolicy, InvokeError, Invoker};
    pub use crate::marker::{Marker, MarkerKind};
    pub use crate::metadata::LifecycleMetadata;
    pub use crate::reflect::{
        ClassDescriptor, Described, FieldDescriptor, MethodDescriptor, Reflect, TypeLoader,
        TypeRef, TypeRegistry,
    };
    pub use crate::{Lifecycle, hooks};
    pub use std::sync::Arc;
}
