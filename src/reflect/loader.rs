use super::{ClassDescriptor, Described, ReflectError};
use dashmap::DashMap;
use std::sync::Arc;

/// The type-loading context descriptors are resolved against.
pub trait TypeLoader: Send + Sync {
    /// Load a type by name.
    ///
    /// # Errors
    /// [`ReflectError::Unresolved`] when the name is unknown to this loader.
    fn load(&self, name: &str) -> Result<Arc<ClassDescriptor>, ReflectError>;
}

/// Thread-safe, name-keyed registry of type descriptors.
///
/// Types can be registered and unregistered at any time; unregistering a
/// type makes every reference to it unresolvable from then on.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    types: Arc<DashMap<Arc<str>, Arc<ClassDescriptor>>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, descriptor: Arc<ClassDescriptor>) -> &Self {
        let name: Arc<str> = Arc::from(descriptor.name());
        self.types.insert(name, descriptor);
        self
    }

    pub fn register_described<T: Described>(&self) -> &Self {
        self.register(T::descriptor())
    }

    pub fn unregister(&self, name: &str) -> Option<Arc<ClassDescriptor>> {
        self.types.remove(name).map(|(_, descriptor)| descriptor)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeLoader for TypeRegistry {
    fn load(&self, name: &str) -> Result<Arc<ClassDescriptor>, ReflectError> {
        self.types
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| ReflectError::unresolved(name))
    }
}
