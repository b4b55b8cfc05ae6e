//! Runtime object model
//!
//! [`Reflect`] is what the slow invocation path talks to: by-name dispatch
//! on a live instance. [`Described`] ties a Rust type to its descriptor and
//! [`HookTable`] carries the methods collected by `#[hooks]`.

use super::{ClassDescriptor, FieldValue, HookResult, MethodDescriptor};
use std::any::{Any, TypeId};
use std::sync::Arc;

/// A live instance the engine can inspect and drive.
///
/// Usually implemented by `#[derive(Lifecycle)]`. The `declaring` argument
/// of the `reflect_*` methods names the type that declared the member;
/// `None` asks for virtual dispatch, matching the most-derived member of
/// that name (used for members declared by interfaces).
pub trait Reflect: Any + Send + Sync {
    /// Name of the concrete type.
    fn type_name(&self) -> &str;

    /// Borrow the state belonging to `ty`: `self`, or an embedded parent.
    fn project(&self, ty: TypeId) -> Option<&dyn Any>;

    /// Mutable counterpart of [`Reflect::project`].
    fn project_mut(&mut self, ty: TypeId) -> Option<&mut dyn Any>;

    /// Invoke a method by name. `None` if no such method is reachable.
    fn reflect_invoke(&mut self, declaring: Option<&str>, name: &str) -> Option<HookResult>;

    /// Read a field by name. `None` if no such field is reachable.
    fn reflect_get(&self, declaring: Option<&str>, name: &str) -> Option<FieldValue>;

    /// Write a field by name.
    ///
    /// `None` if no such field is reachable, `Some(Err(value))` if the value
    /// has the wrong type.
    fn reflect_set(
        &mut self,
        declaring: Option<&str>,
        name: &str,
        value: FieldValue,
    ) -> Option<Result<(), FieldValue>>;
}

/// A Rust type with a compile-time descriptor.
pub trait Described: Reflect + Sized {
    /// Fully qualified type name, unique within a loader.
    const TYPE_NAME: &'static str;

    /// The type's descriptor, built once per process.
    fn descriptor() -> Arc<ClassDescriptor>;
}

/// Methods collected from a `#[hooks]` impl block.
pub trait HookTable {
    fn hook_methods() -> Vec<MethodDescriptor>;

    /// Run the named instance hook declared in the block.
    fn dispatch_hook(&mut self, name: &str) -> Option<HookResult>;
}

/// Normalizes hook return types into [`HookResult`].
pub trait IntoHookResult {
    fn into_hook_result(self) -> HookResult;
}

impl IntoHookResult for () {
    fn into_hook_result(self) -> HookResult {
        Ok(())
    }
}

impl<E> IntoHookResult for Result<(), E>
where
    E: Into<anyhow::Error>,
{
    fn into_hook_result(self) -> HookResult {
        self.map_err(Into::into)
    }
}

/// Downcasts a projected target inside generated hook bodies.
pub fn downcast_target<T: Any>(target: &mut dyn Any) -> anyhow::Result<&mut T> {
    target.downcast_mut::<T>().ok_or_else(|| {
        anyhow::anyhow!(
            "target is not a {}",
            std::any::type_name::<T>()
        )
    })
}
