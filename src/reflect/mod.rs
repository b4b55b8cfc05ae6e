//! Static type model
//!
//! Rust has no runtime reflection, so the engine analyses descriptors
//! instead: member tables generated at compile time by `lifemark-macro`, or
//! built by hand for types discovered at runtime. Supertypes are resolved
//! through a [`TypeLoader`], which is allowed to fail for types that cannot
//! be loaded.

mod descriptor;
mod error;
mod loader;
mod object;

pub use descriptor::{
    ClassBuilder, ClassDescriptor, ClassKind, FieldAccess, FieldDescriptor, FieldValue,
    HookResult, MemberId, MethodBody, MethodDescriptor, TypeRef, Visibility,
};
pub use error::ReflectError;
pub use loader::{TypeLoader, TypeRegistry};
pub use object::{Described, HookTable, IntoHookResult, Reflect, downcast_target};
