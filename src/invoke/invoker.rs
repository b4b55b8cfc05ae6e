use super::cache::HandleCache;
use super::error::{InvokeError, STATIC_TARGET};
use super::handle::{FieldHandle, MethodHandle, Slot};
use crate::marker::MarkerKind;
use crate::metadata::LifecycleMetadata;
use crate::reflect::{
    FieldAccess, FieldDescriptor, FieldValue, MethodBody, MethodDescriptor, Reflect,
};
use std::any::Any;
use std::sync::Arc;

/// Invocation helpers for discovered members.
///
/// Every operation tries the member's direct handle first and falls back to
/// by-name dispatch through [`Reflect`] when the handle is unavailable. Both
/// paths observe and mutate the target identically.
#[derive(Clone)]
pub struct Invoker {
    handles: Arc<HandleCache>,
}

impl Invoker {
    pub fn new(handles: Arc<HandleCache>) -> Self {
        Self { handles }
    }

    pub fn handles(&self) -> &Arc<HandleCache> {
        &self.handles
    }

    /// Invoke a method. Static methods ignore `target`.
    ///
    /// # Errors
    /// [`InvokeError::TargetThrew`] when the hook itself fails; the other
    /// variants when the member cannot be invoked on `target` at all.
    pub fn invoke(
        &self,
        method: &MethodDescriptor,
        target: Option<&mut dyn Reflect>,
    ) -> Result<(), InvokeError> {
        match self.handles.method_slot(method) {
            Slot::Bound(handle) => invoke_direct(method, handle, target),
            Slot::Unavailable => invoke_reflective(method, target),
        }
    }

    /// Invoke every method carrying `kind`, in metadata order.
    ///
    /// Stops at the first failure.
    pub fn invoke_all(
        &self,
        metadata: &LifecycleMetadata,
        kind: MarkerKind,
        target: &mut dyn Reflect,
    ) -> Result<usize, InvokeError> {
        let methods = metadata.methods(kind);
        for method in methods {
            self.invoke(method, Some(&mut *target))?;
        }
        Ok(methods.len())
    }

    /// Read a field's current value. Static fields ignore `target`.
    pub fn get_field(
        &self,
        field: &FieldDescriptor,
        target: Option<&dyn Reflect>,
    ) -> Result<FieldValue, InvokeError> {
        match self.handles.field_slot(field) {
            Slot::Bound(FieldHandle::Static { get, .. }) => Ok(get()),
            Slot::Bound(FieldHandle::Instance { owner, get, .. }) => {
                let target = target.ok_or_else(|| InvokeError::missing_target(field.id()))?;
                target
                    .project(owner)
                    .and_then(|this| get(this))
                    .ok_or_else(|| InvokeError::not_applicable(field.id(), target.type_name()))
            }
            Slot::Unavailable => {
                if let Some(FieldAccess::Static { get, .. }) = field.access() {
                    return Ok(get());
                }
                let target = target.ok_or_else(|| InvokeError::missing_target(field.id()))?;
                target
                    .reflect_get(Some(field.id().declaring()), field.name())
                    .ok_or_else(|| InvokeError::not_applicable(field.id(), target.type_name()))
            }
        }
    }

    /// Read a field and downcast it to `T`.
    pub fn get_field_as<T: Any>(
        &self,
        field: &FieldDescriptor,
        target: Option<&dyn Reflect>,
    ) -> Result<T, InvokeError> {
        self.get_field(field, target)?
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| InvokeError::value_type(field.id(), field.type_name()))
    }

    /// Write a field. Static fields ignore `target`.
    pub fn set_field(
        &self,
        field: &FieldDescriptor,
        target: Option<&mut dyn Reflect>,
        value: FieldValue,
    ) -> Result<(), InvokeError> {
        let wrong_type = |_: FieldValue| InvokeError::value_type(field.id(), field.type_name());
        match self.handles.field_slot(field) {
            Slot::Bound(FieldHandle::Static { set, .. }) => set(value).map_err(wrong_type),
            Slot::Bound(FieldHandle::Instance { owner, set, .. }) => {
                let target = target.ok_or_else(|| InvokeError::missing_target(field.id()))?;
                let Some(this) = target.project_mut(owner) else {
                    return Err(InvokeError::not_applicable(field.id(), target.type_name()));
                };
                set(this, value).map_err(wrong_type)
            }
            Slot::Unavailable => {
                if let Some(FieldAccess::Static { set, .. }) = field.access() {
                    return set(value).map_err(wrong_type);
                }
                let target = target.ok_or_else(|| InvokeError::missing_target(field.id()))?;
                match target.reflect_set(Some(field.id().declaring()), field.name(), value) {
                    Some(result) => result.map_err(wrong_type),
                    None => Err(InvokeError::not_applicable(field.id(), target.type_name())),
                }
            }
        }
    }
}

fn invoke_direct(
    method: &MethodDescriptor,
    handle: MethodHandle,
    target: Option<&mut dyn Reflect>,
) -> Result<(), InvokeError> {
    match handle {
        MethodHandle::Static(body) => {
            body().map_err(|e| InvokeError::target_threw(method.id(), STATIC_TARGET, e))
        }
        MethodHandle::Instance { owner, body } => {
            let target = target.ok_or_else(|| InvokeError::missing_target(method.id()))?;
            let Some(this) = target.project_mut(owner) else {
                return Err(InvokeError::not_applicable(method.id(), target.type_name()));
            };
            let result = body(this);
            result.map_err(|e| InvokeError::target_threw(method.id(), target.type_name(), e))
        }
    }
}

fn invoke_reflective(
    method: &MethodDescriptor,
    target: Option<&mut dyn Reflect>,
) -> Result<(), InvokeError> {
    if let Some(MethodBody::Static(body)) = method.body() {
        return body().map_err(|e| InvokeError::target_threw(method.id(), STATIC_TARGET, e));
    }

    let target = target.ok_or_else(|| InvokeError::missing_target(method.id()))?;
    // Interface declarations dispatch to whatever the target provides.
    let declaring = (!method.is_abstract()).then(|| method.id().declaring());
    match target.reflect_invoke(declaring, method.name()) {
        Some(result) => {
            result.map_err(|e| InvokeError::target_threw(method.id(), target.type_name(), e))
        }
        None => Err(InvokeError::not_applicable(method.id(), target.type_name())),
    }
}
