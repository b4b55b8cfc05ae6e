//! Direct-invocation handles and the binder that produces them

use crate::reflect::{
    FieldAccess, FieldDescriptor, FieldValue, HookResult, MemberId, MethodBody, MethodDescriptor,
    Visibility,
};
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use strum_macros::{Display, EnumString};
use thiserror::Error;

/// Which members may be bound to direct handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BindPolicy {
    /// Bind every member that has a compiled body.
    #[default]
    All,
    /// Deny private members; they go through the reflective path.
    PublicOnly,
    /// Bind nothing.
    Disabled,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum MethodHandle {
    Instance {
        owner: TypeId,
        body: fn(&mut dyn Any) -> HookResult,
    },
    Static(fn() -> HookResult),
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum FieldHandle {
    Instance {
        owner: TypeId,
        get: fn(&dyn Any) -> Option<FieldValue>,
        set: fn(&mut dyn Any, FieldValue) -> Result<(), FieldValue>,
    },
    Static {
        get: fn() -> FieldValue,
        set: fn(FieldValue) -> Result<(), FieldValue>,
    },
}

/// A handle-cache entry. `Unavailable` is final: binding is never retried.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Slot<H> {
    Bound(H),
    Unavailable,
}

impl<H> Slot<H> {
    pub(crate) fn is_bound(&self) -> bool {
        matches!(self, Slot::Bound(_))
    }
}

pub(crate) type MethodSlot = Slot<MethodHandle>;
pub(crate) type FieldSlot = Slot<FieldHandle>;

#[derive(Debug, Error)]
pub(crate) enum BindError {
    #[error("{0} has no body")]
    Abstract(MemberId),

    #[error("{0} is not backed by a Rust type")]
    Unowned(MemberId),

    #[error("{0} is private")]
    Private(MemberId),

    #[error("binding is disabled")]
    Disabled,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct HandleBinder {
    policy: BindPolicy,
}

impl HandleBinder {
    pub(crate) fn new(policy: BindPolicy) -> Self {
        Self { policy }
    }

    pub(crate) fn policy(&self) -> BindPolicy {
        self.policy
    }

    pub(crate) fn bind_method(&self, method: &MethodDescriptor) -> Result<MethodHandle, BindError> {
        self.check(method.id(), method.visibility())?;
        match method.body() {
            None => Err(BindError::Abstract(method.id().clone())),
            Some(MethodBody::Static(body)) => Ok(MethodHandle::Static(body)),
            Some(MethodBody::Instance(body)) => {
                let owner = method
                    .owner()
                    .ok_or_else(|| BindError::Unowned(method.id().clone()))?;
                Ok(MethodHandle::Instance { owner, body })
            }
        }
    }

    pub(crate) fn bind_field(&self, field: &FieldDescriptor) -> Result<FieldHandle, BindError> {
        self.check(field.id(), field.visibility())?;
        match field.access() {
            None => Err(BindError::Abstract(field.id().clone())),
            Some(FieldAccess::Static { get, set }) => Ok(FieldHandle::Static { get, set }),
            Some(FieldAccess::Instance { get, set }) => {
                let owner = field
                    .owner()
                    .ok_or_else(|| BindError::Unowned(field.id().clone()))?;
                Ok(FieldHandle::Instance { owner, get, set })
            }
        }
    }

    fn check(&self, member: &MemberId, visibility: Visibility) -> Result<(), BindError> {
        match (self.policy, visibility) {
            (BindPolicy::Disabled, _) => Err(BindError::Disabled),
            (BindPolicy::PublicOnly, Visibility::Private) => Err(BindError::Private(member.clone())),
            _ => Ok(()),
        }
    }
}
