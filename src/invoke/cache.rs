use super::handle::{BindPolicy, FieldSlot, HandleBinder, MethodSlot, Slot};
use crate::reflect::{FieldDescriptor, MemberId, MethodDescriptor};
use dashmap::DashMap;

/// Default number of member slots reserved per namespace.
pub const DEFAULT_HANDLE_CAPACITY: usize = 32_768;

/// Process-wide memo of direct-invocation handles, keyed by member identity.
///
/// Each member is bound at most once; a failed binding is remembered as
/// unavailable and the reflective path is used from then on. Method and
/// field namespaces are independent. Entries are never evicted.
pub struct HandleCache {
    binder: HandleBinder,
    methods: DashMap<MemberId, MethodSlot>,
    fields: DashMap<MemberId, FieldSlot>,
}

impl HandleCache {
    pub fn new(policy: BindPolicy) -> Self {
        Self::with_capacity(policy, DEFAULT_HANDLE_CAPACITY)
    }

    pub fn with_capacity(policy: BindPolicy, capacity: usize) -> Self {
        Self {
            binder: HandleBinder::new(policy),
            methods: DashMap::with_capacity(capacity),
            fields: DashMap::with_capacity(capacity),
        }
    }

    pub fn policy(&self) -> BindPolicy {
        self.binder.policy()
    }

    pub(crate) fn method_slot(&self, method: &MethodDescriptor) -> MethodSlot {
        if let Some(slot) = self.methods.get(method.id()) {
            return *slot;
        }
        // The entry guard holds the shard lock, so concurrent first uses bind once.
        *self
            .methods
            .entry(method.id().clone())
            .or_insert_with(|| match self.binder.bind_method(method) {
                Ok(handle) => Slot::Bound(handle),
                Err(reason) => {
                    tracing::trace!(member = %method.id(), %reason, "Method handle unavailable");
                    Slot::Unavailable
                }
            })
    }

    pub(crate) fn field_slot(&self, field: &FieldDescriptor) -> FieldSlot {
        if let Some(slot) = self.fields.get(field.id()) {
            return *slot;
        }
        *self
            .fields
            .entry(field.id().clone())
            .or_insert_with(|| match self.binder.bind_field(field) {
                Ok(handle) => Slot::Bound(handle),
                Err(reason) => {
                    tracing::trace!(member = %field.id(), %reason, "Field handle unavailable");
                    Slot::Unavailable
                }
            })
    }

    /// `Some(true)` if the method has a bound handle, `Some(false)` if it is
    /// marked unavailable, `None` if it was never requested.
    pub fn method_bound(&self, member: &MemberId) -> Option<bool> {
        self.methods.get(member).map(|slot| slot.is_bound())
    }

    pub fn field_bound(&self, member: &MemberId) -> Option<bool> {
        self.fields.get(member).map(|slot| slot.is_bound())
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

impl Default for HandleCache {
    fn default() -> Self {
        Self::new(BindPolicy::default())
    }
}
