use crate::marker::{Marker, MarkerKind};
use crate::reflect::{FieldDescriptor, MethodDescriptor};
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable lifecycle metadata of one type, across its whole hierarchy.
///
/// Query results are ordered: declaration order within a type, most-derived
/// type first across the hierarchy. A kind that was never found yields an
/// empty slice.
#[derive(Debug)]
pub struct LifecycleMetadata {
    class_name: Arc<str>,
    methods: HashMap<MarkerKind, Vec<Arc<MethodDescriptor>>>,
    fields: HashMap<MarkerKind, Vec<Arc<FieldDescriptor>>>,
    class_markers: HashMap<MarkerKind, Vec<Marker>>,
    has_lifecycle_work: bool,
    has_resource_work: bool,
}

impl LifecycleMetadata {
    pub(crate) fn new(
        class_name: Arc<str>,
        methods: HashMap<MarkerKind, Vec<Arc<MethodDescriptor>>>,
        fields: HashMap<MarkerKind, Vec<Arc<FieldDescriptor>>>,
        class_markers: HashMap<MarkerKind, Vec<Marker>>,
        validated: bool,
    ) -> Self {
        let has_resource_work = [MarkerKind::Resource, MarkerKind::Resources]
            .iter()
            .any(|kind| {
                methods.contains_key(kind)
                    || fields.contains_key(kind)
                    || class_markers.contains_key(kind)
            });
        let has_lifecycle_work = validated || !methods.is_empty() || !fields.is_empty();

        Self {
            class_name,
            methods,
            fields,
            class_markers,
            has_lifecycle_work,
            has_resource_work,
        }
    }

    /// Name of the type this metadata was extracted from.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn methods(&self, kind: MarkerKind) -> &[Arc<MethodDescriptor>] {
        self.methods.get(&kind).map_or(&[], Vec::as_slice)
    }

    pub fn fields(&self, kind: MarkerKind) -> &[Arc<FieldDescriptor>] {
        self.fields.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// Class-level declarations of `kind`, from every visited type.
    pub fn class_markers(&self, kind: MarkerKind) -> &[Marker] {
        self.class_markers.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// Any field or method marker anywhere in the hierarchy, or a validated
    /// field.
    pub fn has_lifecycle_work(&self) -> bool {
        self.has_lifecycle_work
    }

    /// A resource marker on the type, a field or a method.
    pub fn has_resource_work(&self) -> bool {
        self.has_resource_work
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty() && self.fields.is_empty() && self.class_markers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(
        methods: &[MarkerKind],
        fields: &[MarkerKind],
        classes: &[MarkerKind],
        validated: bool,
    ) -> LifecycleMetadata {
        let methods = methods
            .iter()
            .map(|&k| (k, vec![Arc::new(MethodDescriptor::new("hook").with_marker(k))]))
            .collect();
        let fields = fields
            .iter()
            .map(|&k| (k, vec![Arc::new(FieldDescriptor::new("value", "String").with_marker(k))]))
            .collect();
        let classes = classes.iter().map(|&k| (k, vec![Marker::new(k)])).collect();
        LifecycleMetadata::new(Arc::from("app::Subject"), methods, fields, classes, validated)
    }

    #[test]
    fn test_class_resource_alone_is_not_lifecycle_work() {
        let meta = metadata(&[], &[], &[MarkerKind::Resource], false);
        assert!(meta.has_resource_work());
        assert!(!meta.has_lifecycle_work());
        assert_eq!(meta.class_markers(MarkerKind::Resource).len(), 1);
    }

    #[test]
    fn test_resource_fields_count_for_both_flags() {
        let meta = metadata(&[], &[MarkerKind::Resources], &[], false);
        assert!(meta.has_resource_work());
        assert!(meta.has_lifecycle_work());
    }

    #[test]
    fn test_validation_alone_is_lifecycle_work() {
        let meta = metadata(&[], &[], &[], true);
        assert!(meta.has_lifecycle_work());
        assert!(!meta.has_resource_work());
        assert!(meta.is_empty());
    }

    #[test]
    fn test_missing_kinds_are_empty() {
        let meta = metadata(&[MarkerKind::PostConstruct], &[], &[], false);
        assert_eq!(meta.methods(MarkerKind::PostConstruct).len(), 1);
        assert!(meta.methods(MarkerKind::PreDestroy).is_empty());
        assert!(meta.fields(MarkerKind::Configuration).is_empty());
        assert!(meta.class_markers(MarkerKind::Resources).is_empty());
        assert_eq!(meta.class_name(), "app::Subject");
    }
}
