use super::lifecycle::LifecycleMetadata;
use crate::invoke::HandleCache;
use crate::marker::{Marker, MarkerKind};
use crate::reflect::{ClassDescriptor, FieldDescriptor, MethodDescriptor, ReflectError, TypeLoader, TypeRef};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

/// Failure to compute metadata. Never cached; a later request retries.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Type {class} appears in its own supertype chain")]
    CyclicHierarchy { class: String },
}

/// Walks a type hierarchy and collects its lifecycle metadata.
///
/// The walk is depth-first: the type itself, then its superclass chain, then
/// its interfaces in declaration order. The first member seen for a given
/// name and marker kind wins, so a subtype shadows its ancestors.
pub struct MetadataExtractor<'a> {
    loader: &'a dyn TypeLoader,
    handles: &'a HandleCache,
}

impl<'a> MetadataExtractor<'a> {
    pub fn new(loader: &'a dyn TypeLoader, handles: &'a HandleCache) -> Self {
        Self { loader, handles }
    }

    pub fn extract(&self, class: &ClassDescriptor) -> Result<LifecycleMetadata, ExtractError> {
        let mut walk = Walk::default();
        let mut path = Vec::new();
        self.visit(class, &mut walk, &mut path)?;

        tracing::debug!(
            class = class.name(),
            types = walk.visited.len(),
            methods = walk.methods.values().map(Vec::len).sum::<usize>(),
            fields = walk.fields.values().map(Vec::len).sum::<usize>(),
            "Extracted lifecycle metadata"
        );

        Ok(LifecycleMetadata::new(
            Arc::from(class.name()),
            walk.methods,
            walk.fields,
            walk.class_markers,
            walk.validated,
        ))
    }

    fn visit(
        &self,
        class: &ClassDescriptor,
        walk: &mut Walk,
        path: &mut Vec<String>,
    ) -> Result<(), ExtractError> {
        if path.iter().any(|name| name == class.name()) {
            return Err(ExtractError::CyclicHierarchy {
                class: class.name().to_string(),
            });
        }
        // Reached again through another interface path. Its class markers
        // are recorded once, not once per path.
        if !walk.visited.insert(class.name().to_string()) {
            return Ok(());
        }

        for kind in MarkerKind::CLASS.iter().copied() {
            let found: Vec<Marker> = class
                .markers()
                .iter()
                .filter(|m| m.kind() == kind)
                .cloned()
                .collect();
            if !found.is_empty() {
                walk.class_markers.entry(kind).or_default().extend(found);
            }
        }

        match class.declared_fields(self.loader) {
            Ok(fields) => fields.iter().for_each(|field| self.record_field(field, walk)),
            Err(error) => skip_members(class, "fields", &error),
        }
        match class.declared_methods(self.loader) {
            Ok(methods) => methods.iter().for_each(|method| self.record_method(method, walk)),
            Err(error) => skip_members(class, "methods", &error),
        }

        path.push(class.name().to_string());
        if let Some(superclass) = class.superclass() {
            self.visit_supertype(class, superclass, walk, path)?;
        }
        for interface in class.interfaces() {
            self.visit_supertype(class, interface, walk, path)?;
        }
        path.pop();

        Ok(())
    }

    fn visit_supertype(
        &self,
        class: &ClassDescriptor,
        supertype: &TypeRef,
        walk: &mut Walk,
        path: &mut Vec<String>,
    ) -> Result<(), ExtractError> {
        match supertype.resolve(self.loader) {
            Ok(descriptor) => self.visit(&descriptor, walk, path),
            // The level contributes nothing; the rest of the walk goes on
            Err(error) => {
                tracing::debug!(
                    class = class.name(),
                    supertype = %label(supertype),
                    unresolved = error.is_unresolved(),
                    %error,
                    "Supertype could not be loaded; skipping it"
                );
                Ok(())
            }
        }
    }

    fn record_field(&self, field: &Arc<FieldDescriptor>, walk: &mut Walk) {
        if field.is_synthetic() {
            return;
        }
        walk.validated |= field.is_validated();

        for kind in MarkerKind::FIELD.iter().copied() {
            if !field.has_marker(kind) {
                continue;
            }
            let used = walk.used_fields.entry(kind).or_default();
            if used.insert(field.name().to_string()) {
                self.handles.field_slot(field);
                walk.fields.entry(kind).or_default().push(Arc::clone(field));
            }
        }
    }

    fn record_method(&self, method: &Arc<MethodDescriptor>, walk: &mut Walk) {
        if method.is_synthetic() || method.is_bridge() {
            return;
        }

        for kind in MarkerKind::METHOD.iter().copied() {
            if !method.has_marker(kind) {
                continue;
            }
            // Keyed by name only: overloads collide
            let used = walk.used_methods.entry(kind).or_default();
            if used.insert(method.name().to_string()) {
                self.handles.method_slot(method);
                walk.methods.entry(kind).or_default().push(Arc::clone(method));
            }
        }
    }
}

#[derive(Default)]
struct Walk {
    visited: HashSet<String>,
    used_fields: HashMap<MarkerKind, HashSet<String>>,
    used_methods: HashMap<MarkerKind, HashSet<String>>,
    methods: HashMap<MarkerKind, Vec<Arc<MethodDescriptor>>>,
    fields: HashMap<MarkerKind, Vec<Arc<FieldDescriptor>>>,
    class_markers: HashMap<MarkerKind, Vec<Marker>>,
    validated: bool,
}

fn skip_members(class: &ClassDescriptor, members: &str, error: &ReflectError) {
    // Other enumeration failures drop the level without a trace
    if error.is_unresolved() {
        tracing::debug!(
            class = class.name(),
            %error,
            "Skipping {members}: a type they depend on could not be loaded"
        );
    }
}

fn label(supertype: &TypeRef) -> String {
    match supertype {
        TypeRef::Named(name) => name.to_string(),
        TypeRef::Linked(descriptor) => descriptor().name().to_string(),
    }
}
