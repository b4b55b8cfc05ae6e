//! Type and member descriptors
//!
//! Descriptors are the static member tables the engine analyses. They are
//! normally generated by `#[derive(Lifecycle)]` and `#[hooks]`, but can be
//! assembled by hand through [`ClassDescriptor::builder`] for types that are
//! only known at runtime.

use super::{Described, ReflectError, TypeLoader};
use crate::marker::{Marker, MarkerKind};
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// A type-erased field value.
pub type FieldValue = Box<dyn Any + Send + Sync>;

/// What a lifecycle hook returns once normalized.
pub type HookResult = anyhow::Result<()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
}

/// Stable identity of a declared member: declaring type, name and signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberId {
    declaring: Arc<str>,
    name: Arc<str>,
    signature: Arc<str>,
}

impl MemberId {
    pub fn new(
        declaring: impl Into<Arc<str>>,
        name: impl Into<Arc<str>>,
        signature: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            declaring: declaring.into(),
            name: name.into(),
            signature: signature.into(),
        }
    }

    pub fn declaring(&self) -> &str {
        &self.declaring
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.declaring, self.name)
    }
}

/// Compiled body of a method.
///
/// Instance bodies receive the target already projected onto the declaring
/// type.
#[derive(Clone, Copy)]
pub enum MethodBody {
    Instance(fn(&mut dyn Any) -> HookResult),
    Static(fn() -> HookResult),
}

impl fmt::Debug for MethodBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodBody::Instance(_) => f.write_str("MethodBody::Instance"),
            MethodBody::Static(_) => f.write_str("MethodBody::Static"),
        }
    }
}

/// Compiled accessors of a field.
///
/// Instance accessors receive the target already projected onto the
/// declaring type. A setter hands the value back when its type is wrong.
#[derive(Clone, Copy)]
pub enum FieldAccess {
    Instance {
        get: fn(&dyn Any) -> Option<FieldValue>,
        set: fn(&mut dyn Any, FieldValue) -> Result<(), FieldValue>,
    },
    Static {
        get: fn() -> FieldValue,
        set: fn(FieldValue) -> Result<(), FieldValue>,
    },
}

impl fmt::Debug for FieldAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldAccess::Instance { .. } => f.write_str("FieldAccess::Instance"),
            FieldAccess::Static { .. } => f.write_str("FieldAccess::Static"),
        }
    }
}

/// A declared method.
#[derive(Debug, Clone)]
pub struct MethodDescriptor {
    id: MemberId,
    owner: Option<TypeId>,
    visibility: Visibility,
    synthetic: bool,
    bridge: bool,
    markers: Vec<Marker>,
    body: Option<MethodBody>,
}

impl MethodDescriptor {
    /// A method without a body, as declared by an interface.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            id: MemberId::new("", name, "()"),
            owner: None,
            visibility: Visibility::Public,
            synthetic: false,
            bridge: false,
            markers: Vec::new(),
            body: None,
        }
    }

    pub fn instance(name: impl Into<Arc<str>>, body: fn(&mut dyn Any) -> HookResult) -> Self {
        Self::new(name).with_body(MethodBody::Instance(body))
    }

    pub fn associated(name: impl Into<Arc<str>>, body: fn() -> HookResult) -> Self {
        Self::new(name).with_body(MethodBody::Static(body))
    }

    pub fn with_body(mut self, body: MethodBody) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_signature(mut self, signature: impl Into<Arc<str>>) -> Self {
        self.id.signature = signature.into();
        self
    }

    pub fn with_marker(mut self, marker: impl Into<Marker>) -> Self {
        self.markers.push(marker.into());
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn private(self) -> Self {
        self.with_visibility(Visibility::Private)
    }

    pub fn synthetic(mut self) -> Self {
        self.synthetic = true;
        self
    }

    pub fn bridge(mut self) -> Self {
        self.bridge = true;
        self
    }

    fn declared_by(mut self, declaring: &Arc<str>, owner: Option<TypeId>) -> Self {
        self.id.declaring = Arc::clone(declaring);
        self.owner = owner;
        self
    }

    pub fn id(&self) -> &MemberId {
        &self.id
    }

    pub fn name(&self) -> &str {
        self.id.name()
    }

    /// Rust type that declared this method, when backed by one.
    pub fn owner(&self) -> Option<TypeId> {
        self.owner
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_static(&self) -> bool {
        matches!(self.body, Some(MethodBody::Static(_)))
    }

    pub fn is_abstract(&self) -> bool {
        self.body.is_none()
    }

    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    pub fn is_bridge(&self) -> bool {
        self.bridge
    }

    pub fn body(&self) -> Option<MethodBody> {
        self.body
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn marker(&self, kind: MarkerKind) -> Option<&Marker> {
        self.markers.iter().find(|m| m.kind() == kind)
    }

    pub fn has_marker(&self, kind: MarkerKind) -> bool {
        self.marker(kind).is_some()
    }
}

/// A declared field.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    id: MemberId,
    owner: Option<TypeId>,
    visibility: Visibility,
    synthetic: bool,
    validated: bool,
    markers: Vec<Marker>,
    access: Option<FieldAccess>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<Arc<str>>, type_name: impl Into<Arc<str>>) -> Self {
        Self {
            id: MemberId::new("", name, type_name),
            owner: None,
            visibility: Visibility::Public,
            synthetic: false,
            validated: false,
            markers: Vec::new(),
            access: None,
        }
    }

    pub fn with_access(mut self, access: FieldAccess) -> Self {
        self.access = Some(access);
        self
    }

    pub fn with_marker(mut self, marker: impl Into<Marker>) -> Self {
        self.markers.push(marker.into());
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn private(self) -> Self {
        self.with_visibility(Visibility::Private)
    }

    /// Carries the validation marker.
    pub fn validated(mut self) -> Self {
        self.validated = true;
        self
    }

    pub fn synthetic(mut self) -> Self {
        self.synthetic = true;
        self
    }

    fn declared_by(mut self, declaring: &Arc<str>, owner: Option<TypeId>) -> Self {
        self.id.declaring = Arc::clone(declaring);
        self.owner = owner;
        self
    }

    pub fn id(&self) -> &MemberId {
        &self.id
    }

    pub fn name(&self) -> &str {
        self.id.name()
    }

    pub fn type_name(&self) -> &str {
        self.id.signature()
    }

    pub fn owner(&self) -> Option<TypeId> {
        self.owner
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_static(&self) -> bool {
        matches!(self.access, Some(FieldAccess::Static { .. }))
    }

    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    pub fn is_validated(&self) -> bool {
        self.validated
    }

    pub fn access(&self) -> Option<FieldAccess> {
        self.access
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn marker(&self, kind: MarkerKind) -> Option<&Marker> {
        self.markers.iter().find(|m| m.kind() == kind)
    }

    pub fn has_marker(&self, kind: MarkerKind) -> bool {
        self.marker(kind).is_some()
    }
}

/// Reference from one type to another.
#[derive(Clone)]
pub enum TypeRef {
    /// Resolved by name through the [`TypeLoader`]; may fail.
    Named(Arc<str>),
    /// Linked at compile time to a [`Described`] type.
    Linked(fn() -> Arc<ClassDescriptor>),
}

impl TypeRef {
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        TypeRef::Named(name.into())
    }

    pub fn linked<T: Described>() -> Self {
        TypeRef::Linked(T::descriptor)
    }

    pub fn resolve(&self, loader: &dyn TypeLoader) -> Result<Arc<ClassDescriptor>, ReflectError> {
        match self {
            TypeRef::Named(name) => loader.load(name),
            TypeRef::Linked(descriptor) => Ok(descriptor()),
        }
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => f.debug_tuple("Named").field(name).finish(),
            TypeRef::Linked(_) => f.write_str("Linked"),
        }
    }
}

/// Static description of one type: its markers, members and supertypes.
#[derive(Debug)]
pub struct ClassDescriptor {
    name: Arc<str>,
    kind: ClassKind,
    type_id: Option<TypeId>,
    markers: Vec<Marker>,
    fields: Vec<Arc<FieldDescriptor>>,
    methods: Vec<Arc<MethodDescriptor>>,
    superclass: Option<TypeRef>,
    interfaces: Vec<TypeRef>,
    links: Vec<Arc<str>>,
}

impl ClassDescriptor {
    pub fn builder(name: impl Into<Arc<str>>) -> ClassBuilder {
        ClassBuilder::new(name.into(), ClassKind::Class)
    }

    pub fn interface(name: impl Into<Arc<str>>) -> ClassBuilder {
        ClassBuilder::new(name.into(), ClassKind::Interface)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    pub fn type_id(&self) -> Option<TypeId> {
        self.type_id
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn superclass(&self) -> Option<&TypeRef> {
        self.superclass.as_ref()
    }

    pub fn interfaces(&self) -> &[TypeRef] {
        &self.interfaces
    }

    /// Fields declared directly on this type.
    ///
    /// Fails when a type the member tables link against cannot be loaded.
    pub fn declared_fields(
        &self,
        loader: &dyn TypeLoader,
    ) -> Result<&[Arc<FieldDescriptor>], ReflectError> {
        self.link(loader)?;
        Ok(&self.fields)
    }

    /// Methods declared directly on this type.
    pub fn declared_methods(
        &self,
        loader: &dyn TypeLoader,
    ) -> Result<&[Arc<MethodDescriptor>], ReflectError> {
        self.link(loader)?;
        Ok(&self.methods)
    }

    fn link(&self, loader: &dyn TypeLoader) -> Result<(), ReflectError> {
        for name in &self.links {
            loader
                .load(name)
                .map_err(|e| ReflectError::linkage(&*self.name, e))?;
        }
        Ok(())
    }
}

/// Builder for [`ClassDescriptor`].
///
/// # Example
/// ```
/// use lifemark::reflect::{ClassDescriptor, FieldDescriptor, MethodDescriptor, TypeRef};
/// use lifemark::MarkerKind;
///
/// let descriptor = ClassDescriptor::builder("app::Derived")
///     .extends(TypeRef::named("app::Base"))
///     .field(FieldDescriptor::new("name", "String").with_marker(MarkerKind::Configuration))
///     .method(MethodDescriptor::associated("warm", || Ok(())).with_marker(MarkerKind::WarmUp))
///     .build();
/// assert_eq!(descriptor.name(), "app::Derived");
/// ```
pub struct ClassBuilder {
    name: Arc<str>,
    kind: ClassKind,
    type_id: Option<TypeId>,
    markers: Vec<Marker>,
    fields: Vec<FieldDescriptor>,
    methods: Vec<MethodDescriptor>,
    superclass: Option<TypeRef>,
    interfaces: Vec<TypeRef>,
    links: Vec<Arc<str>>,
}

impl ClassBuilder {
    fn new(name: Arc<str>, kind: ClassKind) -> Self {
        Self {
            name,
            kind,
            type_id: None,
            markers: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            superclass: None,
            interfaces: Vec::new(),
            links: Vec::new(),
        }
    }

    /// Back the descriptor with a Rust type, enabling projection onto it.
    pub fn owned_by<T: Any>(mut self) -> Self {
        self.type_id = Some(TypeId::of::<T>());
        self
    }

    pub fn marker(mut self, marker: impl Into<Marker>) -> Self {
        self.markers.push(marker.into());
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    pub fn methods(mut self, methods: impl IntoIterator<Item = MethodDescriptor>) -> Self {
        self.methods.extend(methods);
        self
    }

    pub fn extends(mut self, superclass: TypeRef) -> Self {
        self.superclass = Some(superclass);
        self
    }

    pub fn implements(mut self, interface: TypeRef) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Declare a type the member tables depend on.
    pub fn links_against(mut self, type_name: impl Into<Arc<str>>) -> Self {
        self.links.push(type_name.into());
        self
    }

    pub fn build(self) -> ClassDescriptor {
        let Self {
            name,
            kind,
            type_id,
            markers,
            fields,
            methods,
            superclass,
            interfaces,
            links,
        } = self;

        let fields = fields
            .into_iter()
            .map(|f| Arc::new(f.declared_by(&name, type_id)))
            .collect();
        let methods = methods
            .into_iter()
            .map(|m| Arc::new(m.declared_by(&name, type_id)))
            .collect();

        ClassDescriptor {
            name,
            kind,
            type_id,
            markers,
            fields,
            methods,
            superclass,
            interfaces,
            links,
        }
    }
}
