//! Marker registry
//!
//! The fixed set of lifecycle, resource and configuration markers the engine
//! recognizes, and where each of them may legally appear.

use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// A recognized lifecycle marker kind.
///
/// The set is closed: the extractor only ever looks for these kinds, in the
/// order given by [`MarkerKind::METHOD`], [`MarkerKind::FIELD`] and
/// [`MarkerKind::CLASS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(AsRefStr, Display, EnumIter, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum MarkerKind {
    /// Runs before configuration values are bound.
    PreConfiguration,
    /// Runs once construction and injection are complete.
    PostConstruct,
    /// Runs when the instance is torn down.
    PreDestroy,
    /// A single resource injection point.
    Resource,
    /// A group of resource injection points.
    Resources,
    /// Runs during application warm-up.
    WarmUp,
    /// Binds a field to a configuration value.
    Configuration,
    /// Binds a field to a configuration variable.
    ConfigurationVariable,
}

impl MarkerKind {
    /// Kinds recognized on methods.
    pub const METHOD: &'static [MarkerKind] = &[
        MarkerKind::PreConfiguration,
        MarkerKind::PostConstruct,
        MarkerKind::PreDestroy,
        MarkerKind::Resource,
        MarkerKind::Resources,
        MarkerKind::WarmUp,
    ];

    /// Kinds recognized on fields.
    pub const FIELD: &'static [MarkerKind] = &[
        MarkerKind::Configuration,
        MarkerKind::Resource,
        MarkerKind::Resources,
        MarkerKind::ConfigurationVariable,
    ];

    /// Kinds recognized on the type itself.
    pub const CLASS: &'static [MarkerKind] = &[MarkerKind::Resource, MarkerKind::Resources];

    pub fn applies_to_methods(self) -> bool {
        Self::METHOD.contains(&self)
    }

    pub fn applies_to_fields(self) -> bool {
        Self::FIELD.contains(&self)
    }

    pub fn applies_to_classes(self) -> bool {
        Self::CLASS.contains(&self)
    }

    /// Resource and resource-group markers.
    pub fn is_resource(self) -> bool {
        matches!(self, MarkerKind::Resource | MarkerKind::Resources)
    }
}

/// One declared marker: its kind plus whatever the declaration carried.
///
/// `value` holds the configuration key, variable name or resource name;
/// `entries` holds the names grouped under a resource-group marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Marker {
    kind: MarkerKind,
    value: Option<String>,
    entries: Vec<String>,
}

impl Marker {
    pub fn new(kind: MarkerKind) -> Self {
        Self {
            kind,
            value: None,
            entries: Vec::new(),
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_entry(mut self, entry: impl Into<String>) -> Self {
        self.entries.push(entry.into());
        self
    }

    pub fn kind(&self) -> MarkerKind {
        self.kind
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

impl From<MarkerKind> for Marker {
    fn from(kind: MarkerKind) -> Self {
        Marker::new(kind)
    }
}
