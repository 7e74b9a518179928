//! Type Registry
//!
//! Maps a resource type name to the descriptor used to construct its
//! records. Types missing from the registry still sync, through the
//! generic record representation.

use super::flatten::FlatRecord;
use super::record::{Record, RecordModel};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Custom constructor hook for a registered type
pub type Constructor = Arc<dyn Fn(&TypeDescriptor, FlatRecord) -> Record + Send + Sync>;

/// Type definition, loadable from JSON
#[derive(Clone, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Resource type name as it appears on the wire
    #[serde(rename = "type")]
    pub name: String,
    /// Attribute values applied before the wire attributes on construction
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub defaults: Map<String, Value>,
    #[serde(skip)]
    constructor: Option<Constructor>,
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("defaults", &self.defaults)
            .field("constructor", &self.constructor.is_some())
            .finish()
    }
}

impl TypeDescriptor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            defaults: Map::new(),
            constructor: None,
        }
    }

    /// Add a default attribute value
    pub fn with_default(mut self, attribute: &str, value: Value) -> Self {
        self.defaults.insert(attribute.to_string(), value);
        self
    }

    /// Replace the default construction with a custom one
    pub fn with_constructor<F>(mut self, constructor: F) -> Self
    where
        F: Fn(&TypeDescriptor, FlatRecord) -> Record + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(constructor));
        self
    }

    /// Construct a new record of this type from flattened data
    pub fn construct(&self, flat: FlatRecord) -> Record {
        if let Some(constructor) = &self.constructor {
            return constructor(self, flat);
        }
        self.construct_default(flat)
    }

    /// Defaults first, then the wire attributes on top
    pub fn construct_default(&self, mut flat: FlatRecord) -> Record {
        let mut attributes = self.defaults.clone();
        attributes.extend(flat.attributes);
        flat.attributes = attributes;
        Record::new(flat, RecordModel::Registered(self.name.clone()))
    }
}

/// Registry of known types
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: BTreeMap<String, TypeDescriptor>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor, replacing any previous one with the same name
    pub fn register(&mut self, descriptor: TypeDescriptor) {
        self.types.insert(descriptor.name.clone(), descriptor);
    }

    /// Get a descriptor by type name
    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Get all registered type names
    pub fn names(&self) -> Vec<&str> {
        self.types.keys().map(|s| s.as_str()).collect()
    }

    /// Build a record for `flat`: registered construction when the type is
    /// known, generic otherwise
    pub fn construct(&self, flat: FlatRecord) -> Record {
        match self.get(&flat.kind) {
            Some(descriptor) => descriptor.construct(flat),
            None => Record::generic(flat),
        }
    }
}

impl FromIterator<TypeDescriptor> for TypeRegistry {
    fn from_iter<I: IntoIterator<Item = TypeDescriptor>>(iter: I) -> Self {
        let mut registry = Self::new();
        for descriptor in iter {
            registry.register(descriptor);
        }
        registry
    }
}
