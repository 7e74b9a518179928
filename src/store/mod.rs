//! Normalization store
//!
//! Holds canonical records keyed by `(type, id)` and merges JSON:API
//! documents into them.
//!
//! # Module Structure
//!
//! - [`flatten`] - Wire resource to flat attribute bag
//! - [`record`] - Canonical record and resolved relationships
//! - [`registry`] - Type name to record constructor mapping
//!
//! # Sync
//!
//! [`Store::sync`] runs two passes over `included` followed by `data`:
//! every resource is resolved into a record first, then every relationship
//! is linked. Linkage may therefore point at records appearing later in the
//! same document.
//!
//! ```ignore
//! let mut store = Store::new();
//! let article = store.sync(&document);
//! let author = store.related(&key, "author");
//! ```

pub mod flatten;
pub mod record;
pub mod registry;

pub use flatten::{flatten, links_attribute, FlatRecord};
pub use record::{Record, RecordKey, RecordModel, Relationship};
pub use registry::{TypeDescriptor, TypeRegistry};

use crate::document::{Document, OneOrMany, Resource};
use serde_json::Value;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Store shared between concurrent requests. Syncs lock it for their whole
/// two-pass run.
pub type SharedStore = Arc<Mutex<Store>>;

/// Keys of the primary records returned by a sync, shaped like `data`
pub type SyncResult = Option<OneOrMany<RecordKey>>;

/// Deduplicated record collection
#[derive(Debug, Clone, Default)]
pub struct Store {
    records: BTreeMap<RecordKey, Record>,
    registry: TypeRegistry,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: TypeRegistry) -> Self {
        Self {
            records: BTreeMap::new(),
            registry,
        }
    }

    /// Wrap this store for use across tasks
    pub fn shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TypeRegistry {
        &mut self.registry
    }

    // =========================================================================
    // Collection primitives
    // =========================================================================

    pub fn find(&self, kind: &str, id: &str) -> Option<&Record> {
        self.records.get(&RecordKey::new(kind, id))
    }

    pub fn find_mut(&mut self, kind: &str, id: &str) -> Option<&mut Record> {
        self.records.get_mut(&RecordKey::new(kind, id))
    }

    pub fn get(&self, key: &RecordKey) -> Option<&Record> {
        self.records.get(key)
    }

    /// All records of one type, ordered by id
    pub fn find_all(&self, kind: &str) -> Vec<&Record> {
        self.records
            .values()
            .filter(|record| record.kind() == kind)
            .collect()
    }

    /// Add flattened data as a record.
    ///
    /// With `kind` naming a registered type the record is built through its
    /// descriptor, otherwise generically. A `kind` other than the record's own
    /// type is ignored. An existing `(type, id)` is updated in place instead.
    pub fn add(&mut self, flat: FlatRecord, kind: Option<&str>) -> &Record {
        let kind = kind.filter(|kind| *kind == flat.kind);
        let key = RecordKey::new(&flat.kind, &flat.id);
        match self.records.entry(key) {
            Entry::Occupied(entry) => {
                let record = entry.into_mut();
                record.update(flat);
                record
            }
            Entry::Vacant(entry) => {
                let record = match kind.and_then(|k| self.registry.get(k)) {
                    Some(descriptor) => descriptor.construct(flat),
                    None => Record::generic(flat),
                };
                entry.insert(record)
            }
        }
    }

    /// Remove a record. References to it from other records resolve to
    /// nothing afterwards.
    pub fn remove(&mut self, kind: &str, id: &str) -> Option<Record> {
        self.records.remove(&RecordKey::new(kind, id))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    /// Look up records for a set of keys, keeping its shape
    pub fn lookup(&self, keys: &OneOrMany<RecordKey>) -> OneOrMany<Option<&Record>> {
        keys.map_ref(|key| self.records.get(key))
    }

    /// Follow a relationship of a record to the records it currently points at
    pub fn related(&self, key: &RecordKey, name: &str) -> Option<OneOrMany<Option<&Record>>> {
        let relationship = self.records.get(key)?.relationship(name)?;
        Some(
            relationship
                .targets
                .map_ref(|target| target.as_ref().and_then(|k| self.records.get(k))),
        )
    }

    // =========================================================================
    // Normalization
    // =========================================================================

    /// Insert or update the canonical record for one resource.
    ///
    /// Relationship linkage is not touched; see [`Store::link`].
    pub fn resolve(&mut self, resource: &Resource) -> &Record {
        let flat = flatten(resource);
        match self.records.entry(resource.identifier()) {
            Entry::Occupied(entry) => {
                let record = entry.into_mut();
                record.update(flat);
                record
            }
            Entry::Vacant(entry) => entry.insert(self.registry.construct(flat)),
        }
    }

    /// Wire the relationships of one resource onto its record.
    ///
    /// Every record of the document must already be resolved. Targets not
    /// found in the store are assigned as `None`.
    pub fn link(&mut self, resource: &Resource) {
        let key = resource.identifier();
        if !self.records.contains_key(&key) {
            tracing::trace!("link: no record for {}:{}, skipping", key.kind, key.id);
            return;
        }

        for (name, entry) in &resource.relationships {
            let Some(data) = &entry.data else {
                continue;
            };

            let targets = data.map_ref(|target| {
                if self.records.contains_key(target) {
                    Some(target.clone())
                } else {
                    tracing::trace!(
                        "link: {}:{}.{} -> {}:{} not found",
                        key.kind,
                        key.id,
                        name,
                        target.kind,
                        target.id
                    );
                    None
                }
            });

            if let Some(record) = self.records.get_mut(&key) {
                record.assign_ref(name, targets, &resource.kind);
            }
        }
    }

    /// Merge a document into the store and return the keys of its primary data.
    pub fn sync(&mut self, document: &Document) -> SyncResult {
        let resources: Vec<&Resource> = document
            .included
            .iter()
            .chain(document.data.iter().flat_map(|data| data.iter()))
            .collect();

        for resource in &resources {
            self.resolve(resource);
        }
        for resource in &resources {
            self.link(resource);
        }

        tracing::debug!(
            "sync: {} resource(s) ({} included), store now holds {} record(s)",
            resources.len(),
            document.included.len(),
            self.records.len()
        );

        document
            .data
            .as_ref()
            .map(|data| data.map_ref(Resource::identifier))
    }

    /// Parse a raw JSON document and sync it. Fails only on malformed input.
    pub fn sync_json(&mut self, value: &Value) -> serde_json::Result<SyncResult> {
        let document: Document = serde_json::from_value(value.clone())?;
        Ok(self.sync(&document))
    }
}
