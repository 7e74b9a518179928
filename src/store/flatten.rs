//! Record Flattener
//!
//! Turns one wire resource into the flat attribute bag a canonical record is
//! built or updated from. Relationship linkage is left alone here: it can only
//! be resolved once every record of the document exists.

use crate::document::Resource;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Suffix of the synthetic attribute holding a relationship's links
pub const LINKS_SUFFIX: &str = "Links";

/// Name of the synthetic attribute carrying the links of `relationship`
pub fn links_attribute(relationship: &str) -> String {
    format!("{}{}", relationship, LINKS_SUFFIX)
}

/// Flattened resource, ready to construct or update a record
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRecord {
    pub id: String,
    pub kind: String,
    pub attributes: Map<String, Value>,
    /// Keys of `attributes` that were injected from relationship links
    pub link_attributes: BTreeSet<String>,
}

/// Flatten a wire resource.
///
/// Attributes are copied shallowly under their own key. Every relationship
/// carrying `links` adds `<name>Links`, a verbatim copy of that links
/// object, whether or not it also has `data`.
pub fn flatten(resource: &Resource) -> FlatRecord {
    let mut attributes = resource.attributes.clone();
    let mut link_attributes = BTreeSet::new();

    for (name, entry) in &resource.relationships {
        if let Some(links) = &entry.links {
            let key = links_attribute(name);
            attributes.insert(key.clone(), Value::Object(links.clone()));
            link_attributes.insert(key);
        }
    }

    FlatRecord {
        id: resource.id.clone(),
        kind: resource.kind.clone(),
        attributes,
        link_attributes,
    }
}
