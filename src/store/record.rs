//! Canonical records
//!
//! A record never owns another record. Relationship fields only hold the
//! identity of their targets, resolved through the [`Store`](super::Store)
//! when read.

use super::flatten::{links_attribute, FlatRecord, LINKS_SUFFIX};
use crate::document::{link_named, Link, Links, OneOrMany, RelationshipEntry, Resource, ResourceIdentifier};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Identity of a record inside a store: `(type, id)`
pub type RecordKey = ResourceIdentifier;

/// Which representation a record was built with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordModel {
    /// Built through a registered type descriptor
    Registered(String),
    /// Fallback attribute bag for types the registry does not know
    Generic,
}

/// Resolved linkage of one relationship
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Relationship {
    /// Targets; `None` where the referenced record was not found
    pub targets: OneOrMany<Option<RecordKey>>,
    /// Type of the resource that declared this relationship
    pub owner_type: String,
}

/// Deduplicated in-memory entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    model: RecordModel,
    attributes: Map<String, Value>,
    #[serde(skip)]
    link_attributes: BTreeSet<String>,
    relationships: BTreeMap<String, Relationship>,
}

impl Record {
    /// Build a record from flattened data
    pub fn new(flat: FlatRecord, model: RecordModel) -> Self {
        Self {
            id: flat.id,
            kind: flat.kind,
            model,
            attributes: flat.attributes,
            link_attributes: flat.link_attributes,
            relationships: BTreeMap::new(),
        }
    }

    /// Build a record with the generic representation
    pub fn generic(flat: FlatRecord) -> Self {
        Self::new(flat, RecordModel::Generic)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn key(&self) -> RecordKey {
        RecordKey::new(&self.kind, &self.id)
    }

    pub fn model(&self) -> &RecordModel {
        &self.model
    }

    pub fn is_generic(&self) -> bool {
        self.model == RecordModel::Generic
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Set a single attribute in place
    pub fn set_attribute(&mut self, name: &str, value: Value) {
        self.attributes.insert(name.to_string(), value);
    }

    /// Merge flattened data into this record.
    ///
    /// Present keys overwrite, absent keys are left untouched. Identity never
    /// changes.
    pub fn update(&mut self, flat: FlatRecord) {
        debug_assert_eq!(self.kind, flat.kind);
        debug_assert_eq!(self.id, flat.id);

        self.attributes.extend(flat.attributes);
        self.link_attributes.extend(flat.link_attributes);
    }

    /// Assign resolved targets to a relationship, replacing any previous linkage
    pub fn assign_ref(&mut self, name: &str, targets: OneOrMany<Option<RecordKey>>, owner_type: &str) {
        self.relationships.insert(
            name.to_string(),
            Relationship {
                targets,
                owner_type: owner_type.to_string(),
            },
        );
    }

    pub fn relationship(&self, name: &str) -> Option<&Relationship> {
        self.relationships.get(name)
    }

    pub fn relationships(&self) -> &BTreeMap<String, Relationship> {
        &self.relationships
    }

    /// Links stored for a relationship (the `<name>Links` attribute)
    pub fn relationship_links(&self, relationship: &str) -> Option<&Value> {
        self.attributes.get(&links_attribute(relationship))
    }

    /// A single named link of a relationship, e.g. `related`. `None` when
    /// the member is missing, `null` or has no `href`.
    pub fn relationship_link(&self, relationship: &str, link_name: &str) -> Option<Link> {
        link_named(self.relationship_links(relationship)?.as_object()?, link_name)
    }

    /// Serialize back into a wire resource (for create/update bodies)
    pub fn to_resource(&self) -> Resource {
        let mut resource = Resource::new(&self.kind, &self.id);

        resource.attributes = self
            .attributes
            .iter()
            .filter(|(key, _)| !self.link_attributes.contains(*key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        for (name, relationship) in &self.relationships {
            let data = match &relationship.targets {
                OneOrMany::One(target) => target.clone().map(OneOrMany::One),
                OneOrMany::Many(targets) => {
                    Some(OneOrMany::Many(targets.iter().flatten().cloned().collect()))
                }
            };

            resource.relationships.insert(
                name.clone(),
                RelationshipEntry {
                    data,
                    links: self.stored_links(name),
                    meta: None,
                },
            );
        }

        for key in &self.link_attributes {
            let Some(name) = key.strip_suffix(LINKS_SUFFIX) else {
                continue;
            };
            if !resource.relationships.contains_key(name) {
                resource.relationships.insert(
                    name.to_string(),
                    RelationshipEntry {
                        data: None,
                        links: self.stored_links(name),
                        meta: None,
                    },
                );
            }
        }

        resource
    }

    fn stored_links(&self, relationship: &str) -> Option<Links> {
        let key = links_attribute(relationship);
        if !self.link_attributes.contains(&key) {
            return None;
        }
        self.attributes.get(&key).and_then(Value::as_object).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::flatten::flatten;
    use serde_json::json;

    fn flat(value: Value) -> FlatRecord {
        flatten(&serde_json::from_value(value).unwrap())
    }

    #[test]
    fn test_update_merges_attributes() {
        let mut record = Record::generic(flat(json!({
            "id": "1", "type": "article", "attributes": { "title": "T", "body": "B" }
        })));

        record.update(flat(json!({
            "id": "1", "type": "article", "attributes": { "title": "T2" }
        })));

        assert_eq!(record.attribute("title"), Some(&json!("T2")));
        assert_eq!(record.attribute("body"), Some(&json!("B")));
        assert_eq!(record.key(), RecordKey::new("article", "1"));
    }

    #[test]
    fn test_assign_ref_replaces_previous() {
        let mut record = Record::generic(flat(json!({ "id": "1", "type": "article" })));
        let person = RecordKey::new("person", "5");

        record.assign_ref("author", OneOrMany::One(Some(person.clone())), "article");
        record.assign_ref("author", OneOrMany::One(None), "article");

        let rel = record.relationship("author").unwrap();
        assert_eq!(rel.targets, OneOrMany::One(None));
        assert_eq!(rel.owner_type, "article");
    }

    #[test]
    fn test_relationship_link_lookup() {
        let record = Record::generic(flat(json!({
            "id": "1",
            "type": "article",
            "relationships": {
                "comments": { "links": { "related": { "href": "/articles/1/comments" } } }
            }
        })));

        let link = record.relationship_link("comments", "related").unwrap();
        assert_eq!(link.href(), "/articles/1/comments");
        assert!(record.relationship_link("comments", "self").is_none());
        assert!(record.relationship_link("author", "related").is_none());
    }

    #[test]
    fn test_relationship_link_without_href() {
        let record = Record::generic(flat(json!({
            "id": "1",
            "type": "article",
            "relationships": {
                "comments": { "links": { "related": { "meta": { "count": 3 } }, "self": null } }
            }
        })));

        assert_eq!(
            record.relationship_links("comments"),
            Some(&json!({ "related": { "meta": { "count": 3 } }, "self": null }))
        );
        assert!(record.relationship_link("comments", "related").is_none());
        assert!(record.relationship_link("comments", "self").is_none());
    }

    #[test]
    fn test_to_resource_strips_link_attributes() {
        let mut record = Record::generic(flat(json!({
            "id": "1",
            "type": "article",
            "attributes": { "title": "T" },
            "relationships": {
                "comments": { "links": { "related": "/articles/1/comments" } }
            }
        })));
        record.assign_ref(
            "tags",
            OneOrMany::Many(vec![Some(RecordKey::new("tag", "1")), None]),
            "article",
        );

        let resource = record.to_resource();
        assert_eq!(resource.attributes.len(), 1);
        assert_eq!(resource.attributes["title"], "T");
        assert_eq!(
            resource.relationships["tags"].data,
            Some(OneOrMany::Many(vec![RecordKey::new("tag", "1")]))
        );
        let comments = &resource.relationships["comments"];
        assert!(comments.data.is_none());
        assert_eq!(
            comments.links.as_ref().unwrap()["related"],
            json!("/articles/1/comments")
        );
    }
}
