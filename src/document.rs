//! Wire format
//!
//! Serde model of the JSON:API document subset the store understands.
//! These types are immutable input: the store never mutates a parsed
//! document, it only reads from it.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Links object (`self`, `related`, `next`...), kept exactly as received.
///
/// Members are parsed into a [`Link`] only when read back, so link objects
/// carrying extra members (or no `href`) never fail a document.
pub type Links = Map<String, Value>;

/// Either a single item or a sequence of items.
///
/// Used for primary `data`, relationship `data` and sync results, so the
/// shape of the input (object vs array) is carried through to the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    /// Iterate over the contained item(s) in order
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        match self {
            OneOrMany::One(item) => std::slice::from_ref(item).iter(),
            OneOrMany::Many(items) => items.iter(),
        }
    }

    /// Transform every item while keeping the shape
    pub fn map<U, F: FnMut(T) -> U>(self, mut f: F) -> OneOrMany<U> {
        match self {
            OneOrMany::One(item) => OneOrMany::One(f(item)),
            OneOrMany::Many(items) => OneOrMany::Many(items.into_iter().map(f).collect()),
        }
    }

    /// Borrowing variant of [`OneOrMany::map`]
    pub fn map_ref<U, F: FnMut(&T) -> U>(&self, mut f: F) -> OneOrMany<U> {
        match self {
            OneOrMany::One(item) => OneOrMany::One(f(item)),
            OneOrMany::Many(items) => OneOrMany::Many(items.iter().map(f).collect()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            OneOrMany::One(_) => 1,
            OneOrMany::Many(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_many(&self) -> bool {
        matches!(self, OneOrMany::Many(_))
    }

    /// The single item, if this is a `One`
    pub fn as_one(&self) -> Option<&T> {
        match self {
            OneOrMany::One(item) => Some(item),
            OneOrMany::Many(_) => None,
        }
    }

    /// The items, if this is a `Many`
    pub fn as_many(&self) -> Option<&[T]> {
        match self {
            OneOrMany::One(_) => None,
            OneOrMany::Many(items) => Some(items),
        }
    }
}

/// A link is either a bare URL or an object with an `href`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Link {
    Url(String),
    Object {
        href: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        meta: Option<Value>,
    },
}

impl Link {
    /// URL this link points to
    pub fn href(&self) -> &str {
        match self {
            Link::Url(url) => url,
            Link::Object { href, .. } => href,
        }
    }

    /// Read a link back out of a JSON value. `null` and objects without a
    /// string `href` give `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(url) => Some(Link::Url(url.clone())),
            Value::Object(map) => {
                let href = map.get("href")?.as_str()?.to_string();
                Some(Link::Object {
                    href,
                    meta: map.get("meta").cloned(),
                })
            }
            _ => None,
        }
    }
}

/// Look up a named member of a links object as a followable [`Link`]
pub fn link_named(links: &Links, name: &str) -> Option<Link> {
    links.get(name).and_then(Link::from_value)
}

/// `{ "type": ..., "id": ... }` reference to another resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
}

impl ResourceIdentifier {
    pub fn new(kind: &str, id: &str) -> Self {
        Self {
            kind: kind.to_string(),
            id: id.to_string(),
        }
    }
}

/// One entry of a resource's `relationships` object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipEntry {
    /// Linkage; `None` both when absent and when `null`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<OneOrMany<ResourceIdentifier>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// A resource object as it appears in `data` or `included`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub relationships: BTreeMap<String, RelationshipEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl Resource {
    pub fn new(kind: &str, id: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: kind.to_string(),
            attributes: Map::new(),
            relationships: BTreeMap::new(),
            links: None,
            meta: None,
        }
    }

    pub fn identifier(&self) -> ResourceIdentifier {
        ResourceIdentifier::new(&self.kind, &self.id)
    }
}

/// JSON:API error object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_id", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_id", skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Top-level JSON:API document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub data: Option<OneOrMany<Resource>>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub included: Vec<Resource>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Map::is_empty")]
    pub links: Links,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonapi: Option<Value>,
}

impl Document {
    /// Document wrapping a single primary resource (request bodies)
    pub fn from_resource(resource: Resource) -> Self {
        Self {
            data: Some(OneOrMany::One(resource)),
            ..Self::default()
        }
    }

    /// Parse a document from an already-decoded JSON value
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Str(String),
    Num(serde_json::Number),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Str(id) => id,
            RawId::Num(id) => id.to_string(),
        }
    }
}

/// Accept ids sent as numbers as well as strings
fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(RawId::deserialize(deserializer)?.into_string())
}

/// Same as `deserialize_id`, for optional members such as error `status`
fn deserialize_optional_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<RawId>::deserialize(deserializer)?.map(RawId::into_string))
}

/// Treat an explicit `null` like an absent member
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
