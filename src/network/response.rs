//! Response Envelope
//!
//! Wraps the outcome of one request: the synced primary data (as record
//! keys into the store) plus status, headers and document-level
//! meta/links/errors.

use super::http::{Headers, RawResult};
use crate::document::{link_named, Document, ErrorObject, Link, Links, OneOrMany};
use crate::error::TransportError;
use crate::store::{Record, Store, SyncResult};
use serde_json::Value;

/// Result of a request, consumed by the caller
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    /// Keys of the primary records; `None` on error or when `data` is null
    pub data: SyncResult,
    pub status: Option<u16>,
    pub headers: Headers,
    pub request_headers: Headers,
    pub error: Option<TransportError>,
    /// Parsed response body, kept for diagnostics even on error
    pub body: Option<Value>,
    pub meta: Option<Value>,
    pub links: Links,
    pub jsonapi: Option<Value>,
    pub errors: Vec<ErrorObject>,
}

impl Envelope {
    /// Envelope for a request that was never made (null link)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the envelope for a pipeline result, syncing its document into
    /// `store` when the request succeeded
    pub fn from_raw(raw: RawResult, store: &mut Store) -> Self {
        let mut envelope = Self {
            status: raw.status,
            headers: raw.headers,
            request_headers: raw.request_headers,
            error: raw.error,
            ..Self::default()
        };

        let document = match raw.body.as_ref() {
            None | Some(Value::Null) => None,
            Some(body) => match Document::from_value(body.clone()) {
                Ok(document) => Some(document),
                Err(e) => {
                    tracing::warn!("response body is not a JSON:API document: {}", e);
                    if envelope.error.is_none() {
                        envelope.error = Some(e.into());
                    }
                    None
                }
            },
        };
        envelope.body = raw.body;

        let Some(document) = document else {
            return envelope;
        };

        envelope.meta = document.meta.clone();
        envelope.links = document.links.clone();
        envelope.jsonapi = document.jsonapi.clone();
        envelope.errors = document.errors.clone();

        if envelope.error.is_none() && !document.errors.is_empty() {
            envelope.error = Some(TransportError::Document(document.errors.clone()));
        }

        if envelope.error.is_none() {
            envelope.data = store.sync(&document);
        }

        envelope
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// A top-level document link (`self`, `next`, ...). `None` when absent,
    /// `null` or without an `href`.
    pub fn link(&self, name: &str) -> Option<Link> {
        link_named(&self.links, name)
    }

    /// Resolve the primary data against `store`
    pub fn records<'a>(&self, store: &'a Store) -> Option<OneOrMany<Option<&'a Record>>> {
        self.data.as_ref().map(|keys| store.lookup(keys))
    }

    /// The single primary record, for responses whose `data` is an object
    pub fn record<'a>(&self, store: &'a Store) -> Option<&'a Record> {
        let key = self.data.as_ref()?.as_one()?;
        store.get(key)
    }
}
