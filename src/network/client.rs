//! JSON:API Client
//!
//! Issues CRUD requests through the transport pipeline and syncs successful
//! responses into a shared store.

use super::http::{base_fetch, Fetch, Headers, HttpFetch, Method};
use super::options::RequestOptions;
use super::response::Envelope;
use crate::config::Config;
use crate::document::Link;
use crate::store::{RecordKey, SharedStore};
use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;

/// Main JSON:API client
#[derive(Clone)]
pub struct JsonApiClient {
    config: Config,
    fetch: Arc<dyn Fetch>,
}

impl JsonApiClient {
    /// Create a client using the default reqwest transport
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self::with_fetch(config, Arc::new(HttpFetch::new()?)))
    }

    /// Create a client with a custom transport
    pub fn with_fetch(config: Config, fetch: Arc<dyn Fetch>) -> Self {
        Self { config, fetch }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Mutable access, to override base URL or headers between requests
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Replace the transport
    pub fn set_fetch(&mut self, fetch: Arc<dyn Fetch>) {
        self.fetch = fetch;
    }

    /// GET a resource or collection
    pub async fn read(
        &self,
        store: &SharedStore,
        url: &str,
        headers: Option<&Headers>,
        options: Option<&RequestOptions>,
    ) -> Envelope {
        self.request(store, Method::Get, url, None, headers, options)
            .await
    }

    /// POST a document
    pub async fn create(
        &self,
        store: &SharedStore,
        url: &str,
        data: Option<&Value>,
        headers: Option<&Headers>,
        options: Option<&RequestOptions>,
    ) -> Envelope {
        self.request(store, Method::Post, url, data, headers, options)
            .await
    }

    /// PATCH a document
    pub async fn update(
        &self,
        store: &SharedStore,
        url: &str,
        data: Option<&Value>,
        headers: Option<&Headers>,
        options: Option<&RequestOptions>,
    ) -> Envelope {
        self.request(store, Method::Patch, url, data, headers, options)
            .await
    }

    /// DELETE a resource
    pub async fn remove(
        &self,
        store: &SharedStore,
        url: &str,
        headers: Option<&Headers>,
        options: Option<&RequestOptions>,
    ) -> Envelope {
        self.request(store, Method::Delete, url, None, headers, options)
            .await
    }

    /// Follow a link. A missing (or empty) link resolves to an empty
    /// envelope without any request.
    pub async fn fetch_link(
        &self,
        link: Option<&Link>,
        store: &SharedStore,
        headers: Option<&Headers>,
        options: Option<&RequestOptions>,
    ) -> Envelope {
        match link.map(Link::href).filter(|href| !href.is_empty()) {
            Some(href) => self.read(store, href, headers, options).await,
            None => Envelope::empty(),
        }
    }

    /// Follow a top-level link of a previous response (`next`, `related`...)
    /// with the headers that response was requested with
    pub async fn follow(&self, envelope: &Envelope, name: &str, store: &SharedStore) -> Envelope {
        let headers = (!envelope.request_headers.is_empty()).then_some(&envelope.request_headers);
        self.fetch_link(envelope.link(name).as_ref(), store, headers, None)
            .await
    }

    /// Fetch a relationship through the links stored on a record
    /// (`<relationship>Links`), e.g. `related`
    pub async fn fetch_relationship_link(
        &self,
        store: &SharedStore,
        key: &RecordKey,
        relationship: &str,
        link_name: &str,
        headers: Option<&Headers>,
        options: Option<&RequestOptions>,
    ) -> Envelope {
        let link = {
            let store = store.lock().await;
            store
                .get(key)
                .and_then(|record| record.relationship_link(relationship, link_name))
        };

        if link.is_none() {
            tracing::debug!(
                "{}:{} has no '{}' link for '{}'",
                key.kind,
                key.id,
                link_name,
                relationship
            );
        }

        self.fetch_link(link.as_ref(), store, headers, options)
            .await
    }

    async fn request(
        &self,
        store: &SharedStore,
        method: Method,
        url: &str,
        data: Option<&Value>,
        headers: Option<&Headers>,
        options: Option<&RequestOptions>,
    ) -> Envelope {
        let mut url = self.config.prefix_url(url);
        if let Some(options) = options {
            url = options.apply(&url);
        }

        let raw = base_fetch(
            self.fetch.as_ref(),
            &self.config.default_headers,
            method,
            &url,
            data,
            headers,
        )
        .await;

        // The store is only locked for the synchronous sync pass
        let mut store = store.lock().await;
        Envelope::from_raw(raw, &mut store)
    }
}
