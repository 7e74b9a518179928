//! Request options
//!
//! JSON:API query parameters (`include`, `fields[type]`, `sort`,
//! `filter[...]`) appended to a request URL.

use std::collections::BTreeMap;
use url::form_urlencoded;

/// Per-request query options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub include: Vec<String>,
    pub fields: BTreeMap<String, Vec<String>>,
    pub sort: Vec<String>,
    pub filter: BTreeMap<String, String>,
    /// Extra raw query parameters, appended as-is
    pub params: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Side-load a relationship path (`author`, `comments.author`)
    pub fn include(mut self, path: &str) -> Self {
        self.include.push(path.to_string());
        self
    }

    /// Sparse fieldset for one type
    pub fn fields(mut self, kind: &str, fields: &[&str]) -> Self {
        self.fields
            .insert(kind.to_string(), fields.iter().map(|f| f.to_string()).collect());
        self
    }

    /// Sort key; prefix with `-` for descending
    pub fn sort(mut self, key: &str) -> Self {
        self.sort.push(key.to_string());
        self
    }

    pub fn filter(mut self, key: &str, value: &str) -> Self {
        self.filter.insert(key.to_string(), value.to_string());
        self
    }

    pub fn param(mut self, key: &str, value: &str) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty()
            && self.fields.is_empty()
            && self.sort.is_empty()
            && self.filter.is_empty()
            && self.params.is_empty()
    }

    /// Encoded query string without the leading `?`
    pub fn query_string(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }

        let mut query = form_urlencoded::Serializer::new(String::new());
        if !self.include.is_empty() {
            query.append_pair("include", &self.include.join(","));
        }
        for (kind, fields) in &self.fields {
            query.append_pair(&format!("fields[{}]", kind), &fields.join(","));
        }
        if !self.sort.is_empty() {
            query.append_pair("sort", &self.sort.join(","));
        }
        for (key, value) in &self.filter {
            query.append_pair(&format!("filter[{}]", key), value);
        }
        for (key, value) in &self.params {
            query.append_pair(key, value);
        }

        Some(query.finish())
    }

    /// Append the query string to `url`, respecting an existing query
    pub fn apply(&self, url: &str) -> String {
        match self.query_string() {
            None => url.to_string(),
            Some(query) if url.contains('?') => format!("{}&{}", url, query),
            Some(query) => format!("{}?{}", url, query),
        }
    }
}
