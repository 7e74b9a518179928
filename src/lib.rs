//! # jsonapi-store
//!
//! Client-side normalization for JSON:API responses. Documents are merged
//! into a [`Store`] of canonical records keyed by `(type, id)`, with
//! relationships wired between them, including references to records that
//! appear later in the same document.
//!
//! - [`document`] - Wire format
//! - [`store`] - Records, type registry, two-pass sync
//! - [`network`] - Request pipeline and response envelope
//! - [`config`] - Base URL, default headers, registered types

pub mod config;
pub mod document;
pub mod error;
pub mod network;
pub mod store;

pub use config::Config;
pub use document::{Document, Link, OneOrMany, Resource, ResourceIdentifier};
pub use error::TransportError;
pub use network::{Envelope, Fetch, JsonApiClient, RequestOptions};
pub use store::{Record, RecordKey, SharedStore, Store, TypeDescriptor, TypeRegistry};
