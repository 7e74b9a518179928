//! Network module
//!
//! Request pipeline and response handling for JSON:API servers.
//!
//! # Module Structure
//!
//! - [`client`] - CRUD calls, link following, store syncing
//! - [`http`] - Transport trait, reqwest implementation, status classification
//! - [`options`] - Query parameters (`include`, `fields`, `sort`, `filter`)
//! - [`response`] - Response envelope
//!
//! # Example
//!
//! ```ignore
//! use jsonapi_store::{Config, JsonApiClient, Store};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let client = JsonApiClient::new(Config::load())?;
//!     let store = Store::new().shared();
//!     let response = client.read(&store, "articles/1", None, None).await;
//!     if let Some(error) = &response.error {
//!         eprintln!("{}", error);
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod http;
pub mod options;
pub mod response;

pub use client::JsonApiClient;
pub use http::{Fetch, FetchRequest, Headers, HttpFetch, Method, RawResponse, RawResult};
pub use options::RequestOptions;
pub use response::Envelope;
