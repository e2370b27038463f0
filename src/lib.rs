//! Client transport core for the Nimbus REST API.
//!
//! This crate is the shared foundation the resource-specific Nimbus
//! bindings call into. It provides:
//!
//! - [`NimbusClient`] - an authenticated HTTP transport shared by many
//!   concurrent callers, with JSON encode/decode and typed HTTP failures
//! - a sliding-window [`RateLimiter`] consulted before every outbound
//!   request (default: 800 requests per rolling minute)
//! - generic offset/limit pagination via [`NimbusClient::list_all`]
//! - a single-flight [`Memoized`] resolver, used for the organization
//!   identity and available for any fallible lookup
//!
//! # Example
//!
//! ```no_run
//! use nimbus_api::{ClientConfig, NimbusClient};
//!
//! # #[derive(serde::Deserialize)] struct Product { name: String }
//! # async fn example() -> nimbus_api::Result<()> {
//! let client = NimbusClient::new(ClientConfig::new("api-key", "api-secret"))?;
//!
//! let org = client.organization_id().await?;
//! let products: Vec<Product> = client
//!     .list_all(&format!("v1/organizations/{org}/products"), &[])
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! Requests that fail with a non-2xx status surface as
//! [`Error::Http`] carrying an [`HttpFailure`]:
//!
//! ```no_run
//! # async fn example(client: nimbus_api::NimbusClient) {
//! match client.get::<serde_json::Value>("v1/products/unknown").await {
//!     Err(err) if err.is_not_found() => { /* create it */ }
//!     other => { /* handle */ let _ = other; }
//! }
//! # }
//! ```

mod client;
mod config;
mod error;
mod limit;
mod memo;
mod paginate;

pub use client::NimbusClient;
pub use config::{
    ClientConfig, Credentials, DEFAULT_BASE_ENDPOINT, DEFAULT_MAX_REQUESTS, DEFAULT_PAGE_SIZE,
    DEFAULT_WINDOW,
};
pub use error::{Error, HttpFailure, Result};
pub use limit::RateLimiter;
pub use memo::Memoized;
