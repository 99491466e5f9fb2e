//! HTTP client for the dog catalog service.
//!
//! This crate provides:
//! - HTTP client construction with session cookie forwarding
//! - The three catalog calls the search pipeline is built from
//!   (breed catalog, filtered search, bulk hydration) and the login call
//! - Common error handling for catalog API operations
//! - Mock server recording/replay for integration testing
//!
//! ## Usage
//!
//! ```ignore
//! use dog_catalog::{CatalogClient, CatalogClientConfig, ClientTrait, Session};
//!
//! let config = CatalogClientConfig::new("https://dogs.example.com");
//! let client = CatalogClient::new(config)?;
//! let session = client.login("Mike", "mike@email.com").await?;
//! let breeds = client.breeds(&session).await?;
//! ```

mod client;
mod config;
mod error;
pub(crate) mod mock;
pub mod types;

pub use client::{CatalogClient, ClientTrait};
pub use config::{CatalogClientConfig, CatalogEndpoints, CatalogMockMode};
pub use error::{CatalogClientError, Endpoint};
pub use reqwest::StatusCode;
pub use types::{
    BreedCatalog,
    CURSOR_PREFIX_LEN,
    DogRecord,
    SearchPage,
    Session,
    strip_cursor_prefix,
};
