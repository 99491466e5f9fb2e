//! Configuration types for catalog client construction.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for catalog client construction.
#[derive(Debug, Clone)]
pub struct CatalogClientConfig {
    /// Base URL for the catalog API.
    pub catalog_url: String,
    /// Paths of the individual catalog operations, relative to `catalog_url`.
    pub endpoints: CatalogEndpoints,
    /// Additional headers to include in requests.
    pub extra_headers: BTreeMap<String, String>,
    /// Custom user agent, reqwest's default is used if unset.
    pub user_agent: Option<String>,
    pub connect_timeout: Duration,
    /// Timeout for a whole request, including reading the body.
    pub timeout: Duration,
    /// Mock mode for testing.
    pub mock_mode: CatalogMockMode,
}

impl CatalogClientConfig {
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Config for `catalog_url` with default endpoints and timeouts.
    pub fn new(catalog_url: impl Into<String>) -> Self {
        Self {
            catalog_url: catalog_url.into(),
            endpoints: CatalogEndpoints::default(),
            extra_headers: BTreeMap::new(),
            user_agent: None,
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
            timeout: Self::DEFAULT_TIMEOUT,
            mock_mode: CatalogMockMode::None,
        }
    }
}

/// Paths of the catalog operations.
///
/// The defaults match the deployed service. Note that the search cursors
/// returned by the service are prefixed with the `/dogs` mount point, see
/// [crate::CURSOR_PREFIX_LEN].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogEndpoints {
    pub breeds: String,
    pub search: String,
    pub hydrate: String,
    pub login: String,
}

impl Default for CatalogEndpoints {
    fn default() -> Self {
        Self {
            breeds: "/dogs/breeds".to_string(),
            search: "/dogs/search".to_string(),
            hydrate: "/dogs".to_string(),
            login: "/auth/login".to_string(),
        }
    }
}

/// Mock recording/replay mode for integration testing.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub enum CatalogMockMode {
    /// Use a real server without any mock recording or replaying.
    #[default]
    None,
    /// Proxy via a mock server and record interactions to a path.
    Record(PathBuf),
    /// Replay interactions from a path using a mock server.
    Replay(PathBuf),
}
