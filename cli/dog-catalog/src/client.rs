//! Catalog client for the dog service.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::str::FromStr;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::CatalogClientConfig;
use crate::error::{CatalogClientError, Endpoint};
use crate::mock::MockGuard;
use crate::types::*;

/// A client for the catalog service.
///
/// This is a wrapper around a [reqwest::Client] that handles:
/// - HTTP client configuration with timeouts and default headers
/// - Forwarding the session cookie on every request
/// - Mock server recording/replay for testing
pub struct CatalogClient {
    http: reqwest::Client,
    /// The url requests are sent to, which is the mock server if one is used.
    effective_url: String,
    config: CatalogClientConfig,

    _mock_guard: Option<MockGuard>,
}

impl Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("catalog_url", &self.config.catalog_url)
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    /// Create a new catalog client from configuration.
    pub fn new(config: CatalogClientConfig) -> Result<Self, CatalogClientError> {
        Url::parse(&config.catalog_url).map_err(|source| CatalogClientError::InvalidUrl {
            url: config.catalog_url.clone(),
            source,
        })?;

        // create a mock server if configured
        let mock_guard = MockGuard::new(&config);
        let effective_url = match mock_guard {
            Some(ref mock) => mock.url(),
            None => config.catalog_url.clone(),
        };

        let http = build_http_client(&config)?;

        Ok(Self {
            http,
            effective_url,
            config,
            _mock_guard: mock_guard,
        })
    }

    fn endpoint_url(&self, path: &str) -> Result<Url, CatalogClientError> {
        let url = format!("{}{}", self.effective_url.trim_end_matches('/'), path);
        Url::parse(&url).map_err(|source| CatalogClientError::InvalidUrl { url, source })
    }

    /// Start a request, attaching the session cookie if there is one.
    fn request(
        &self,
        method: Method,
        url: Url,
        session: &Session,
    ) -> Result<RequestBuilder, CatalogClientError> {
        let request = self.http.request(method, url);
        let Some(cookie) = session.cookie() else {
            return Ok(request);
        };

        let mut value = HeaderValue::from_str(cookie)
            .map_err(|e| CatalogClientError::Other(format!("invalid session cookie: {e}")))?;
        value.set_sensitive(true);
        Ok(request.header(header::COOKIE, value))
    }
}

// ---------------------------------------------------------------------------
// Catalog trait
// ---------------------------------------------------------------------------

/// The catalog API interface the search pipeline is built from.
///
/// This trait enables alternate implementations:
/// - **HTTP**: REST calls to the catalog service via [`CatalogClient`]
/// - **Stub** (SDK tests): canned or never-completing responses without HTTP
#[allow(async_fn_in_trait)]
pub trait ClientTrait {
    /// Fetch the list of valid breed names.
    async fn breeds(&self, session: &Session) -> Result<BreedCatalog, CatalogClientError>;

    /// Run a filtered search.
    ///
    /// `query` is a canonical, already encoded query string.
    /// Cursors of the returned page have their transport prefix removed.
    async fn search(
        &self,
        query: &str,
        session: &Session,
    ) -> Result<SearchPage, CatalogClientError>;

    /// Fetch the full records for `ids`, in the order of `ids`.
    ///
    /// An empty `ids` list returns no records without contacting the service.
    async fn hydrate(
        &self,
        ids: &[String],
        session: &Session,
    ) -> Result<Vec<DogRecord>, CatalogClientError>;

    /// Log in and return the session the service handed out.
    async fn login(&self, name: &str, email: &str) -> Result<Session, CatalogClientError>;
}

// ---------------------------------------------------------------------------
// ClientTrait implementation for CatalogClient
// ---------------------------------------------------------------------------

impl ClientTrait for CatalogClient {
    #[instrument(skip_all)]
    async fn breeds(&self, session: &Session) -> Result<BreedCatalog, CatalogClientError> {
        let url = self.endpoint_url(&self.config.endpoints.breeds)?;
        let request = self.request(Method::GET, url, session)?;

        let response = send(Endpoint::Breeds, request).await?;
        let catalog: BreedCatalog = decode(Endpoint::Breeds, response).await?;

        debug!(n_breeds = catalog.len(), "received breed catalog");
        Ok(catalog)
    }

    #[instrument(skip_all, fields(query = %query))]
    async fn search(
        &self,
        query: &str,
        session: &Session,
    ) -> Result<SearchPage, CatalogClientError> {
        let mut url = self.endpoint_url(&self.config.endpoints.search)?;
        if !query.is_empty() {
            url.set_query(Some(query));
        }
        debug!(%url, "sending search request");
        let request = self.request(Method::GET, url, session)?;

        let response = send(Endpoint::Search, request).await?;
        let page: SearchPage = decode::<SearchResponse>(Endpoint::Search, response)
            .await?
            .into();

        debug!(
            total = page.total,
            n_results = page.result_ids.len(),
            has_next = page.next.is_some(),
            has_prev = page.prev.is_some(),
            "received search page"
        );
        Ok(page)
    }

    #[instrument(skip_all, fields(n_ids = ids.len()))]
    async fn hydrate(
        &self,
        ids: &[String],
        session: &Session,
    ) -> Result<Vec<DogRecord>, CatalogClientError> {
        // The service rejects empty id lists.
        if ids.is_empty() {
            debug!("no ids to hydrate, skipping request");
            return Ok(Vec::new());
        }

        let url = self.endpoint_url(&self.config.endpoints.hydrate)?;
        let request = self.request(Method::POST, url, session)?.json(ids);

        let response = send(Endpoint::Hydrate, request).await?;
        let records: Vec<DogRecord> = decode(Endpoint::Hydrate, response).await?;

        Ok(order_by_ids(ids, records))
    }

    #[instrument(skip_all)]
    async fn login(&self, name: &str, email: &str) -> Result<Session, CatalogClientError> {
        let url = self.endpoint_url(&self.config.endpoints.login)?;
        let request = self
            .request(Method::POST, url, &Session::anonymous())?
            .json(&LoginRequest { name, email });

        let response = send(Endpoint::Login, request).await?;
        let session = Session::from_set_cookie(
            response
                .headers()
                .get_all(header::SET_COOKIE)
                .iter()
                .filter_map(|value| value.to_str().ok()),
        );

        if session.is_anonymous() {
            return Err(CatalogClientError::Other(
                "login succeeded but no session cookie was set".to_string(),
            ));
        }

        debug!("logged in");
        Ok(session)
    }
}

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

/// Send a request and turn non-success statuses into errors.
async fn send(endpoint: Endpoint, request: RequestBuilder) -> Result<Response, CatalogClientError> {
    let response = request
        .send()
        .await
        .map_err(|source| CatalogClientError::Transport { endpoint, source })?;

    let status = response.status();
    if !status.is_success() {
        debug!(%endpoint, %status, "catalog request failed");
        return Err(CatalogClientError::Status { endpoint, status });
    }

    Ok(response)
}

/// Read the body of a successful response as JSON.
async fn decode<T: DeserializeOwned>(
    endpoint: Endpoint,
    response: Response,
) -> Result<T, CatalogClientError> {
    let body = response
        .bytes()
        .await
        .map_err(|source| CatalogClientError::Transport { endpoint, source })?;

    serde_json::from_slice(&body).map_err(|source| CatalogClientError::Decode { endpoint, source })
}

/// Arrange `records` in the order of `ids`.
///
/// The service is not documented to preserve the order of the request.
/// Records for ids that weren't requested are dropped,
/// ids without a record are skipped.
/// An id requested more than once gets a copy of its record at each position.
fn order_by_ids(ids: &[String], records: Vec<DogRecord>) -> Vec<DogRecord> {
    let n_received = records.len();
    let by_id = records
        .into_iter()
        .map(|record| (record.id.clone(), record))
        .collect::<HashMap<_, _>>();

    let ordered = ids
        .iter()
        .filter_map(|id| by_id.get(id).cloned())
        .collect::<Vec<_>>();

    if ordered.len() != ids.len() {
        warn!(
            n_requested = ids.len(),
            n_received, "catalog did not return a record for every id"
        );
    }

    let requested = ids.iter().collect::<HashSet<_>>();
    let n_unexpected = by_id.keys().filter(|id| !requested.contains(id)).count();
    if n_unexpected > 0 {
        warn!(
            n_unexpected,
            "dropping records for ids that were not requested"
        );
    }

    ordered
}

// ---------------------------------------------------------------------------
// HTTP client builder
// ---------------------------------------------------------------------------

/// Build the HTTP client with default headers for the catalog API.
fn build_http_client(config: &CatalogClientConfig) -> Result<reqwest::Client, CatalogClientError> {
    let mut headers = HeaderMap::new();

    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );

    // Extra headers (deployment specific routing, tracing, etc.)
    for (key, value) in &config.extra_headers {
        headers.insert(
            header::HeaderName::from_str(key).map_err(
                |e: reqwest::header::InvalidHeaderName| CatalogClientError::Other(e.to_string()),
            )?,
            header::HeaderValue::from_str(value).map_err(
                |e: reqwest::header::InvalidHeaderValue| CatalogClientError::Other(e.to_string()),
            )?,
        );
    }

    debug!(
        catalog_url = %config.catalog_url,
        extra_headers = config.extra_headers.len(),
        "building catalog HTTP client"
    );

    let client_builder = reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(config.connect_timeout)
        .timeout(config.timeout);

    let client_builder = if let Some(ref user_agent) = config.user_agent {
        client_builder.user_agent(user_agent)
    } else {
        client_builder
    };

    client_builder
        .build()
        .map_err(|e| CatalogClientError::Other(e.to_string()))
}
