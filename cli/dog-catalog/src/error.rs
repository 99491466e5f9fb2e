//! Error handling for catalog API operations.

use derive_more::Display;
use reqwest::StatusCode;
use thiserror::Error;

/// The catalog operation a request was made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Endpoint {
    #[display("breeds")]
    Breeds,
    #[display("search")]
    Search,
    #[display("hydrate")]
    Hydrate,
    #[display("login")]
    Login,
}

/// Common error type for catalog API operations.
///
/// Operation specific errors of the search pipeline wrap this type.
#[derive(Debug, Error)]
pub enum CatalogClientError {
    /// The service answered with a non-success status.
    #[error("catalog {endpoint} request failed: {status}")]
    Status {
        endpoint: Endpoint,
        status: StatusCode,
    },
    /// The request could not be sent or the response could not be read.
    #[error("catalog {endpoint} request could not be completed")]
    Transport {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },
    /// The service answered with a body that doesn't match the expected schema.
    #[error("invalid response to catalog {endpoint} request")]
    Decode {
        endpoint: Endpoint,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid catalog url '{url}'")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("{}", .0)]
    Other(String),
}

impl CatalogClientError {
    /// The HTTP status of the failed response, if one was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            CatalogClientError::Status { status, .. } => Some(*status),
            CatalogClientError::Transport { source, .. } => source.status(),
            _ => None,
        }
    }

    /// The operation that failed, if the error is tied to a request.
    pub fn endpoint(&self) -> Option<Endpoint> {
        match self {
            CatalogClientError::Status { endpoint, .. }
            | CatalogClientError::Transport { endpoint, .. }
            | CatalogClientError::Decode { endpoint, .. } => Some(*endpoint),
            _ => None,
        }
    }
}
