//! Catalog interaction types.
//!
//! These types represent the domain model for catalog operations.
//! Wire representations that differ from the domain model are kept private
//! to this module and converted on the way in.

use std::collections::HashMap;
use std::fmt::Debug;

use derive_more::{Deref, From};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Opaque credential forwarded verbatim as `Cookie` header on every call.
///
/// Obtained from [crate::ClientTrait::login] or from configuration.
/// The value is never inspected, only passed through.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session(Option<String>);

impl Session {
    /// A session carrying the given `Cookie` header value.
    ///
    /// An empty value is treated as no session.
    pub fn new(cookie: impl Into<String>) -> Self {
        let cookie = cookie.into();
        if cookie.trim().is_empty() {
            return Self::anonymous();
        }
        Self(Some(cookie))
    }

    /// A session that sends no credential.
    pub fn anonymous() -> Self {
        Self(None)
    }

    /// Build a session from the `Set-Cookie` header values of a response.
    ///
    /// Only the `name=value` pair of each cookie is kept, attributes such as
    /// `Path` or `Expires` are dropped.
    pub fn from_set_cookie<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let pairs = values
            .into_iter()
            .filter_map(|value| value.split(';').next())
            .map(str::trim)
            .filter(|pair| !pair.is_empty())
            .collect::<Vec<_>>();
        Self::new(pairs.join("; "))
    }

    /// The `Cookie` header value, if any.
    pub fn cookie(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_anonymous(&self) -> bool {
        self.0.is_none()
    }
}

impl Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(_) => write!(f, "Session(<redacted>)"),
            None => write!(f, "Session(anonymous)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Breeds
// ---------------------------------------------------------------------------

/// Canonical breed names, in the order the catalog returned them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, From, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BreedCatalog(Vec<String>);

impl BreedCatalog {
    /// Map of lowercase breed name to canonical breed name.
    ///
    /// If two entries differ only in case, the later one wins.
    pub fn lookup(&self) -> HashMap<String, &str> {
        self.0
            .iter()
            .map(|breed| (breed.to_lowercase(), breed.as_str()))
            .collect()
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Length of the transport prefix the service puts in front of cursors.
///
/// Cursors are returned relative to the service root (`/dogs/search?...`),
/// stripping the mount point yields a path relative to the search page.
pub const CURSOR_PREFIX_LEN: usize = 5;

/// Strip the transport prefix from a pagination cursor.
///
/// Returns `None` if nothing would remain of the cursor,
/// which is treated the same as an absent cursor.
pub fn strip_cursor_prefix(cursor: &str) -> Option<&str> {
    let (offset, _) = cursor.char_indices().nth(CURSOR_PREFIX_LEN)?;
    Some(&cursor[offset..])
}

/// Search response as sent by the service.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SearchResponse {
    total: u64,
    #[serde(rename = "resultIds", default)]
    result_ids: Vec<String>,
    next: Option<String>,
    prev: Option<String>,
}

/// One page of search results.
///
/// Cursors are stored with the transport prefix already removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPage {
    /// Number of matches across all pages.
    pub total: u64,
    /// Identifiers of the dogs on this page, in result order.
    pub result_ids: Vec<String>,
    pub next: Option<String>,
    pub prev: Option<String>,
}

impl From<SearchResponse> for SearchPage {
    fn from(response: SearchResponse) -> Self {
        Self {
            total: response.total,
            result_ids: response.result_ids,
            next: response
                .next
                .as_deref()
                .and_then(strip_cursor_prefix)
                .map(ToString::to_string),
            prev: response
                .prev
                .as_deref()
                .and_then(strip_cursor_prefix)
                .map(ToString::to_string),
        }
    }
}

// ---------------------------------------------------------------------------
// Hydration
// ---------------------------------------------------------------------------

/// A fully hydrated dog record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DogRecord {
    pub id: String,
    /// URL of a picture of the dog.
    pub img: String,
    pub name: String,
    pub age: u32,
    pub zip_code: String,
    pub breed: String,
}

/// Body of the login request.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
}
