//! The filters a user chose and their normalization against the catalog.

use std::collections::BTreeSet;

use dog_catalog::BreedCatalog;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Sort order used when none was requested.
pub const DEFAULT_SORT: &str = "breed:asc";
/// Page size used when none was requested.
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Largest page size the catalog serves.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Filters and paging as requested by the user.
///
/// `breeds` holds the raw tokens, exactly as they were submitted.
/// They are only matched against the catalog by [normalize].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub breeds: Vec<String>,
    /// `field:direction`, e.g. `breed:asc` or `age:desc`
    pub sort: String,
    pub size: u32,
    /// Offset of the first result, `None` for the first page.
    pub from: Option<u32>,
    /// Whether the filter panel should start collapsed.
    pub close: bool,
}

impl Default for FilterSelection {
    fn default() -> Self {
        Self {
            breeds: Vec::new(),
            sort: DEFAULT_SORT.to_string(),
            size: DEFAULT_PAGE_SIZE,
            from: None,
            close: false,
        }
    }
}

impl FilterSelection {
    /// Offset of the first result on the requested page.
    pub fn offset(&self) -> u32 {
        self.from.unwrap_or(0)
    }
}

/// Replace `tokens` by their canonical catalog spelling.
///
/// Matching is case-insensitive. Tokens that don't name a catalog breed are
/// dropped, the catalog may have renamed or removed a breed since the
/// selection was made.
/// The result is free of duplicates and sorted.
pub fn normalize(tokens: &[String], catalog: &BreedCatalog) -> Vec<String> {
    let lookup = catalog.lookup();

    let mut normalized = BTreeSet::new();
    for token in tokens {
        match lookup.get(&token.to_lowercase()) {
            Some(canonical) => {
                normalized.insert(canonical.to_string());
            },
            None => debug!(%token, "ignoring breed that is not in the catalog"),
        }
    }

    normalized.into_iter().collect()
}
