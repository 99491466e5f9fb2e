//! Canonical search query strings and breed form-field tokens.
//!
//! Both directions are pure: the same inputs always yield the same string.

use std::collections::BTreeSet;

use url::form_urlencoded::Serializer;

use crate::models::filter::{DEFAULT_PAGE_SIZE, DEFAULT_SORT};

/// Name of the submit button in the filter form.
///
/// It is submitted alongside the breed fields and never names a breed.
pub const INTENT_FIELD: &str = "intent";

/// Field names can't contain spaces, breeds in the filter form use this
/// instead.
const FIELD_TOKEN_SEPARATOR: char = '_';

/// Build the canonical query string for a search.
///
/// - `sort` defaults to [DEFAULT_SORT] if absent or empty
/// - `size` defaults to [DEFAULT_PAGE_SIZE]
/// - `from` is only included if it is not `0`
/// - every breed contributes its own `breeds=<name>` pair
///
/// Breeds are sorted and deduplicated, so the order of `breeds` doesn't
/// change the result.
pub fn encode_for_search(
    sort: Option<&str>,
    size: Option<u32>,
    from: Option<u32>,
    breeds: &[String],
) -> String {
    let sort = sort.filter(|sort| !sort.is_empty()).unwrap_or(DEFAULT_SORT);
    let size = size.unwrap_or(DEFAULT_PAGE_SIZE);

    let mut query = Serializer::new(String::new());
    query.append_pair("sort", sort);
    query.append_pair("size", &size.to_string());
    if let Some(from) = from.filter(|from| *from != 0) {
        query.append_pair("from", &from.to_string());
    }
    for breed in breeds.iter().collect::<BTreeSet<_>>() {
        query.append_pair("breeds", breed);
    }
    query.finish()
}

/// Build the query string for a submitted filter form.
///
/// `fields` are the names of the submitted form fields.
/// The [INTENT_FIELD] is skipped, all other fields are decoded into breed
/// names with [decode_field_token].
/// Breeds keep the order they were submitted in, repeated breeds are dropped.
pub fn encode_for_submission<'a>(fields: impl IntoIterator<Item = &'a str>) -> String {
    let mut seen = BTreeSet::new();
    let mut query = Serializer::new(String::new());
    for field in fields {
        if field == INTENT_FIELD {
            continue;
        }
        let breed = decode_field_token(field);
        if seen.insert(breed.clone()) {
            query.append_pair("breeds", &breed);
        }
    }
    query.finish()
}

/// The form-field name for a breed, e.g. `Cairn_Terrier`.
pub fn encode_field_token(breed: &str) -> String {
    breed.replace(' ', &FIELD_TOKEN_SEPARATOR.to_string())
}

/// The breed named by a form field, e.g. `Cairn Terrier`.
pub fn decode_field_token(token: &str) -> String {
    token.replace(FIELD_TOKEN_SEPARATOR, " ")
}
