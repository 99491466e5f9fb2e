//! Parsing the query string of a search page request.

use tracing::warn;
use url::form_urlencoded;

use crate::models::filter::{DEFAULT_PAGE_SIZE, FilterSelection, MAX_PAGE_SIZE};

/// Parse a search query string into a [FilterSelection].
///
/// `input` may be a bare query string (`size=10&breeds=Pug`) or a path with
/// a query (`/search?size=10`), so that pagination cursors can be passed
/// in as they are.
///
/// Breeds can be given as repeated `breeds=<name>` or as indexed
/// `breeds[<n>]=<name>` parameters. Both are accepted, indexed ones come first.
/// Values are url-decoded.
///
/// Invalid `size` and `from` values are replaced by their defaults,
/// `size` is clamped to `1..=`[MAX_PAGE_SIZE].
pub fn parse_search_params(input: &str) -> FilterSelection {
    let query = match input.split_once('?') {
        Some((_path, query)) => query,
        None if input.starts_with('/') => "",
        None => input,
    };

    let mut selection = FilterSelection::default();
    let mut sort = None;
    let mut size = None;
    let mut from = None;
    let mut close = None;
    let mut indexed_breeds = Vec::new();
    let mut breeds = Vec::new();

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match &*key {
            // first occurrence wins for the scalar parameters
            "sort" => {
                sort.get_or_insert(value.into_owned());
            },
            "size" => {
                size.get_or_insert(value.into_owned());
            },
            "from" => {
                from.get_or_insert(value.into_owned());
            },
            "close" => {
                close.get_or_insert(value.into_owned());
            },
            "breeds" => breeds.push(value.into_owned()),
            key if is_indexed_breeds_key(key) => indexed_breeds.push(value.into_owned()),
            _ => {},
        }
    }

    if let Some(sort) = sort.filter(|sort| !sort.is_empty()) {
        selection.sort = sort;
    }
    if let Some(size) = size {
        selection.size = parse_size(&size);
    }
    if let Some(from) = from {
        selection.from = parse_from(&from);
    }
    selection.close = close.is_some_and(|close| !close.is_empty());

    indexed_breeds.extend(breeds);
    selection.breeds = indexed_breeds;

    selection
}

/// Whether `key` is of the form `breeds[<digits>]`.
fn is_indexed_breeds_key(key: &str) -> bool {
    key.strip_prefix("breeds[")
        .and_then(|rest| rest.strip_suffix(']'))
        .is_some_and(|index| !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()))
}

fn parse_size(raw: &str) -> u32 {
    match raw.trim().parse::<i64>() {
        Ok(size) if size >= 0 => size.clamp(1, MAX_PAGE_SIZE as i64) as u32,
        _ => {
            warn!(size = raw, "invalid page size, using {DEFAULT_PAGE_SIZE}");
            DEFAULT_PAGE_SIZE
        },
    }
}

fn parse_from(raw: &str) -> Option<u32> {
    match raw.trim().parse::<u32>() {
        Ok(from) => Some(from),
        Err(_) if raw.is_empty() => None,
        Err(_) => {
            warn!(from = raw, "invalid result offset, starting at the first result");
            None
        },
    }
}
