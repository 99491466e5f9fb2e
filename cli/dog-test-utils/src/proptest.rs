use std::collections::BTreeSet;

use proptest::collection::{btree_set, vec as prop_vec};
use proptest::prelude::*;

/// Produces strings that only contain lowercase ASCII letters.
pub fn lowercase_string(max_size: usize) -> impl Strategy<Value = String> {
    prop_vec(proptest::char::range('a', 'z'), 1..=max_size)
        .prop_map(|v| v.into_iter().collect())
}

/// Produces breed-like names: one to three capitalized words separated by
/// single spaces, e.g. "Cairn Terrier".
pub fn breed_name() -> impl Strategy<Value = String> {
    prop_vec(lowercase_string(8), 1..=3).prop_map(|words| {
        words
            .iter()
            .map(|word| capitalize(word))
            .collect::<Vec<_>>()
            .join(" ")
    })
}

/// Produces breed names that contain at least one space.
pub fn multi_word_breed_name() -> impl Strategy<Value = String> {
    prop_vec(lowercase_string(8), 2..=3).prop_map(|words| {
        words
            .iter()
            .map(|word| capitalize(word))
            .collect::<Vec<_>>()
            .join(" ")
    })
}

/// Produces catalogs without two names that differ only in case.
pub fn breed_catalog(max_breeds: usize) -> impl Strategy<Value = Vec<String>> {
    btree_set(breed_name(), 0..=max_breeds).prop_map(|names| {
        let mut seen = BTreeSet::new();
        names
            .into_iter()
            .filter(|name| seen.insert(name.to_lowercase()))
            .collect()
    })
}

/// Randomly upper- or lowercases every character of `s`.
pub fn random_case(s: String) -> impl Strategy<Value = String> {
    let len = s.chars().count();
    prop_vec(any::<bool>(), len..=len).prop_map(move |upper| {
        s.chars()
            .zip(upper)
            .map(|(c, upper)| {
                if upper {
                    c.to_ascii_uppercase()
                } else {
                    c.to_ascii_lowercase()
                }
            })
            .collect()
    })
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}
