//! Fixtures and proptest strategies shared by the test suites.

use dog_catalog::{BreedCatalog, DogRecord};
use serde_json::{Value, json};

pub mod proptest;

/// A dog record with predictable fields derived from `id`.
pub fn dog(id: &str, breed: &str) -> DogRecord {
    DogRecord {
        id: id.to_string(),
        img: format!("https://frontend-take-home.example.com/dog-images/{id}.jpg"),
        name: format!("Dog {id}"),
        age: 4,
        zip_code: "48333".to_string(),
        breed: breed.to_string(),
    }
}

/// A catalog from a list of names.
pub fn catalog(breeds: &[&str]) -> BreedCatalog {
    breeds
        .iter()
        .map(|breed| breed.to_string())
        .collect::<Vec<_>>()
        .into()
}

/// JSON body of a search response as the catalog service sends it.
pub fn search_response_json(
    total: u64,
    ids: &[&str],
    next: Option<&str>,
    prev: Option<&str>,
) -> Value {
    let mut body = json!({
        "total": total,
        "resultIds": ids,
    });
    if let Some(next) = next {
        body["next"] = json!(next);
    }
    if let Some(prev) = prev {
        body["prev"] = json!(prev);
    }
    body
}
