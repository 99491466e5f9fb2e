//! The composed result of a search.

use dog_catalog::{BreedCatalog, DogRecord, SearchPage};
use serde::Serialize;

use crate::models::filter::FilterSelection;
use crate::models::query::encode_field_token;

/// Total and cursors of a result page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub total: u64,
    /// Path of the next page, relative to the search page's mount point.
    pub next: Option<String>,
    pub prev: Option<String>,
}

/// A catalog breed as offered in the filter form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreedOption<'a> {
    pub name: &'a str,
    pub field_token: String,
    pub selected: bool,
}

/// The "showing `first` - `last` of `total`" line of a result page.
///
/// `first` and `last` are 1-based and inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplayWindow {
    pub first: u64,
    pub last: u64,
    pub total: u64,
}

/// Everything needed to present one page of search results.
///
/// Built once by [SearchViewModel::compose] and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchViewModel {
    catalog: BreedCatalog,
    params: FilterSelection,
    selected: Vec<String>,
    pagination: Pagination,
    dogs: Vec<DogRecord>,
}

impl SearchViewModel {
    /// Merge the results of all pipeline stages.
    ///
    /// `selected` are the breeds of `params` after normalization,
    /// `dogs` are in the order of the page's result ids.
    pub fn compose(
        catalog: BreedCatalog,
        params: FilterSelection,
        selected: Vec<String>,
        page: SearchPage,
        dogs: Vec<DogRecord>,
    ) -> Self {
        Self {
            catalog,
            params,
            selected,
            pagination: Pagination {
                total: page.total,
                next: page.next,
                prev: page.prev,
            },
            dogs,
        }
    }

    pub fn catalog(&self) -> &BreedCatalog {
        &self.catalog
    }

    /// The parameters as they were requested, including raw breed tokens.
    pub fn params(&self) -> &FilterSelection {
        &self.params
    }

    /// Canonical names of the breeds that were searched for.
    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn dogs(&self) -> &[DogRecord] {
        &self.dogs
    }

    /// Every catalog breed with its field token and whether it was searched for.
    pub fn breed_options(&self) -> Vec<BreedOption<'_>> {
        self.catalog
            .iter()
            .map(|name| BreedOption {
                name,
                field_token: encode_field_token(name),
                selected: self.selected.iter().any(|selected| selected == name),
            })
            .collect()
    }

    /// Range of the results on this page, `None` if the page is empty.
    pub fn window(&self) -> Option<DisplayWindow> {
        if self.dogs.is_empty() {
            return None;
        }
        let offset = u64::from(self.params.offset());
        Some(DisplayWindow {
            first: offset + 1,
            last: offset + self.dogs.len() as u64,
            total: self.pagination.total,
        })
    }

    /// The dogs on this page with their 1-based position in the full result.
    pub fn numbered_dogs(&self) -> impl Iterator<Item = (u64, &DogRecord)> {
        let offset = u64::from(self.params.offset());
        self.dogs
            .iter()
            .enumerate()
            .map(move |(i, dog)| (offset + i as u64 + 1, dog))
    }
}

#[cfg(test)]
mod tests {
    use dog_test_utils::{catalog, dog};
    use pretty_assertions::assert_eq;

    use super::*;

    fn page(total: u64, ids: &[&str]) -> SearchPage {
        SearchPage {
            total,
            result_ids: ids.iter().map(|id| id.to_string()).collect(),
            next: Some("/search?from=20".to_string()),
            prev: None,
        }
    }

    fn view(from: Option<u32>, dogs: Vec<DogRecord>) -> SearchViewModel {
        let params = FilterSelection {
            breeds: vec!["beagle".to_string()],
            from,
            ..Default::default()
        };
        SearchViewModel::compose(
            catalog(&["Beagle", "Cairn Terrier"]),
            params,
            vec!["Beagle".to_string()],
            page(45, &["d1", "d2"]),
            dogs,
        )
    }

    #[test]
    fn echoes_inputs() {
        let view = view(None, vec![dog("d1", "Beagle"), dog("d2", "Beagle")]);

        assert_eq!(view.params().breeds, vec!["beagle".to_string()]);
        assert_eq!(view.selected(), ["Beagle".to_string()]);
        assert_eq!(view.pagination(), &Pagination {
            total: 45,
            next: Some("/search?from=20".to_string()),
            prev: None,
        });
        assert_eq!(view.dogs().len(), 2);
    }

    #[test]
    fn breed_options_mark_selection() {
        let view = view(None, vec![]);
        assert_eq!(view.breed_options(), vec![
            BreedOption {
                name: "Beagle",
                field_token: "Beagle".to_string(),
                selected: true,
            },
            BreedOption {
                name: "Cairn Terrier",
                field_token: "Cairn_Terrier".to_string(),
                selected: false,
            },
        ]);
    }

    #[test]
    fn window_of_first_page() {
        let view = view(None, vec![dog("d1", "Beagle"), dog("d2", "Beagle")]);
        assert_eq!(
            view.window(),
            Some(DisplayWindow {
                first: 1,
                last: 2,
                total: 45
            })
        );
    }

    #[test]
    fn window_and_numbering_follow_offset() {
        let view = view(Some(40), vec![dog("d1", "Beagle"), dog("d2", "Beagle")]);
        assert_eq!(
            view.window(),
            Some(DisplayWindow {
                first: 41,
                last: 42,
                total: 45
            })
        );

        let numbered = view
            .numbered_dogs()
            .map(|(n, dog)| (n, dog.id.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(numbered, vec![(41, "d1"), (42, "d2")]);
    }

    #[test]
    fn empty_page_has_no_window() {
        assert_eq!(view(None, vec![]).window(), None);
    }
}
