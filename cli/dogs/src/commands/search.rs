use std::collections::HashSet;
use std::fmt::Write;

use anyhow::Result;
use bpaf::Bpaf;
use dog_search_sdk::models::filter::{DEFAULT_PAGE_SIZE, FilterSelection, MAX_PAGE_SIZE};
use dog_search_sdk::models::params::parse_search_params;
use dog_search_sdk::models::view::SearchViewModel;
use dog_search_sdk::pipeline::run_search;
use dog_search_sdk::providers::catalog::ClientTrait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::config::Config;
use crate::utils::init::session_from_config;
use crate::utils::message;

// Search for dogs
#[derive(Debug, Bpaf, Clone)]
pub struct Search {
    /// Only show dogs of this breed, case doesn't matter
    ///
    /// Can be given multiple times.
    #[bpaf(long("breed"), short('b'), argument("BREED"), many)]
    breeds: Vec<String>,

    /// Sort order, e.g. 'breed:asc' or 'age:desc'
    #[bpaf(long, argument("FIELD:DIRECTION"))]
    sort: Option<String>,

    /// Number of dogs per page
    #[bpaf(long, argument("N"))]
    size: Option<u32>,

    /// Offset of the first dog to show
    #[bpaf(long, argument("OFFSET"))]
    from: Option<u32>,

    /// Start from a query string or page link,
    /// e.g. '/search?from=20&breeds=Pug' as printed for the next page
    #[bpaf(long, argument("QUERY"))]
    query: Option<String>,

    /// Display the result page as JSON
    #[bpaf(long)]
    json: bool,
}

impl Search {
    #[instrument(name = "search", skip_all, fields(json = self.json))]
    pub async fn handle(
        self,
        config: &Config,
        client: &impl ClientTrait,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let json = self.json;
        let selection = self.into_selection(config.page_size);
        debug!(?selection, "searching");

        let session = session_from_config(config);
        let view = run_search(client, &session, selection, cancel).await?;

        let unknown = unknown_breeds(&view);
        if !unknown.is_empty() {
            message::warning(format!(
                "Ignoring breeds that are not in the catalog: {}",
                unknown.join(", ")
            ));
        }

        if json {
            println!("{}", serde_json::to_string_pretty(&view)?);
        } else {
            print!("{}", render_view(&view)?);
        }
        Ok(())
    }

    /// Merge `--query` with the explicit flags, flags win.
    fn into_selection(self, default_page_size: Option<u32>) -> FilterSelection {
        let mut selection = match &self.query {
            Some(query) => parse_search_params(query),
            None => FilterSelection {
                size: default_page_size
                    .unwrap_or(DEFAULT_PAGE_SIZE)
                    .clamp(1, MAX_PAGE_SIZE),
                ..Default::default()
            },
        };

        selection.breeds.extend(self.breeds);
        if let Some(sort) = self.sort.filter(|sort| !sort.is_empty()) {
            selection.sort = sort;
        }
        if let Some(size) = self.size {
            selection.size = size.clamp(1, MAX_PAGE_SIZE);
        }
        if self.from.is_some() {
            selection.from = self.from;
        }
        selection
    }
}

/// Requested breeds that did not match a catalog breed
///
/// Compares lowercased like [dog_search_sdk::models::filter::normalize].
fn unknown_breeds(view: &SearchViewModel) -> Vec<&str> {
    let selected = view
        .selected()
        .iter()
        .map(|breed| breed.to_lowercase())
        .collect::<HashSet<_>>();

    view.params()
        .breeds
        .iter()
        .filter(|token| !selected.contains(&token.to_lowercase()))
        .map(String::as_str)
        .collect()
}

fn render_view(view: &SearchViewModel) -> Result<String, std::fmt::Error> {
    let mut out = String::new();

    if !view.selected().is_empty() {
        writeln!(out, "Breeds: {}", view.selected().join(", "))?;
    }
    writeln!(out, "Sort: {}", view.params().sort)?;

    let Some(window) = view.window() else {
        writeln!(out, "No dogs found.")?;
        return Ok(out);
    };
    writeln!(
        out,
        "Showing {} - {} of {} dogs",
        window.first, window.last, window.total
    )?;
    writeln!(out)?;

    for (n, dog) in view.numbered_dogs() {
        writeln!(
            out,
            "{n:>4}. {name} ({breed}, {age} years, {zip}) {img}",
            name = dog.name,
            breed = dog.breed,
            age = dog.age,
            zip = dog.zip_code,
            img = dog.img,
        )?;
    }

    let pagination = view.pagination();
    if pagination.prev.is_some() || pagination.next.is_some() {
        writeln!(out)?;
    }
    if let Some(prev) = &pagination.prev {
        writeln!(out, "Previous page: dogs search --query '{prev}'")?;
    }
    if let Some(next) = &pagination.next {
        writeln!(out, "Next page: dogs search --query '{next}'")?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use dog_search_sdk::providers::catalog::{CatalogClient, CatalogClientConfig, SearchPage};
    use dog_test_utils::{catalog, dog, search_response_json};
    use httpmock::MockServer;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::utils::message::history::take_messages;

    fn search() -> Search {
        Search {
            breeds: Vec::new(),
            sort: None,
            size: None,
            from: None,
            query: None,
            json: false,
        }
    }

    #[test]
    fn default_selection_uses_config_page_size() {
        assert_eq!(search().into_selection(None), FilterSelection::default());
        assert_eq!(search().into_selection(Some(50)).size, 50);
        assert_eq!(search().into_selection(Some(500)).size, MAX_PAGE_SIZE);
    }

    #[test]
    fn flags_override_query() {
        let selection = Search {
            breeds: vec!["pug".to_string()],
            size: Some(0),
            from: Some(40),
            query: Some("/search?size=25&from=20&breeds=Beagle".to_string()),
            ..search()
        }
        .into_selection(Some(50));

        assert_eq!(selection, FilterSelection {
            breeds: vec!["Beagle".to_string(), "pug".to_string()],
            size: 1,
            from: Some(40),
            ..Default::default()
        });
    }

    fn view(from: Option<u32>, next: Option<&str>) -> SearchViewModel {
        SearchViewModel::compose(
            catalog(&["Beagle", "Pug"]),
            FilterSelection {
                breeds: vec!["beagle".to_string(), "dingo".to_string()],
                from,
                ..Default::default()
            },
            vec!["Beagle".to_string()],
            SearchPage {
                total: 45,
                result_ids: vec!["d1".to_string(), "d2".to_string()],
                next: next.map(ToString::to_string),
                prev: None,
            },
            vec![dog("d1", "Beagle"), dog("d2", "Beagle")],
        )
    }

    #[test]
    fn renders_page() {
        let rendered = render_view(&view(Some(20), Some("/search?from=22"))).unwrap();
        assert_eq!(rendered, indoc! {"
            Breeds: Beagle
            Sort: breed:asc
            Showing 21 - 22 of 45 dogs

              21. Dog d1 (Beagle, 4 years, 48333) https://frontend-take-home.example.com/dog-images/d1.jpg
              22. Dog d2 (Beagle, 4 years, 48333) https://frontend-take-home.example.com/dog-images/d2.jpg

            Next page: dogs search --query '/search?from=22'
            "});
    }

    #[test]
    fn renders_empty_page() {
        let view = SearchViewModel::compose(
            catalog(&["Beagle"]),
            FilterSelection::default(),
            Vec::new(),
            SearchPage {
                total: 0,
                result_ids: Vec::new(),
                next: None,
                prev: None,
            },
            Vec::new(),
        );
        assert_eq!(render_view(&view).unwrap(), "Sort: breed:asc\nNo dogs found.\n");
    }

    #[test]
    fn finds_unknown_breeds() {
        assert_eq!(unknown_breeds(&view(None, None)), vec!["dingo"]);
    }

    #[test]
    fn matched_non_ascii_breeds_are_known() {
        let view = SearchViewModel::compose(
            catalog(&["Épagneul Breton"]),
            FilterSelection {
                breeds: vec!["épagneul breton".to_string(), "ÉPAGNEUL BRETON".to_string()],
                ..Default::default()
            },
            vec!["Épagneul Breton".to_string()],
            SearchPage {
                total: 0,
                result_ids: Vec::new(),
                next: None,
                prev: None,
            },
            Vec::new(),
        );
        assert!(unknown_breeds(&view).is_empty());
    }

    #[tokio::test]
    async fn search_warns_about_unknown_breeds() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.path("/dogs/breeds");
            then.status(200).json_body(json!(["Beagle"]));
        });
        let search_mock = server.mock(|when, then| {
            when.path("/dogs/search")
                .query_param("breeds", "Beagle")
                .query_param("size", "5");
            then.status(200)
                .json_body(search_response_json(1, &["d1"], None, None));
        });
        server.mock(|when, then| {
            when.path("/dogs");
            then.status(200).json_body_obj(&vec![dog("d1", "Beagle")]);
        });
        let client = CatalogClient::new(CatalogClientConfig::new(server.base_url())).unwrap();

        take_messages();
        Search {
            breeds: vec!["BEAGLE".to_string(), "Dingo".to_string()],
            size: Some(5),
            ..search()
        }
        .handle(&Config::default(), &client, &CancellationToken::new())
        .await
        .unwrap();

        search_mock.assert();
        assert_eq!(take_messages(), vec![
            "⚠️  Ignoring breeds that are not in the catalog: Dingo".to_string()
        ]);
    }

    #[tokio::test]
    async fn search_failure_is_reported() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.path("/dogs/breeds");
            then.status(200).json_body(json!(["Beagle"]));
        });
        server.mock(|when, then| {
            when.path("/dogs/search");
            then.status(500);
        });
        let client = CatalogClient::new(CatalogClientConfig::new(server.base_url())).unwrap();

        let err = search()
            .handle(&Config::default(), &client, &CancellationToken::new())
            .await
            .unwrap_err();

        let err = err
            .downcast_ref::<dog_search_sdk::pipeline::PipelineError>()
            .unwrap();
        assert_eq!(err.stage(), dog_search_sdk::pipeline::Stage::Search);
    }
}
