//! The search pipeline.
//!
//! A search is composed of three dependent catalog calls:
//! the breed catalog is needed to normalize the selection,
//! the normalized selection is needed to search,
//! and the ids of the search results are needed to hydrate them.
//! The calls run strictly one after the other, the first failing call aborts
//! the search.

use std::future::Future;

use derive_more::Display;
use dog_catalog::{CatalogClientError, ClientTrait, Session, StatusCode};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::models::filter::{FilterSelection, normalize};
use crate::models::query::encode_for_search;
use crate::models::view::SearchViewModel;

/// A fallible step of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Stage {
    #[display("catalog")]
    Catalog,
    #[display("search")]
    Search,
    #[display("hydrate")]
    Hydrate,
}

impl Stage {
    /// The state the pipeline is in while this stage runs.
    pub fn state(&self) -> PipelineState {
        match self {
            Stage::Catalog => PipelineState::FetchingCatalog,
            Stage::Search => PipelineState::FetchingSearch,
            Stage::Hydrate => PipelineState::HydratingResults,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum PipelineState {
    #[display("fetching catalog")]
    FetchingCatalog,
    #[display("fetching search")]
    FetchingSearch,
    #[display("hydrating results")]
    HydratingResults,
    #[display("composed")]
    Composed,
    #[display("failed in {_0} stage")]
    Failed(Stage),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("could not load the breed catalog")]
    UpstreamUnavailable(#[source] CatalogClientError),
    #[error("search failed")]
    SearchFailed(#[source] CatalogClientError),
    #[error("could not load the search results")]
    HydrationFailed(#[source] CatalogClientError),
    #[error("search cancelled in {stage} stage")]
    Cancelled { stage: Stage },
}

impl PipelineError {
    fn failed(stage: Stage, err: CatalogClientError) -> Self {
        match stage {
            Stage::Catalog => PipelineError::UpstreamUnavailable(err),
            Stage::Search => PipelineError::SearchFailed(err),
            Stage::Hydrate => PipelineError::HydrationFailed(err),
        }
    }

    /// The stage that did not complete.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::UpstreamUnavailable(_) => Stage::Catalog,
            PipelineError::SearchFailed(_) => Stage::Search,
            PipelineError::HydrationFailed(_) => Stage::Hydrate,
            PipelineError::Cancelled { stage } => *stage,
        }
    }

    /// The upstream status, if the service answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            PipelineError::UpstreamUnavailable(err)
            | PipelineError::SearchFailed(err)
            | PipelineError::HydrationFailed(err) => err.status(),
            PipelineError::Cancelled { .. } => None,
        }
    }

    /// The state the pipeline ended in.
    pub fn state(&self) -> PipelineState {
        PipelineState::Failed(self.stage())
    }
}

/// Run a single stage unless `cancel` fires first.
///
/// Cancellation is checked before the stage's future is polled,
/// an already cancelled token never starts a request.
async fn run_stage<T>(
    stage: Stage,
    cancel: &CancellationToken,
    call: impl Future<Output = Result<T, CatalogClientError>>,
) -> Result<T, PipelineError> {
    debug!(state = %stage.state(), "entering pipeline state");

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(PipelineError::Cancelled { stage }),
        result = call => result.map_err(|err| PipelineError::failed(stage, err)),
    };

    if let Err(err) = &result {
        debug!(state = %err.state(), status = ?err.status(), "pipeline aborted");
    }
    result
}

/// Search the catalog for `selection` and compose the resulting page.
///
/// `session` is forwarded to every catalog call.
/// Cancelling `cancel` abandons the running stage, no partial result is
/// returned.
#[instrument(skip_all, fields(
    n_breeds = selection.breeds.len(),
    sort = %selection.sort,
    size = selection.size,
    from = selection.offset(),
))]
pub async fn run_search<C: ClientTrait>(
    client: &C,
    session: &Session,
    selection: FilterSelection,
    cancel: &CancellationToken,
) -> Result<SearchViewModel, PipelineError> {
    let catalog = run_stage(Stage::Catalog, cancel, client.breeds(session)).await?;
    let selected = normalize(&selection.breeds, &catalog);
    debug!(
        n_catalog = catalog.len(),
        n_selected = selected.len(),
        "normalized breed selection"
    );

    let query = encode_for_search(
        Some(selection.sort.as_str()),
        Some(selection.size),
        selection.from,
        &selected,
    );
    let page = run_stage(Stage::Search, cancel, client.search(&query, session)).await?;
    debug!(total = page.total, n_results = page.result_ids.len(), "search done");

    let dogs = run_stage(
        Stage::Hydrate,
        cancel,
        client.hydrate(&page.result_ids, session),
    )
    .await?;

    debug!(state = %PipelineState::Composed, n_dogs = dogs.len(), "entering pipeline state");
    Ok(SearchViewModel::compose(
        catalog, selection, selected, page, dogs,
    ))
}
