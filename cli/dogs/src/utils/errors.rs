use dog_search_sdk::pipeline::PipelineError;
use dog_search_sdk::providers::catalog::StatusCode;
use indoc::formatdoc;
use tracing::trace;

pub fn format_pipeline_error(err: &PipelineError) -> String {
    trace!("formatting pipeline error: {err:?}");

    match err {
        PipelineError::UpstreamUnavailable(_)
            if err.status() == Some(StatusCode::UNAUTHORIZED) =>
        {
            formatdoc! {"
                The catalog service rejected the session.

                Log in with 'dogs login --name <NAME> --email <EMAIL>' and try again.
            "}
        },
        PipelineError::UpstreamUnavailable(_) => formatdoc! {"
            {}

            The catalog service could not be reached, no search was run.
        ", display_chain(err)},
        PipelineError::SearchFailed(_) => formatdoc! {"
            {}

            Check the sort order and page size and try again.
        ", display_chain(err)},
        PipelineError::HydrationFailed(_) => formatdoc! {"
            {}

            The search succeeded, but the matching dogs could not be loaded.
        ", display_chain(err)},
        PipelineError::Cancelled { .. } => display_chain(err),
    }
}

/// The error and all its sources, separated by `: `
pub fn display_chain(mut err: &dyn std::error::Error) -> String {
    let mut fmt = err.to_string();
    while let Some(source) = err.source() {
        fmt = format!("{fmt}: {source}");
        err = source;
    }

    fmt
}
