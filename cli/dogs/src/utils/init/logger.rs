use std::sync::OnceLock;

use tracing::{debug, error};
use tracing_subscriber::prelude::*;
use tracing_subscriber::reload::Handle;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::commands::Verbosity;

static LOGGER_HANDLE: OnceLock<Handle<EnvFilter, Registry>> = OnceLock::new();

/// Install the global subscriber or update its filter.
///
/// `RUST_LOG` takes precedence over `verbosity`.
pub(crate) fn init_logger(verbosity: Option<Verbosity>) {
    let verbosity = verbosity.unwrap_or_default();

    let filter_handle = LOGGER_HANDLE.get_or_init(|| {
        let (subscriber, reload_handle) = create_registry_and_filter_reload_handle();
        subscriber.init();
        reload_handle
    });

    update_filters(filter_handle, log_filter(verbosity));
}

fn log_filter(verbosity: Verbosity) -> &'static str {
    match verbosity {
        // Show only errors
        Verbosity::Quiet => "off,dogs=error",
        // Only show warnings
        Verbosity::Verbose(0) => "off,dogs=warn,dog_search_sdk=warn",
        // Show our own info logs
        Verbosity::Verbose(1) => "off,dogs=info,dog_search_sdk=info,dog_catalog=info",
        // Also show debug from our libraries
        Verbosity::Verbose(2) => "off,dogs=debug,dog_search_sdk=debug,dog_catalog=debug",
        // Also show trace from our libraries
        Verbosity::Verbose(3) => "off,dogs=trace,dog_search_sdk=trace,dog_catalog=trace",
        // Also show debug from the http stack
        Verbosity::Verbose(4) => "debug,dogs=trace,dog_search_sdk=trace,dog_catalog=trace",
        Verbosity::Verbose(_) => "trace",
    }
}

pub fn update_filters(filter_handle: &Handle<EnvFilter, Registry>, log_filter: &str) {
    let result = filter_handle.modify(|layer| {
        match EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_filter)) {
            Ok(new_filter) => *layer = new_filter,
            Err(err) => {
                error!("Updating logger filter failed: {}", err);
            },
        };
    });
    if let Err(err) = result {
        error!("Updating logger filter failed: {}", err);
    }
}

pub fn create_registry_and_filter_reload_handle() -> (
    impl SubscriberInitExt,
    Handle<EnvFilter, Registry>,
) {
    // Start with everything enabled,
    // the actual level is set right after through the reload handle.
    let filter = EnvFilter::new("trace");
    let (filter, filter_reload_handle) = tracing_subscriber::reload::Layer::new(filter);
    let log_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter);
    let registry = tracing_subscriber::registry().with(log_layer);
    debug!("Initializing logger");

    (registry, filter_reload_handle)
}
