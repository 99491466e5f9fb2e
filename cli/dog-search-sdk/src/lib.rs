//! Search aggregation and pagination for the dog catalog.
//!
//! [pipeline::run_search] turns a [models::filter::FilterSelection] into a
//! [models::view::SearchViewModel] by loading the breed catalog,
//! running the filtered search and hydrating the results.
//! The remaining modules are the pure building blocks of that pipeline
//! and of the filter form submission.

pub mod models;
pub mod pipeline;

pub mod providers {
    /// The catalog client the pipeline talks to.
    pub use dog_catalog as catalog;
}
