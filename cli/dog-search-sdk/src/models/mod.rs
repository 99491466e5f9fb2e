pub mod filter;
pub mod params;
pub mod query;
pub mod submission;
pub mod view;
