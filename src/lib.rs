// Library interface for comic-sources
// Content-source scrapers for comic sites, one adapter per site

pub mod config;
pub mod embedded;
pub mod error;
pub mod extract;
pub mod http_client;
pub mod listing;
pub mod models;
pub mod pagination;
pub mod sources;

pub use error::{Result, SourceError};
pub use sources::{by_name, Source, SourceInfo};
