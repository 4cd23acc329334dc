//! Per-site source adapters and the surface they expose to the host.

pub mod batcave;
pub mod readallcomics;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Chapter, ChapterPageList, HomeSection, Paged, PaginationState, Series};

/// Static metadata describing one source to the host.
#[derive(Debug, Clone)]
pub struct SourceInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub author: &'static str,
    pub base_url: &'static str,
    pub language: &'static str,
    pub mature: bool,
}

/// The operations every site adapter provides. All results are fresh per
/// call; the only state threaded between calls is the [`PaginationState`]
/// the caller passes back verbatim.
#[async_trait]
pub trait Source: Send + Sync {
    fn info(&self) -> &SourceInfo;

    /// Canonical share URL for a series.
    fn series_url(&self, series_id: &str) -> String;

    /// Emit the site's fixed home shelves in order, each as soon as it has
    /// been parsed.
    async fn home_sections(&self, emit: &mut (dyn FnMut(HomeSection) + Send)) -> Result<()>;

    async fn series_detail(&self, series_id: &str) -> Result<Series>;

    /// A blank or whitespace query browses the paged catalogue; anything
    /// else runs the site's search. Both modes emit summaries and thread
    /// the carried continuation state.
    async fn search(&self, query: &str, state: Option<PaginationState>) -> Result<Paged>;

    /// "View more" continuation for one of the home shelves. Unknown
    /// section ids fail with [`SourceError::UnsupportedSection`].
    ///
    /// [`SourceError::UnsupportedSection`]: crate::error::SourceError::UnsupportedSection
    async fn section_page(
        &self,
        section_id: &str,
        state: Option<PaginationState>,
    ) -> Result<Paged>;

    async fn chapter_list(&self, series_id: &str) -> Result<Vec<Chapter>>;

    async fn chapter_pages(&self, series_id: &str, chapter_id: &str) -> Result<ChapterPageList>;
}

/// Look up a source adapter by name.
pub fn by_name(name: &str) -> Option<Box<dyn Source>> {
    match name.to_lowercase().as_str() {
        "batcave" => batcave::BatCave::new()
            .ok()
            .map(|s| Box::new(s) as Box<dyn Source>),
        "readallcomics" | "rac" => readallcomics::ReadAllComics::new()
            .ok()
            .map(|s| Box::new(s) as Box<dyn Source>),
        _ => None,
    }
}
