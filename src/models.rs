use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Publication status of a series. The variant set is fixed by the host
/// schema; anything the site reports outside the known tokens maps to
/// `Unknown`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum SeriesStatus {
    Ongoing,
    Completed,
    Unknown,
}

/// One genre/category tag. `id` is the label lowercased with
/// non-alphanumerics stripped; duplicate ids are kept, not merged.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: String,
    pub label: String,
}

/// Lightweight listing entry shown in grids and shelves.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SeriesSummary {
    pub id: String,
    pub title: String,
    pub cover_url: String,
    pub subtitle: Option<String>,
}

/// Full series detail record.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Series {
    pub id: String,
    pub titles: Vec<String>,
    pub cover_url: String,
    pub description: String,
    pub status: SeriesStatus,
    pub rating: f32,
    pub tags: Vec<Tag>,
    pub author: Option<String>,
    pub publisher: Option<String>,
}

/// One entry in a series' chapter list. Site ordering is preserved as-is,
/// which for most sites means reverse-chronological.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Chapter {
    pub id: String,
    pub number: f32,
    pub title: String,
    pub volume: f32,
    pub date: NaiveDate,
    pub language: String,
}

/// Ordered image URLs for one chapter. An empty page list signals that
/// extraction failed, not that the chapter is absent.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChapterPageList {
    pub chapter_id: String,
    pub series_id: String,
    pub pages: Vec<String>,
}

/// Display style of a home shelf, from the host's fixed set.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum SectionStyle {
    LargeRow,
    NormalRow,
}

/// A named, ordered shelf of series for the landing page. `id` is stable
/// across calls so the host can request continuations for it.
#[derive(Debug, Serialize, Clone)]
pub struct HomeSection {
    pub id: &'static str,
    pub title: &'static str,
    pub style: SectionStyle,
    pub items: Vec<SeriesSummary>,
    pub has_more: bool,
}

/// Continuation token for paged listings. Opaque to the caller: it is
/// returned from one call and passed back verbatim on the next. The seen-id
/// set carries the de-dup scope across pages.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct PaginationState {
    pub page: u32,
    pub seen_ids: HashSet<String>,
}

impl PaginationState {
    /// State for the first page of a listing.
    pub fn first() -> Self {
        Self {
            page: 1,
            seen_ids: HashSet::new(),
        }
    }
}

/// One page of listing results plus the state to fetch the next page.
/// `next: None` means no further pages.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Paged {
    pub items: Vec<SeriesSummary>,
    pub next: Option<PaginationState>,
}
