//! Next-page detection. Pagination markup is the most fragile part of a
//! site's layout, so the heuristic is data per site and lives behind one
//! function that can be exercised against saved page fixtures.

use scraper::{Html, Selector};

use crate::models::PaginationState;

/// Site heuristic for deciding whether a listing has a further page.
pub enum NextPageRule {
    /// Compare the numeric labels of the pagination links against the
    /// current page; any label above it means more pages. An explicit next
    /// control (`""` = none) is honored even when the labels say otherwise.
    NumberedLinks {
        links: &'static str,
        next: &'static str,
    },
    /// Presence of an explicit next / load-more control.
    Control(&'static str),
}

pub fn has_next_page(document: &Html, rule: &NextPageRule, current_page: u32) -> bool {
    match rule {
        NextPageRule::NumberedLinks { links, next } => {
            if !next.is_empty() && control_present(document, next) {
                return true;
            }
            let Ok(selector) = Selector::parse(links) else {
                return false;
            };
            document.select(&selector).any(|link| {
                link.text()
                    .collect::<String>()
                    .trim()
                    .parse::<u32>()
                    .map(|label| label > current_page)
                    .unwrap_or(false)
            })
        }
        NextPageRule::Control(sel) => control_present(document, sel),
    }
}

fn control_present(document: &Html, sel: &str) -> bool {
    Selector::parse(sel)
        .map(|s| document.select(&s).next().is_some())
        .unwrap_or(false)
}

/// The continuation for the page after `state`: page + 1 carrying the
/// merged seen-id set, or `None` when the page shows no next-page signal.
pub fn advance(
    document: &Html,
    rule: &NextPageRule,
    state: PaginationState,
) -> Option<PaginationState> {
    if has_next_page(document, rule, state.page) {
        Some(PaginationState {
            page: state.page + 1,
            seen_ids: state.seen_ids,
        })
    } else {
        None
    }
}
