//! Field extractors: best-effort functions that pull one semantic value out
//! of a parsed fragment. None of them fail — absent or malformed data
//! yields the documented default (empty string, 0, `Unknown`).

use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Selector};

use crate::models::{SeriesStatus, Tag};

/// Trimmed text of the first element matching `sel` under `el`, or "".
pub fn text_of(el: &ElementRef, sel: &str) -> String {
    let Ok(selector) = Selector::parse(sel) else {
        return String::new();
    };
    el.select(&selector)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Whitespace-normalized text of `el` with child elements excluded. Used
/// where a title node nests badges or chapter links inside it.
pub fn own_text(el: &ElementRef) -> String {
    let mut out = String::new();
    for child in el.children() {
        if let scraper::Node::Text(text) = child.value() {
            out.push_str(text);
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First attribute of `attrs` present on the first element matching `sel`,
/// trimmed, or "". The attribute order is the fallback chain (lazy-loading
/// sites keep the real URL in `data-src` and a placeholder in `src`).
pub fn attr_of(el: &ElementRef, sel: &str, attrs: &[&str]) -> String {
    let Ok(selector) = Selector::parse(sel) else {
        return String::new();
    };
    el.select(&selector)
        .next()
        .and_then(|e| attrs.iter().find_map(|a| e.value().attr(a)))
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

/// First decimal number in `text`, or 0 when there is none.
pub fn first_number(text: &str) -> f32 {
    Regex::new(r"(\d+(?:\.\d+)?)")
        .ok()
        .and_then(|re| {
            re.captures(text)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse().ok())
        })
        .unwrap_or(0.0)
}

/// Resolve a raw image path against the site's asset host. Paths starting
/// with `/` are prefixed; everything else passes through unchanged. The
/// asset host may differ from the page host (images on a CDN/bucket).
pub fn absolutize(raw: &str, asset_host: &str) -> String {
    if raw.starts_with('/') {
        format!("{}{}", asset_host.trim_end_matches('/'), raw)
    } else {
        raw.to_string()
    }
}

/// Classify a status string. "completed" is checked before "ongoing";
/// anything else is `Unknown`.
pub fn parse_status(text: &str) -> SeriesStatus {
    let lower = text.to_lowercase();
    if lower.contains("completed") {
        SeriesStatus::Completed
    } else if lower.contains("ongoing") {
        SeriesStatus::Ongoing
    } else {
        SeriesStatus::Unknown
    }
}

/// Build a tag from a genre label. The id is the label lowercased with
/// non-alphanumerics stripped; collisions between labels are accepted.
pub fn tag_from_label(label: &str) -> Tag {
    let id = label
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    Tag {
        id,
        label: label.to_string(),
    }
}

/// Parse a `dd.mm.yyyy` site date.
pub fn parse_dmy_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%d.%m.%Y").ok()
}

/// Chapter number from a free-text title: the first integer, optionally
/// preceded by a volume marker. Numbers above 2000 are assumed to be years
/// and yield 0. That assumption misparses legitimately high chapter
/// numbers; it is kept because the sites put years in the same position.
pub fn chapter_number_from_title(title: &str) -> f32 {
    let Some(n) = Regex::new(r"(?:v\d+\s)?(\d+)")
        .ok()
        .and_then(|re| re.captures(title).and_then(|c| c.get(1)))
        .and_then(|m| m.as_str().parse::<u32>().ok())
    else {
        return 0.0;
    };
    if n > 2000 { 0.0 } else { n as f32 }
}

/// Volume number from a `v<digits>` marker in a title, or 0.
pub fn volume_from_title(title: &str) -> f32 {
    Regex::new(r"(?i)v(\d+)")
        .ok()
        .and_then(|re| re.captures(title).and_then(|c| c.get(1)))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0.0)
}

/// Publication year from a `(yyyy)` marker in a title, defaulting to 2000.
pub fn year_from_title(title: &str) -> i32 {
    Regex::new(r"\((\d{4})\)")
        .ok()
        .and_then(|re| re.captures(title).and_then(|c| c.get(1)))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(2000)
}

/// Turn a series link into the site-native id: strip the scheme and the
/// site's own domain, a leading slash, and a trailing `.html`.
pub fn href_to_slug(href: &str, base_url: &str) -> String {
    let naked_host = base_url
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/');
    let mut s = href.trim();
    s = s
        .strip_prefix("https://")
        .or_else(|| s.strip_prefix("http://"))
        .unwrap_or(s);
    s = s.strip_prefix(naked_host).unwrap_or(s);
    s.trim_start_matches('/')
        .trim_end_matches(".html")
        .trim()
        .to_string()
}

/// Last non-empty path segment of a URL.
pub fn last_path_segment(url: &str) -> Option<String> {
    url.split('/')
        .filter(|part| !part.is_empty())
        .next_back()
        .map(|part| part.to_string())
}
