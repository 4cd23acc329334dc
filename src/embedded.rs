//! Extraction of JSON payloads embedded in `<script>` tags. Some sites ship
//! their chapter list and reader image list as a JS assignment like
//! `window.__DATA__ = {...};` instead of markup.

use scraper::{Html, Selector};
use serde_json::Value;

/// Find the first script whose text contains `marker` and parse the JSON
/// object that follows it. A missing script or a payload that does not
/// parse is a recoverable extraction miss: both return `None` and are
/// logged, never surfaced as an error.
pub fn extract_marked_json(document: &Html, marker: &str) -> Option<Value> {
    let selector = Selector::parse("script").unwrap();
    for script in document.select(&selector) {
        let text = script.text().collect::<String>();
        let Some(pos) = text.find(marker) else {
            continue;
        };
        let Some(json) = balanced_object(&text[pos + marker.len()..]) else {
            log::warn!("no JSON object follows marker {}", marker);
            return None;
        };
        match serde_json::from_str(json) {
            Ok(value) => return Some(value),
            Err(e) => {
                log::warn!("embedded payload at marker {} did not parse: {}", marker, e);
                return None;
            }
        }
    }
    log::debug!("no script containing marker {}", marker);
    None
}

/// The substring from the first `{` in `s` through its matching `}`.
/// Brace counting skips over string literals and escapes so titles
/// containing braces do not truncate the payload.
fn balanced_object(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, b) in s.bytes().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_marked_payload() {
        let html = Html::parse_document(
            r#"<html><script>var x = 1;</script>
            <script>window.__DATA__ = {"chapters":[{"id":5,"posi":1,"date":"01.02.2020"}]};</script></html>"#,
        );
        let value = extract_marked_json(&html, "window.__DATA__").unwrap();
        let chapters = value["chapters"].as_array().unwrap();
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0]["id"], 5);
    }

    #[test]
    fn escaped_slashes_decode_to_plain_slashes() {
        let html = Html::parse_document(
            r#"<script>window.__DATA__ = {"images":["a\/b.jpg"]};</script>"#,
        );
        let value = extract_marked_json(&html, "window.__DATA__").unwrap();
        assert_eq!(value["images"][0].as_str().unwrap(), "a/b.jpg");
    }

    #[test]
    fn braces_inside_strings_do_not_truncate() {
        let html = Html::parse_document(
            r#"<script>window.__DATA__ = {"title":"The {Dark} Knight \" } ","n":2};</script>"#,
        );
        let value = extract_marked_json(&html, "window.__DATA__").unwrap();
        assert_eq!(value["n"], 2);
    }

    #[test]
    fn malformed_payload_is_none() {
        let html = Html::parse_document(
            r#"<script>window.__DATA__ = {"chapters":[oops]};</script>"#,
        );
        assert!(extract_marked_json(&html, "window.__DATA__").is_none());
    }

    #[test]
    fn missing_marker_is_none() {
        let html = Html::parse_document(r#"<script>var y = {"a":1};</script>"#);
        assert!(extract_marked_json(&html, "window.__DATA__").is_none());
    }
}
