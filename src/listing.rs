//! Generic list-section scraper. Every site listing — home shelves,
//! catalogue pages, search results — is the same loop over repeated DOM
//! blocks; what varies per site is captured as data in [`ItemRules`]
//! rather than re-implemented per section.

use std::collections::HashSet;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::extract;
use crate::models::SeriesSummary;

/// How the series title is derived from one item block.
pub enum TitleRule {
    /// Trimmed text of the first match.
    Text(&'static str),
    /// `title` attribute of the first match, falling back to its text.
    AttrOrText(&'static str),
    /// Text of the first match with child elements excluded.
    OwnText(&'static str),
}

/// How the site-native series id is derived from one item block.
pub enum IdRule {
    /// Href of the first match (`""` = the item element itself), stripped
    /// of the site prefix and a trailing `.html`.
    HrefSlug { link: &'static str },
    /// Last path segment of the href of the first match. When `require` is
    /// non-empty the href must contain it, otherwise the item is skipped.
    HrefLastSegment {
        link: &'static str,
        require: &'static str,
    },
    /// First capture of `pattern` applied to the item's `class` attribute.
    ClassCapture { pattern: &'static str },
    /// Href of the anchor enclosing the first `inner` match (closest
    /// ancestor, the match itself included), stripped like `HrefSlug`.
    EnclosingHrefSlug { inner: &'static str },
}

/// Cover image lookup: a selector plus an attribute fallback chain.
pub struct ImageRule {
    pub sel: &'static str,
    pub attrs: &'static [&'static str],
}

/// Subtitle lookup. `strip_prefix` removes a site label from the scraped
/// text ("Last issue:"); `label` prefixes the emitted value ("Rating: ").
pub struct SubtitleRule {
    pub sel: &'static str,
    pub strip_prefix: &'static str,
    pub label: &'static str,
}

/// The per-section scraping configuration.
pub struct ItemRules {
    pub item: &'static str,
    pub title: TitleRule,
    pub id: IdRule,
    pub image: Option<ImageRule>,
    pub subtitle: Option<SubtitleRule>,
}

/// Apply `rules` to every item block in the document, in document order.
/// Items with an empty id or title are skipped, as is any id already in
/// `seen` — first occurrence wins, and `seen` arrives pre-populated when a
/// continuation call carries ids from earlier pages.
pub fn scrape_listing(
    document: &Html,
    rules: &ItemRules,
    base_url: &str,
    asset_host: &str,
    seen: &mut HashSet<String>,
) -> Vec<SeriesSummary> {
    let Ok(item_sel) = Selector::parse(rules.item) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for item in document.select(&item_sel) {
        let title = title_for(&item, &rules.title);
        let id = id_for(&item, &rules.id, base_url);
        if title.is_empty() || id.is_empty() {
            log::debug!("skipping item under {} with empty id or title", rules.item);
            continue;
        }
        if !seen.insert(id.clone()) {
            continue;
        }
        let cover_url = rules
            .image
            .as_ref()
            .map(|image| {
                extract::absolutize(&extract::attr_of(&item, image.sel, image.attrs), asset_host)
            })
            .unwrap_or_default();
        let subtitle = rules.subtitle.as_ref().and_then(|rule| {
            let text = extract::text_of(&item, rule.sel);
            let value = text
                .strip_prefix(rule.strip_prefix)
                .unwrap_or(&text)
                .trim();
            if value.is_empty() {
                None
            } else {
                Some(format!("{}{}", rule.label, value))
            }
        });
        out.push(SeriesSummary {
            id,
            title,
            cover_url,
            subtitle,
        });
    }
    out
}

fn title_for(item: &ElementRef, rule: &TitleRule) -> String {
    match rule {
        TitleRule::Text(sel) => extract::text_of(item, sel),
        TitleRule::AttrOrText(sel) => {
            let attr = extract::attr_of(item, sel, &["title"]);
            if attr.is_empty() {
                extract::text_of(item, sel)
            } else {
                attr
            }
        }
        TitleRule::OwnText(sel) => {
            let Ok(selector) = Selector::parse(sel) else {
                return String::new();
            };
            item.select(&selector)
                .next()
                .map(|el| extract::own_text(&el))
                .unwrap_or_default()
        }
    }
}

fn id_for(item: &ElementRef, rule: &IdRule, base_url: &str) -> String {
    match rule {
        IdRule::HrefSlug { link } => {
            let href = href_of(item, link);
            if href.is_empty() {
                String::new()
            } else {
                extract::href_to_slug(&href, base_url)
            }
        }
        IdRule::HrefLastSegment { link, require } => {
            let href = href_of(item, link);
            if !require.is_empty() && !href.contains(require) {
                return String::new();
            }
            extract::last_path_segment(&href).unwrap_or_default()
        }
        IdRule::ClassCapture { pattern } => Regex::new(pattern)
            .ok()
            .and_then(|re| {
                let class = item.value().attr("class")?;
                re.captures(class)?.get(1).map(|m| m.as_str().to_string())
            })
            .unwrap_or_default(),
        IdRule::EnclosingHrefSlug { inner } => enclosing_anchor_href(item, inner)
            .map(|href| extract::href_to_slug(&href, base_url))
            .unwrap_or_default(),
    }
}

/// Href of the first `link` match, or of the item element itself when
/// `link` is empty.
fn href_of(item: &ElementRef, link: &str) -> String {
    if link.is_empty() {
        return item
            .value()
            .attr("href")
            .map(|h| h.trim().to_string())
            .unwrap_or_default();
    }
    extract::attr_of(item, link, &["href"])
}

/// Closest-ancestor anchor lookup, starting at the first `inner` match.
fn enclosing_anchor_href(item: &ElementRef, inner: &str) -> Option<String> {
    let selector = Selector::parse(inner).ok()?;
    let start = item.select(&selector).next()?;
    if start.value().name() == "a" {
        if let Some(href) = start.value().attr("href") {
            return Some(href.to_string());
        }
    }
    for ancestor in start.ancestors() {
        if let Some(el) = ElementRef::wrap(ancestor) {
            if el.value().name() == "a" {
                return el.value().attr("href").map(|h| h.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://batcave.biz";

    fn rules() -> ItemRules {
        ItemRules {
            item: ".card",
            title: TitleRule::Text(".card__title"),
            id: IdRule::HrefSlug { link: "a" },
            image: Some(ImageRule {
                sel: "img",
                attrs: &["data-src", "src"],
            }),
            subtitle: None,
        }
    }

    #[test]
    fn emits_in_document_order_and_dedups() {
        let html = Html::parse_document(
            r#"<div>
                <div class="card"><a href="/1-a.html">x</a><p class="card__title">A</p><img data-src="/a.jpg"></div>
                <div class="card"><a href="/2-b.html">x</a><p class="card__title">B</p><img src="/b.jpg"></div>
                <div class="card"><a href="/1-a.html">x</a><p class="card__title">A again</p></div>
            </div>"#,
        );
        let mut seen = HashSet::new();
        let items = scrape_listing(&html, &rules(), BASE, BASE, &mut seen);
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["1-a", "2-b"]);
        assert_eq!(items[0].cover_url, "https://batcave.biz/a.jpg");
    }

    #[test]
    fn skips_items_with_empty_title_or_id() {
        let html = Html::parse_document(
            r#"<div>
                <div class="card"><a href="/3-c.html">x</a><p class="card__title"></p></div>
                <div class="card"><p class="card__title">No link</p></div>
                <div class="card"><a href="/4-d.html">x</a><p class="card__title">D</p></div>
            </div>"#,
        );
        let mut seen = HashSet::new();
        let items = scrape_listing(&html, &rules(), BASE, BASE, &mut seen);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "4-d");
    }

    #[test]
    fn carried_seen_set_suppresses_earlier_pages() {
        let html = Html::parse_document(
            r#"<div>
                <div class="card"><a href="/1-a.html">x</a><p class="card__title">A</p></div>
                <div class="card"><a href="/5-e.html">x</a><p class="card__title">E</p></div>
            </div>"#,
        );
        let mut seen: HashSet<String> = ["1-a".to_string()].into_iter().collect();
        let items = scrape_listing(&html, &rules(), BASE, BASE, &mut seen);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "5-e");
        assert!(seen.contains("5-e"));
    }

    #[test]
    fn class_capture_and_last_segment_ids() {
        let html = Html::parse_document(
            r#"<div>
                <div class="post category-batman-2016">
                    <a title="Batman (2016)" href="https://example.com/x">t</a>
                </div>
            </div>"#,
        );
        let class_rules = ItemRules {
            item: ".post",
            title: TitleRule::AttrOrText("a"),
            id: IdRule::ClassCapture {
                pattern: r"category-([^\s]+)",
            },
            image: None,
            subtitle: None,
        };
        let mut seen = HashSet::new();
        let items = scrape_listing(&html, &class_rules, BASE, BASE, &mut seen);
        assert_eq!(items[0].id, "batman-2016");
        assert_eq!(items[0].title, "Batman (2016)");
        assert_eq!(items[0].cover_url, "");

        let html = Html::parse_document(
            r#"<ul><li class="s"><a href="https://e.com/category/flash-rebirth/">Flash</a></li>
                <li class="s"><a href="https://e.com/tag/not-a-series/">Nope</a></li></ul>"#,
        );
        let seg_rules = ItemRules {
            item: ".s",
            title: TitleRule::AttrOrText("a"),
            id: IdRule::HrefLastSegment {
                link: "a",
                require: "/category/",
            },
            image: None,
            subtitle: None,
        };
        let mut seen = HashSet::new();
        let items = scrape_listing(&html, &seg_rules, BASE, BASE, &mut seen);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "flash-rebirth");
    }

    #[test]
    fn enclosing_anchor_id_and_own_text_title() {
        let html = Html::parse_document(
            r#"<div>
                <div class="latest">
                    <a href="/9-spawn.html"><h3 class="latest__title">Spawn <span>#350</span></h3></a>
                </div>
            </div>"#,
        );
        let rules = ItemRules {
            item: ".latest",
            title: TitleRule::OwnText(".latest__title"),
            id: IdRule::EnclosingHrefSlug {
                inner: ".latest__title",
            },
            image: None,
            subtitle: None,
        };
        let mut seen = HashSet::new();
        let items = scrape_listing(&html, &rules, BASE, BASE, &mut seen);
        assert_eq!(items[0].id, "9-spawn");
        assert_eq!(items[0].title, "Spawn");
    }

    #[test]
    fn subtitle_prefix_strip_and_label() {
        let html = Html::parse_document(
            r#"<div><div class="card"><a href="/1-a.html">x</a>
                <p class="card__title">A</p>
                <ul class="info"><li>Year: 2019</li><li class="last">Last issue: #42</li></ul>
            </div></div>"#,
        );
        let rules = ItemRules {
            subtitle: Some(SubtitleRule {
                sel: ".info .last",
                strip_prefix: "Last issue:",
                label: "",
            }),
            ..self::rules()
        };
        let mut seen = HashSet::new();
        let items = scrape_listing(&html, &rules, BASE, BASE, &mut seen);
        assert_eq!(items[0].subtitle.as_deref(), Some("#42"));
    }
}
