//! Source adapter for BatCave, a DLE-engine comic site. Listings are
//! scraped from the markup; chapter lists and reader pages come from the
//! JSON payload the site embeds under `window.__DATA__`.

use async_trait::async_trait;
use scraper::Html;
use serde::Deserialize;
use serde_json::Value;

use crate::config::SiteConfig;
use crate::embedded;
use crate::error::{Result, SourceError};
use crate::extract;
use crate::http_client::{HeaderProfile, SiteClient};
use crate::listing::{scrape_listing, IdRule, ImageRule, ItemRules, SubtitleRule, TitleRule};
use crate::models::{
    Chapter, ChapterPageList, HomeSection, Paged, PaginationState, SectionStyle, Series,
};
use crate::pagination::{self, NextPageRule};
use crate::sources::{Source, SourceInfo};

const BASE_URL: &str = "https://batcave.biz";
const DATA_MARKER: &str = "window.__DATA__";
const LANGUAGE: &str = "en";

const INFO: SourceInfo = SourceInfo {
    name: "BatCave",
    version: "0.1.0",
    description: "Comics from batcave.biz",
    author: "Karrot",
    base_url: BASE_URL,
    language: LANGUAGE,
    mature: true,
};

const HEADERS: HeaderProfile = HeaderProfile {
    origin: BASE_URL,
    referer: BASE_URL,
    x_requested_with: "com.batcave.android",
};

/// Landing-page "Popular" shelf: the item block is the anchor itself.
const POPULAR_RULES: ItemRules = ItemRules {
    item: ".poster.grid-item",
    title: TitleRule::Text(".poster__title"),
    id: IdRule::HrefSlug { link: "" },
    image: Some(ImageRule {
        sel: ".poster__img img",
        attrs: &["data-src", "src"],
    }),
    subtitle: Some(SubtitleRule {
        sel: ".poster__label--rate",
        strip_prefix: "",
        label: "Rating: ",
    }),
};

/// Catalogue pages (`/comix/`), also the region search results land in.
const CATALOGUE_RULES: ItemRules = ItemRules {
    item: "#dle-content .readed",
    title: TitleRule::Text(".readed__title a"),
    id: IdRule::HrefSlug {
        link: ".readed__title a",
    },
    image: Some(ImageRule {
        sel: "img",
        attrs: &["data-src", "src"],
    }),
    subtitle: Some(SubtitleRule {
        sel: ".readed__info li:last-child",
        strip_prefix: "Last issue:",
        label: "",
    }),
};

/// Landing-page "New Comics" shelf. The title node nests a chapter badge,
/// and the anchor sits above it.
const NEW_RULES: ItemRules = ItemRules {
    item: ".sect--latest .latest.grid-item",
    title: TitleRule::OwnText(".latest__title"),
    id: IdRule::EnclosingHrefSlug {
        inner: ".latest__title",
    },
    image: Some(ImageRule {
        sel: ".latest__img img",
        attrs: &["src", "data-src"],
    }),
    subtitle: Some(SubtitleRule {
        sel: ".latest__chapter a",
        strip_prefix: "",
        label: "",
    }),
};

/// Continuation pages of the new-comics feed drop the section wrapper.
const NEW_PAGE_RULES: ItemRules = ItemRules {
    item: ".latest.grid-item",
    title: TitleRule::OwnText(".latest__title"),
    id: IdRule::EnclosingHrefSlug {
        inner: ".latest__title",
    },
    image: Some(ImageRule {
        sel: ".latest__img img",
        attrs: &["src", "data-src"],
    }),
    subtitle: Some(SubtitleRule {
        sel: ".latest__chapter a",
        strip_prefix: "",
        label: "",
    }),
};

const PAGINATION: NextPageRule = NextPageRule::NumberedLinks {
    links: ".pagination a",
    next: "a.pagination__next",
};

/// Chapter entry of the `window.__DATA__` payload.
#[derive(Debug, Deserialize)]
struct ChapterEntry {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    posi: f32,
    #[serde(default)]
    date: String,
    #[serde(default)]
    title: String,
}

pub struct BatCave {
    client: SiteClient,
    config: SiteConfig,
}

impl BatCave {
    pub fn new() -> Result<Self> {
        let config = SiteConfig::load("batcave", SiteConfig::new(BASE_URL, BASE_URL));
        let client = SiteClient::new(&config, &HEADERS)?;
        Ok(Self { client, config })
    }

    fn catalogue_url(&self, page: u32) -> String {
        if page <= 1 {
            format!("{}/comix/", self.config.base_url)
        } else {
            format!("{}/comix/page/{}/", self.config.base_url, page)
        }
    }

    fn new_comics_url(&self, page: u32) -> String {
        if page <= 1 {
            format!("{}/", self.config.base_url)
        } else {
            format!("{}/page/{}/", self.config.base_url, page)
        }
    }

    fn search_url(&self, query: &str, page: u32) -> String {
        let query = query.trim().replace(' ', "%20");
        if page <= 1 {
            format!("{}/search/{}/", self.config.base_url, query)
        } else {
            format!("{}/search/{}/page/{}/", self.config.base_url, query, page)
        }
    }

    /// Fetch one listing page and emit its summaries plus the continuation.
    async fn listing_page(
        &self,
        url: &str,
        rules: &ItemRules,
        state: Option<PaginationState>,
    ) -> Result<Paged> {
        let state = state.unwrap_or_else(PaginationState::first);
        let body = self.client.get_text(url).await?;
        let document = Html::parse_document(&body);
        let mut seen = state.seen_ids;
        let items = scrape_listing(
            &document,
            rules,
            &self.config.base_url,
            &self.config.asset_host,
            &mut seen,
        );
        let next = pagination::advance(
            &document,
            &PAGINATION,
            PaginationState {
                page: state.page,
                seen_ids: seen,
            },
        );
        Ok(Paged { items, next })
    }
}

#[async_trait]
impl Source for BatCave {
    fn info(&self) -> &SourceInfo {
        &INFO
    }

    fn series_url(&self, series_id: &str) -> String {
        format!("{}/{}.html", self.config.base_url, series_id)
    }

    async fn home_sections(&self, emit: &mut (dyn FnMut(HomeSection) + Send)) -> Result<()> {
        let landing_url = format!("{}/", self.config.base_url);
        let catalogue_url = self.catalogue_url(1);
        // Landing and catalogue pages are independent: fetch both, join,
        // then parse.
        let (landing_body, catalogue_body) = tokio::try_join!(
            self.client.get_text(&landing_url),
            self.client.get_text(&catalogue_url),
        )?;
        let landing = Html::parse_document(&landing_body);
        let catalogue = Html::parse_document(&catalogue_body);
        for section in parse_home(&landing, &catalogue, &self.config) {
            emit(section);
        }
        Ok(())
    }

    async fn series_detail(&self, series_id: &str) -> Result<Series> {
        let url = self.series_url(series_id);
        let body = self.client.get_text(&url).await?;
        let document = Html::parse_document(&body);
        Ok(parse_series(&document, series_id, &self.config))
    }

    async fn search(&self, query: &str, state: Option<PaginationState>) -> Result<Paged> {
        let page = state.as_ref().map(|s| s.page).unwrap_or(1);
        let url = if query.trim().is_empty() {
            self.catalogue_url(page)
        } else {
            self.search_url(query, page)
        };
        self.listing_page(&url, &CATALOGUE_RULES, state).await
    }

    async fn section_page(
        &self,
        section_id: &str,
        state: Option<PaginationState>,
    ) -> Result<Paged> {
        let page = state.as_ref().map(|s| s.page).unwrap_or(1);
        match section_id {
            "catalogue" => {
                let url = self.catalogue_url(page);
                self.listing_page(&url, &CATALOGUE_RULES, state).await
            }
            "new-comics" => {
                let url = self.new_comics_url(page);
                self.listing_page(&url, &NEW_PAGE_RULES, state).await
            }
            other => Err(SourceError::UnsupportedSection(other.to_string())),
        }
    }

    async fn chapter_list(&self, series_id: &str) -> Result<Vec<Chapter>> {
        let url = self.series_url(series_id);
        let body = self.client.get_text(&url).await?;
        let document = Html::parse_document(&body);
        Ok(parse_chapter_list(&document))
    }

    async fn chapter_pages(&self, series_id: &str, chapter_id: &str) -> Result<ChapterPageList> {
        let url = format!(
            "{}/reader/{}/{}",
            self.config.base_url,
            series_numeric_id(series_id),
            chapter_id
        );
        let body = self.client.get_text(&url).await?;
        let document = Html::parse_document(&body);
        Ok(ChapterPageList {
            chapter_id: chapter_id.to_string(),
            series_id: series_id.to_string(),
            pages: parse_chapter_pages(&document, &self.config),
        })
    }
}

/// The numeric prefix of a DLE series slug ("123-dark-knight" -> "123").
fn series_numeric_id(series_id: &str) -> &str {
    series_id.split('-').next().unwrap_or(series_id)
}

/// The three fixed home shelves, in emission order.
pub fn parse_home(landing: &Html, catalogue: &Html, config: &SiteConfig) -> Vec<HomeSection> {
    let mut sections = Vec::new();

    let mut seen = Default::default();
    sections.push(HomeSection {
        id: "popular",
        title: "Popular",
        style: SectionStyle::LargeRow,
        items: scrape_listing(
            landing,
            &POPULAR_RULES,
            &config.base_url,
            &config.asset_host,
            &mut seen,
        ),
        has_more: false,
    });

    let mut seen = Default::default();
    sections.push(HomeSection {
        id: "catalogue",
        title: "Catalogue",
        style: SectionStyle::NormalRow,
        items: scrape_listing(
            catalogue,
            &CATALOGUE_RULES,
            &config.base_url,
            &config.asset_host,
            &mut seen,
        ),
        has_more: true,
    });

    let mut seen = Default::default();
    sections.push(HomeSection {
        id: "new-comics",
        title: "New Comics",
        style: SectionStyle::NormalRow,
        items: scrape_listing(
            landing,
            &NEW_RULES,
            &config.base_url,
            &config.asset_host,
            &mut seen,
        ),
        has_more: true,
    });

    sections
}

pub fn parse_series(document: &Html, series_id: &str, config: &SiteConfig) -> Series {
    let root = document.root_element();
    let title = extract::text_of(&root, "h1.page__title");
    let cover_url = extract::absolutize(
        &extract::attr_of(&root, ".page__poster img", &["data-src", "src"]),
        &config.asset_host,
    );

    let mut status_text = String::new();
    let mut publisher = None;
    let list_sel = scraper::Selector::parse(".page__list li").unwrap();
    for li in document.select(&list_sel) {
        let text = li.text().collect::<String>();
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if let Some(value) = text.strip_prefix("Status:") {
            status_text = value.trim().to_string();
        } else if let Some(value) = text.strip_prefix("Publisher:") {
            let value = value.trim();
            if !value.is_empty() {
                publisher = Some(value.to_string());
            }
        }
    }

    let tag_sel = scraper::Selector::parse(".page__tags a").unwrap();
    let tags = document
        .select(&tag_sel)
        .map(|a| extract::tag_from_label(a.text().collect::<String>().trim()))
        .filter(|tag| !tag.id.is_empty())
        .collect();

    Series {
        id: series_id.to_string(),
        titles: vec![title],
        cover_url,
        description: extract::text_of(&root, ".page__text"),
        status: extract::parse_status(&status_text),
        rating: extract::first_number(&extract::text_of(&root, ".page__rating .rating__value")),
        tags,
        author: None,
        publisher,
    }
}

pub fn parse_chapter_list(document: &Html) -> Vec<Chapter> {
    let Some(mut payload) = embedded::extract_marked_json(document, DATA_MARKER) else {
        return Vec::new();
    };
    let entries: Vec<ChapterEntry> = match serde_json::from_value(payload["chapters"].take()) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("chapter payload has an unexpected shape: {}", e);
            return Vec::new();
        }
    };

    let mut chapters = Vec::new();
    for entry in entries {
        let Some(id) = native_chapter_id(entry.id.as_ref()) else {
            log::warn!("dropping chapter entry without a numeric id: {:?}", entry.id);
            continue;
        };
        let title = if entry.title.trim().is_empty() {
            format!("Chapter {}", entry.posi)
        } else {
            entry.title.trim().to_string()
        };
        chapters.push(Chapter {
            id,
            number: entry.posi,
            title,
            volume: 0.0,
            date: extract::parse_dmy_date(&entry.date).unwrap_or_default(),
            language: LANGUAGE.to_string(),
        });
    }
    chapters
}

/// Native chapter ids are numeric; entries carrying anything else are
/// dropped by the caller.
fn native_chapter_id(raw: Option<&Value>) -> Option<String> {
    match raw {
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::String(s)) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
            Some(s.clone())
        }
        _ => None,
    }
}

pub fn parse_chapter_pages(document: &Html, config: &SiteConfig) -> Vec<String> {
    let Some(payload) = embedded::extract_marked_json(document, DATA_MARKER) else {
        return Vec::new();
    };
    let Some(images) = payload["images"].as_array() else {
        log::warn!("reader payload carries no images array");
        return Vec::new();
    };
    images
        .iter()
        .filter_map(|value| value.as_str())
        .map(|url| extract::absolutize(url, &config.asset_host))
        .collect()
}
