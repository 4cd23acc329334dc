//! Source adapter for ReadAllComics, a WordPress comic archive. Relative
//! image paths resolve against a Blogspot asset host rather than the page
//! host, and chapter metadata comes from free-text title heuristics.

use async_trait::async_trait;
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};

use crate::config::SiteConfig;
use crate::error::{Result, SourceError};
use crate::extract;
use crate::http_client::{HeaderProfile, SiteClient};
use crate::listing::{scrape_listing, IdRule, ImageRule, ItemRules, SubtitleRule, TitleRule};
use crate::models::{
    Chapter, ChapterPageList, HomeSection, Paged, PaginationState, SectionStyle, Series,
    SeriesStatus,
};
use crate::pagination::{self, NextPageRule};
use crate::sources::{Source, SourceInfo};

const BASE_URL: &str = "https://readallcomics.com";
const ASSET_HOST: &str = "https://2.bp.blogspot.com";
const LANGUAGE: &str = "en";

const INFO: SourceInfo = SourceInfo {
    name: "ReadAllComics",
    version: "0.1.0",
    description: "Comics from readallcomics.com",
    author: "Karrot",
    base_url: BASE_URL,
    language: LANGUAGE,
    mature: true,
};

// The site accepts the same client identity header as the BatCave app.
const HEADERS: HeaderProfile = HeaderProfile {
    origin: BASE_URL,
    referer: BASE_URL,
    x_requested_with: "com.batcave.android",
};

/// Landing/browse grid. The series id hides in the post's class list.
const CATALOGUE_RULES: ItemRules = ItemRules {
    item: "#post-area .post",
    title: TitleRule::AttrOrText(".pinbin-copy a"),
    id: IdRule::ClassCapture {
        pattern: r"category-([^\s]+)",
    },
    image: Some(ImageRule {
        sel: "img",
        attrs: &["data-src", "src"],
    }),
    subtitle: Some(SubtitleRule {
        sel: ".pinbin-copy span",
        strip_prefix: "",
        label: "",
    }),
};

/// Search results live in a plain link list with no cover images.
const SEARCH_RULES: ItemRules = ItemRules {
    item: ".list-story li",
    title: TitleRule::AttrOrText("a"),
    id: IdRule::HrefLastSegment {
        link: "a",
        require: "/category/",
    },
    image: None,
    subtitle: None,
};

const PAGINATION: NextPageRule = NextPageRule::Control(".next.page-numbers");

pub struct ReadAllComics {
    client: SiteClient,
    config: SiteConfig,
}

impl ReadAllComics {
    pub fn new() -> Result<Self> {
        let config = SiteConfig::load("readallcomics", SiteConfig::new(BASE_URL, ASSET_HOST));
        let client = SiteClient::new(&config, &HEADERS)?;
        Ok(Self { client, config })
    }

    fn browse_url(&self, page: u32) -> String {
        if page <= 1 {
            format!("{}/", self.config.base_url)
        } else {
            format!("{}/page/{}/", self.config.base_url, page)
        }
    }

    fn search_query_url(&self, query: &str) -> String {
        format!(
            "{}/?story={}&s=&type=comic",
            self.config.base_url,
            query.trim().replace(' ', "+")
        )
    }

    /// Fetch one browse page and emit its summaries plus the continuation.
    async fn browse_page(&self, state: Option<PaginationState>) -> Result<Paged> {
        let state = state.unwrap_or_else(PaginationState::first);
        let body = self.client.get_text(&self.browse_url(state.page)).await?;
        let document = Html::parse_document(&body);
        let mut seen = state.seen_ids;
        let items = scrape_listing(
            &document,
            &CATALOGUE_RULES,
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
impl Source for ReadAllComics {
    fn info(&self) -> &SourceInfo {
        &INFO
    }

    fn series_url(&self, series_id: &str) -> String {
        format!("{}/category/{}", self.config.base_url, series_id)
    }

    async fn home_sections(&self, emit: &mut (dyn FnMut(HomeSection) + Send)) -> Result<()> {
        let body = self.client.get_text(&self.browse_url(1)).await?;
        let document = Html::parse_document(&body);
        let mut seen = Default::default();
        let items = scrape_listing(
            &document,
            &CATALOGUE_RULES,
            &self.config.base_url,
            &self.config.asset_host,
            &mut seen,
        );
        emit(HomeSection {
            id: "catalogue",
            title: "Catalogue",
            style: SectionStyle::LargeRow,
            items,
            has_more: true,
        });
        Ok(())
    }

    async fn series_detail(&self, series_id: &str) -> Result<Series> {
        let body = self.client.get_text(&self.series_url(series_id)).await?;
        let document = Html::parse_document(&body);
        Ok(parse_series(&document, series_id, &self.config))
    }

    async fn search(&self, query: &str, state: Option<PaginationState>) -> Result<Paged> {
        if query.trim().is_empty() {
            return self.browse_page(state).await;
        }
        let state = state.unwrap_or_else(PaginationState::first);
        let body = self.client.get_text(&self.search_query_url(query)).await?;
        let document = Html::parse_document(&body);
        let mut seen = state.seen_ids;
        let items = scrape_listing(
            &document,
            &SEARCH_RULES,
            &self.config.base_url,
            &self.config.asset_host,
            &mut seen,
        );
        // The search endpoint returns everything on one page.
        Ok(Paged { items, next: None })
    }

    async fn section_page(
        &self,
        section_id: &str,
        state: Option<PaginationState>,
    ) -> Result<Paged> {
        match section_id {
            "catalogue" => self.browse_page(state).await,
            other => Err(SourceError::UnsupportedSection(other.to_string())),
        }
    }

    async fn chapter_list(&self, series_id: &str) -> Result<Vec<Chapter>> {
        let body = self.client.get_text(&self.series_url(series_id)).await?;
        let document = Html::parse_document(&body);
        Ok(parse_chapters(&document))
    }

    async fn chapter_pages(&self, series_id: &str, chapter_id: &str) -> Result<ChapterPageList> {
        let url = format!("{}/{}", self.config.base_url, chapter_id);
        let body = self.client.get_text(&url).await?;
        let document = Html::parse_document(&body);
        Ok(ChapterPageList {
            chapter_id: chapter_id.to_string(),
            series_id: series_id.to_string(),
            pages: parse_pages(&document, &self.config),
        })
    }
}

pub fn parse_series(document: &Html, series_id: &str, config: &SiteConfig) -> Series {
    let root = document.root_element();
    let title = extract::text_of(&root, "h1");
    let cover_url = extract::absolutize(
        &extract::attr_of(&root, ".description-archive img", &["src"]),
        &config.asset_host,
    );

    // The info block is a run of <strong> lines: publisher, genres, and
    // free-text description share the same markup and are told apart by
    // their text.
    let strong_sel = Selector::parse(".b strong").unwrap();
    let mut description_lines: Vec<String> = Vec::new();
    let mut genres_text = String::new();
    let mut publisher = None;
    for strong in document.select(&strong_sel) {
        let Some(parent) = strong.parent().and_then(ElementRef::wrap) else {
            continue;
        };
        let text = parent.text().collect::<String>().trim().to_string();
        if text.starts_with("Vol") {
            continue;
        }
        if text.contains("Publisher:") {
            let value = text.replace("Publisher:", "").trim().to_string();
            if !value.is_empty() {
                publisher = Some(value);
            }
            continue;
        }
        if text.contains("Genres:") {
            genres_text = strong.text().collect::<String>();
            continue;
        }
        if !text.is_empty() {
            description_lines.push(text);
        }
    }

    let tags = genres_text
        .split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(extract::tag_from_label)
        .collect();

    Series {
        id: series_id.to_string(),
        titles: vec![title],
        cover_url,
        description: description_lines.join("\n"),
        // The site lists running series only and shows no status element.
        status: SeriesStatus::Ongoing,
        rating: 0.0,
        tags,
        author: None,
        publisher,
    }
}

pub fn parse_chapters(document: &Html) -> Vec<Chapter> {
    let item_sel = Selector::parse(".list-story li").unwrap();
    let link_sel = Selector::parse("a").unwrap();
    let mut chapters = Vec::new();
    for item in document.select(&item_sel) {
        let Some(link) = item.select(&link_sel).next() else {
            continue;
        };
        let href = link.value().attr("href").unwrap_or("");
        let title = link.text().collect::<String>().trim().to_string();
        let Some(id) = extract::last_path_segment(href) else {
            log::debug!("skipping chapter entry without a usable link: {:?}", title);
            continue;
        };
        let year = extract::year_from_title(&title);
        chapters.push(Chapter {
            id,
            number: extract::chapter_number_from_title(&title),
            volume: extract::volume_from_title(&title),
            date: NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or_default(),
            language: LANGUAGE.to_string(),
            title,
        });
    }
    chapters
}

pub fn parse_pages(document: &Html, config: &SiteConfig) -> Vec<String> {
    let img_sel = Selector::parse(r#"img[decoding="async"]"#).unwrap();
    document
        .select(&img_sel)
        .filter_map(|img| img.value().attr("src"))
        .map(str::trim)
        .filter(|src| !src.is_empty() && !src.contains("preloader.gif"))
        .map(|src| extract::absolutize(src, &config.asset_host))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SiteConfig {
        SiteConfig::new(BASE_URL, ASSET_HOST)
    }

    const BROWSE: &str = r#"
        <div id="post-area">
            <div class="post category-batman-2016">
                <img data-src="/img/batman.jpg">
                <div class="pinbin-copy">
                    <a title="Batman (2016)" href="https://readallcomics.com/category/batman-2016">Batman</a>
                    <span>May 2024</span>
                </div>
            </div>
            <div class="post category-flash-rebirth">
                <img src="https://2.bp.blogspot.com/img/flash.jpg">
                <div class="pinbin-copy">
                    <a href="https://readallcomics.com/category/flash-rebirth">Flash: Rebirth</a>
                    <span>April 2024</span>
                </div>
            </div>
        </div>
        <a class="next page-numbers" href="/page/2/">Next</a>"#;

    #[test]
    fn browse_grid_parses_with_class_ids() {
        let document = Html::parse_document(BROWSE);
        let mut seen = Default::default();
        let items = scrape_listing(&document, &CATALOGUE_RULES, BASE_URL, ASSET_HOST, &mut seen);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "batman-2016");
        assert_eq!(items[0].title, "Batman (2016)");
        assert_eq!(
            items[0].cover_url,
            "https://2.bp.blogspot.com/img/batman.jpg"
        );
        assert_eq!(items[0].subtitle.as_deref(), Some("May 2024"));
        assert!(pagination::has_next_page(&document, &PAGINATION, 1));
    }

    #[test]
    fn search_list_parses_without_images() {
        let document = Html::parse_document(
            r#"<ul class="list-story">
                <li><a title="Saga" href="https://readallcomics.com/category/saga/">Saga</a></li>
                <li><a href="https://readallcomics.com/about/">About us</a></li>
            </ul>"#,
        );
        let mut seen = Default::default();
        let items = scrape_listing(&document, &SEARCH_RULES, BASE_URL, ASSET_HOST, &mut seen);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "saga");
        assert_eq!(items[0].cover_url, "");
    }

    #[test]
    fn series_detail_splits_info_lines() {
        let document = Html::parse_document(
            r#"
            <h1>Weird Western</h1>
            <div class="description-archive"><img src="/img/ww.jpg"></div>
            <div class="b"><p><strong>A bounty hunter rides again.</strong></p></div>
            <div class="b"><p><strong>Vol 2 collects issues 1-5.</strong></p></div>
            <div class="b"><p>Publisher: <strong>Image Comics</strong></p></div>
            <div class="b"><p>Genres: <strong>Western, Action-Adventure</strong></p></div>"#,
        );
        let series = parse_series(&document, "weird-western", &config());
        assert_eq!(series.titles, ["Weird Western"]);
        assert_eq!(series.cover_url, "https://2.bp.blogspot.com/img/ww.jpg");
        assert_eq!(series.description, "A bounty hunter rides again.");
        assert_eq!(series.publisher.as_deref(), Some("Image Comics"));
        assert_eq!(series.status, SeriesStatus::Ongoing);
        assert_eq!(series.rating, 0.0);
        let tag_ids: Vec<&str> = series.tags.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(tag_ids, ["western", "actionadventure"]);
    }

    #[test]
    fn chapter_titles_drive_the_number_heuristics() {
        let document = Html::parse_document(
            r#"<ul class="list-story">
                <li><a href="https://readallcomics.com/weird-western-v2-05-2015/">Weird Western v2 05 (2015)</a></li>
                <li><a href="https://readallcomics.com/x-files-2016/">X-Files (2016)</a></li>
                <li><span>no link here</span></li>
            </ul>"#,
        );
        let chapters = parse_chapters(&document);
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].id, "weird-western-v2-05-2015");
        assert_eq!(chapters[0].number, 5.0);
        assert_eq!(chapters[0].volume, 2.0);
        assert_eq!(chapters[0].date, NaiveDate::from_ymd_opt(2015, 1, 1).unwrap());
        // The leading number is a year, not a chapter.
        assert_eq!(chapters[1].number, 0.0);
        assert_eq!(chapters[1].date, NaiveDate::from_ymd_opt(2016, 1, 1).unwrap());
        assert_eq!(chapters[1].language, "en");
    }

    #[test]
    fn reader_images_skip_placeholders() {
        let document = Html::parse_document(
            r#"
            <img decoding="async" src=" https://cdn.example.com/p1.jpg ">
            <img decoding="async" src="/p2.jpg">
            <img decoding="async" src="https://cdn.example.com/preloader.gif">
            <img src="https://cdn.example.com/not-a-page.jpg">"#,
        );
        let pages = parse_pages(&document, &config());
        assert_eq!(
            pages,
            [
                "https://cdn.example.com/p1.jpg",
                "https://2.bp.blogspot.com/p2.jpg"
            ]
        );
    }
}
