use std::time::Duration;

use reqwest::header::LOCATION;
use reqwest::{Client, ClientBuilder, StatusCode, Url};
use tokio::time::sleep;

use crate::config::SiteConfig;
use crate::error::{Result, SourceError};

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Redirect chains longer than this are abandoned with a degraded result.
const MAX_REDIRECTS: usize = 5;

/// Fixed request identity a site expects on every call. One profile per
/// site, applied to every outbound request — never varied per call.
#[derive(Clone, Debug)]
pub struct HeaderProfile {
    pub origin: &'static str,
    pub referer: &'static str,
    pub x_requested_with: &'static str,
}

/// Site-scoped HTTP client: a reqwest client carrying the site's header
/// profile, with https forced on outbound URLs and on redirect targets,
/// and blocking statuses turned into errors. Retry policy deliberately
/// lives with the caller, not here.
pub struct SiteClient {
    client: Client,
    min_request_interval: Duration,
}

impl SiteClient {
    pub fn new(config: &SiteConfig, profile: &HeaderProfile) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"
                .parse()
                .unwrap(),
        );
        headers.insert("Accept-Language", "en-US,en;q=0.5".parse().unwrap());
        headers.insert("Accept-Encoding", "gzip, deflate, br".parse().unwrap());
        headers.insert("Origin", profile.origin.parse().unwrap());
        headers.insert("Referer", profile.referer.parse().unwrap());
        headers.insert(
            "X-Requested-With",
            profile.x_requested_with.parse().unwrap(),
        );

        let client = ClientBuilder::new()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .gzip(true)
            .brotli(true)
            // Redirects are followed manually so Location can be rewritten.
            .redirect(reqwest::redirect::Policy::none())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            min_request_interval: config.min_request_interval(),
        })
    }

    /// Fetch a page and return its body text.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        if !self.min_request_interval.is_zero() {
            sleep(self.min_request_interval).await;
        }

        let mut url = force_https(url);
        for _ in 0..MAX_REDIRECTS {
            let response = self.client.get(&url).send().await?;
            let status = response.status();
            if status == StatusCode::FORBIDDEN {
                return Err(SourceError::Blocked {
                    status: status.as_u16(),
                    url,
                });
            }
            if status.is_redirection() {
                let Some(location) = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|value| value.to_str().ok())
                else {
                    break;
                };
                let target = resolve_location(&url, location);
                log::debug!("redirect {} -> {}", url, target);
                url = force_https(&target);
                continue;
            }
            return Ok(response.error_for_status()?.text().await?);
        }
        log::warn!("redirect chain from {} exceeded {} hops", url, MAX_REDIRECTS);
        Ok(String::new())
    }
}

/// Rewrite a plain-http URL to https. Sites that answer on both schemes
/// serve the anti-bot interstitial on http only.
pub fn force_https(url: &str) -> String {
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{}", rest),
        None => url.to_string(),
    }
}

/// Resolve a possibly-relative Location header against the request URL.
fn resolve_location(base: &str, location: &str) -> String {
    Url::parse(base)
        .and_then(|b| b.join(location))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| location.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn https_is_forced_on_http_urls() {
        assert_eq!(force_https("http://example.com/a"), "https://example.com/a");
        assert_eq!(force_https("https://example.com/a"), "https://example.com/a");
        assert_eq!(force_https("/relative"), "/relative");
    }

    #[test]
    fn relative_locations_resolve_against_the_request_url() {
        assert_eq!(
            resolve_location("https://example.com/a/b", "/c"),
            "https://example.com/c"
        );
        assert_eq!(
            resolve_location("https://example.com/a/", "http://other.com/x"),
            "http://other.com/x"
        );
    }

    #[tokio::test]
    async fn client_builds_with_a_profile() {
        let profile = HeaderProfile {
            origin: "https://example.com",
            referer: "https://example.com",
            x_requested_with: "com.example.app",
        };
        let config = SiteConfig::new("https://example.com", "https://example.com");
        assert!(SiteClient::new(&config, &profile).is_ok());
    }
}
