use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Per-site constants. Everything configurable about a source lives here:
/// the base domain, the host used to resolve relative image paths (which
/// may be a CDN rather than the site itself), the request timeout, and the
/// minimum spacing between outbound requests.
#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    pub base_url: String,
    pub asset_host: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_min_request_interval_ms")]
    pub min_request_interval_ms: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_min_request_interval_ms() -> u64 {
    200
}

impl SiteConfig {
    pub fn new(base_url: &str, asset_host: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            asset_host: asset_host.to_string(),
            timeout_secs: default_timeout_secs(),
            min_request_interval_ms: default_min_request_interval_ms(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }

    /// Load the `[<section>]` table from `sources.toml` when the file
    /// exists and parses; otherwise keep the built-in defaults.
    pub fn load(section: &str, fallback: Self) -> Self {
        let path = Path::new("sources.toml");
        if path.exists() {
            if let Ok(content) = fs::read_to_string(path) {
                if let Ok(table) = toml::from_str::<toml::Table>(&content) {
                    if let Some(value) = table.get(section) {
                        match value.clone().try_into::<Self>() {
                            Ok(config) => return config,
                            Err(e) => {
                                log::warn!("ignoring bad [{}] table in sources.toml: {}", section, e)
                            }
                        }
                    }
                }
            }
        }
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_fields_are_omitted() {
        let config: SiteConfig = toml::from_str(
            r#"
            base_url = "https://example.com"
            asset_host = "https://cdn.example.com"
            "#,
        )
        .unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.min_request_interval(), Duration::from_millis(200));
    }

    #[test]
    fn missing_file_falls_back() {
        let fallback = SiteConfig::new("https://example.com", "https://example.com");
        let config = SiteConfig::load("nonexistent-section", fallback.clone());
        assert_eq!(config.base_url, fallback.base_url);
    }
}
