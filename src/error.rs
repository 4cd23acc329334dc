use thiserror::Error;

/// Fatal failures of a source call. Markup drift is deliberately not in
/// here: selector misses, unparseable fields and malformed embedded
/// payloads degrade to defaults or empty results instead of failing the
/// call.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("blocked response {status} from {url}")]
    Blocked { status: u16, url: String },

    #[error("unsupported section id: {0}")]
    UnsupportedSection(String),
}

pub type Result<T> = std::result::Result<T, SourceError>;
