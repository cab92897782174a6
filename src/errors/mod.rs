use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderFeedError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Routing errors
    #[error("Unknown feed: {0}")]
    UnknownFeed(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    // Network errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    // Upstream feed errors
    #[error("Feed parsing failed: {0}")]
    FeedParse(String),

    // Render capability errors
    #[error("Render session failed: {0}")]
    Render(String),

    #[error("Timed out waiting for '{0}' in the rendered page")]
    RenderTimeout(String),

    // Extraction errors
    #[error("Article body container '{0}' not found")]
    MissingArticleBody(String),

    #[error("Unparseable publish date: {0}")]
    PublishedDate(String),

    // Storage errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RenderFeedResult<T> = Result<T, RenderFeedError>;
