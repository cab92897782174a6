pub mod article;
pub mod entry;
pub mod feed;

pub use article::CachedArticle;
pub use entry::Entry;
pub use feed::{FeedDocument, FeedItem, SourceFeed, SourceMeta};
