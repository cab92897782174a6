pub mod sqlite;
pub mod traits;

pub use sqlite::{SqliteArticleCacheRepository, SqliteStorage};
pub use traits::ArticleCacheRepository;
