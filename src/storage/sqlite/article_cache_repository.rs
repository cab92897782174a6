use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::OptionalExtension;
use tracing::info;

use crate::domain::CachedArticle;
use crate::errors::{RenderFeedError, RenderFeedResult};
use crate::storage::sqlite::SqliteStorage;
use crate::storage::traits::ArticleCacheRepository;

/// Sqlite-backed content cache. Each site gets its own table, named after
/// the site's registry name, created lazily when the handle is built.
pub struct SqliteArticleCacheRepository {
    storage: SqliteStorage,
    table: String,
}

impl SqliteArticleCacheRepository {
    pub fn new(storage: SqliteStorage, site_name: &str) -> RenderFeedResult<Self> {
        if site_name.is_empty()
            || !site_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(RenderFeedError::Config(format!(
                "'{}' is not usable as a cache table name",
                site_name
            )));
        }

        let repo = Self {
            storage,
            table: site_name.to_string(),
        };
        repo.ensure_table()?;
        Ok(repo)
    }

    fn ensure_table(&self) -> RenderFeedResult<()> {
        let conn = self.storage.connection()?;
        conn.execute_batch(&format!(
            r#"CREATE TABLE IF NOT EXISTS "{}" (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                published_at TEXT NOT NULL,
                author TEXT,
                body TEXT NOT NULL
            );"#,
            self.table
        ))?;
        Ok(())
    }

    /// Stored timestamps are normalized to second precision UTC so that
    /// lexicographic ordering matches chronological ordering.
    fn encode_published(published_at: &DateTime<Utc>) -> String {
        published_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    fn decode_published(raw: &str) -> RenderFeedResult<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| RenderFeedError::PublishedDate(raw.to_string()))
    }
}

impl ArticleCacheRepository for SqliteArticleCacheRepository {
    fn lookup(&self, url: &str) -> RenderFeedResult<Option<CachedArticle>> {
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare(&format!(
            r#"SELECT id, title, published_at, author, body FROM "{}" WHERE id = ?1"#,
            self.table
        ))?;

        let row: Option<(String, String, String, Option<String>, String)> = stmt
            .query_row([url], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            })
            .optional()?;

        match row {
            Some((id, title, published_raw, author, body)) => {
                let published_at = Self::decode_published(&published_raw)?;
                Ok(Some(CachedArticle::new(id, title, published_at, author, body)))
            }
            None => Ok(None),
        }
    }

    fn insert(&self, article: &CachedArticle) -> RenderFeedResult<()> {
        let conn = self.storage.connection()?;
        conn.execute(
            &format!(
                r#"INSERT OR IGNORE INTO "{}" (id, title, published_at, author, body)
                   VALUES (?1, ?2, ?3, ?4, ?5)"#,
                self.table
            ),
            (
                &article.id,
                &article.title,
                Self::encode_published(&article.published_at),
                &article.author,
                &article.body,
            ),
        )?;
        Ok(())
    }

    fn prune(&self, max_entries: usize) -> RenderFeedResult<usize> {
        let conn = self.storage.connection()?;
        let count: usize = conn.query_row(
            &format!(r#"SELECT count(id) FROM "{}""#, self.table),
            [],
            |row| row.get(0),
        )?;

        if count <= max_entries {
            return Ok(0);
        }

        let to_prune = count - max_entries;
        let removed = conn.execute(
            &format!(
                r#"DELETE FROM "{table}" WHERE id IN
                   (SELECT id FROM "{table}" ORDER BY published_at ASC LIMIT ?1)"#,
                table = self.table
            ),
            [to_prune],
        )?;

        info!(site = %self.table, removed, "pruned old cache entries");
        Ok(removed)
    }

    fn flush(&self) -> RenderFeedResult<()> {
        let conn = self.storage.connection()?;
        conn.execute(&format!(r#"DELETE FROM "{}""#, self.table), [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn setup() -> SqliteArticleCacheRepository {
        let storage = SqliteStorage::in_memory().unwrap();
        SqliteArticleCacheRepository::new(storage, "test_site").unwrap()
    }

    fn article(url: &str, day: u32) -> CachedArticle {
        CachedArticle::new(
            url.to_string(),
            format!("Article {}", day),
            Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap(),
            Some("Jo Writer".to_string()),
            format!("<p>body {}</p>", day),
        )
    }

    #[test]
    fn test_lookup_miss_is_none() {
        let repo = setup();
        assert!(repo.lookup("https://example.com/missing").unwrap().is_none());
    }

    #[test]
    fn test_insert_then_lookup_roundtrip() {
        let repo = setup();
        let original = article("https://example.com/a1", 1);

        repo.insert(&original).unwrap();
        let recovered = repo.lookup("https://example.com/a1").unwrap().unwrap();

        assert_eq!(recovered, original);
    }

    #[test]
    fn test_duplicate_insert_is_a_no_op() {
        let repo = setup();
        let first = article("https://example.com/a1", 1);
        let mut second = first.clone();
        second.body = "<p>rewritten</p>".to_string();

        repo.insert(&first).unwrap();
        repo.insert(&second).unwrap();

        let recovered = repo.lookup("https://example.com/a1").unwrap().unwrap();
        assert_eq!(recovered.body, "<p>body 1</p>");
    }

    #[test]
    fn test_prune_keeps_most_recent() {
        let repo = setup();
        for day in 1..=10 {
            repo.insert(&article(&format!("https://example.com/a{}", day), day))
                .unwrap();
        }

        let removed = repo.prune(3).unwrap();
        assert_eq!(removed, 7);

        // The three latest survive, everything older is gone.
        for day in 8..=10 {
            assert!(repo
                .lookup(&format!("https://example.com/a{}", day))
                .unwrap()
                .is_some());
        }
        for day in 1..=7 {
            assert!(repo
                .lookup(&format!("https://example.com/a{}", day))
                .unwrap()
                .is_none());
        }
    }

    #[test]
    fn test_prune_under_limit_is_a_no_op() {
        let repo = setup();
        repo.insert(&article("https://example.com/a1", 1)).unwrap();

        assert_eq!(repo.prune(3).unwrap(), 0);
        assert!(repo.lookup("https://example.com/a1").unwrap().is_some());
    }

    #[test]
    fn test_flush_empties_the_table() {
        let repo = setup();
        for day in 1..=3 {
            repo.insert(&article(&format!("https://example.com/a{}", day), day))
                .unwrap();
        }

        repo.flush().unwrap();

        for day in 1..=3 {
            assert!(repo
                .lookup(&format!("https://example.com/a{}", day))
                .unwrap()
                .is_none());
        }
    }

    #[test]
    fn test_sites_get_separate_tables() {
        let storage = SqliteStorage::in_memory().unwrap();
        let first = SqliteArticleCacheRepository::new(storage.clone(), "site_a").unwrap();
        let second = SqliteArticleCacheRepository::new(storage, "site_b").unwrap();

        first.insert(&article("https://example.com/a1", 1)).unwrap();

        assert!(second.lookup("https://example.com/a1").unwrap().is_none());
        assert!(first.lookup("https://example.com/a1").unwrap().is_some());
    }

    #[test]
    fn test_rejects_unusable_site_names() {
        let storage = SqliteStorage::in_memory().unwrap();
        assert!(SqliteArticleCacheRepository::new(storage.clone(), "bad-name;").is_err());
        assert!(SqliteArticleCacheRepository::new(storage, "").is_err());
    }
}
