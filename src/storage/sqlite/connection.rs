use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::errors::{RenderFeedError, RenderFeedResult};

#[derive(Clone)]
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> RenderFeedResult<Self> {
        let conn = Connection::open(path)?;
        Self::configure(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn in_memory() -> RenderFeedResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn configure(conn: &Connection) -> RenderFeedResult<()> {
        // Feed builds for different sites may hit the same file concurrently;
        // let writers queue instead of failing immediately.
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        Ok(())
    }

    pub fn connection(&self) -> Result<std::sync::MutexGuard<'_, Connection>, RenderFeedError> {
        self.conn
            .lock()
            .map_err(|_| RenderFeedError::Database(rusqlite::Error::InvalidQuery))
    }
}
