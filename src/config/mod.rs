use crate::errors::{RenderFeedError, RenderFeedResult};

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub webdriver_url: String,
    pub max_cache_entries: usize,
}

impl Config {
    /// Get the directory where the executable is located
    fn exe_dir() -> Option<std::path::PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    pub fn from_env() -> RenderFeedResult<Self> {
        let exe_dir = Self::exe_dir();

        // Try to load .env from executable's directory first
        if let Some(ref dir) = exe_dir {
            let env_path = dir.join(".env");
            if env_path.exists() {
                dotenvy::from_path(&env_path).ok();
            }
        }
        // Fall back to current directory
        dotenvy::dotenv().ok();

        // Default db_path is relative to executable directory
        let db_path = std::env::var("RENDERFEED_DB_PATH").unwrap_or_else(|_| {
            exe_dir
                .map(|d| d.join("renderfeed.db").to_string_lossy().into_owned())
                .unwrap_or_else(|| "./renderfeed.db".to_string())
        });

        let webdriver_url = std::env::var("RENDERFEED_WEBDRIVER_URL")
            .unwrap_or_else(|_| "http://localhost:9515".to_string());

        let max_cache_entries = match std::env::var("RENDERFEED_MAX_CACHE_ENTRIES") {
            Ok(raw) => raw.parse().map_err(|_| {
                RenderFeedError::Config(format!(
                    "RENDERFEED_MAX_CACHE_ENTRIES must be a positive integer, got '{}'",
                    raw
                ))
            })?,
            Err(_) => 100,
        };

        Ok(Self {
            db_path,
            webdriver_url,
            max_cache_entries,
        })
    }
}
