use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::provider::MAX_FEATURE_BATCH;
use crate::resolve::DEFAULT_SEARCH_LIMIT;
use crate::spotify::DEFAULT_REQUESTS_PER_SECOND;

/// Configuration for watsong.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (WATSONG_* prefix)
/// 3. Config file (~/.config/watsong/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Spotify Web API bearer token.
    ///
    /// Can be set via:
    /// - ENV: WATSONG_SPOTIFY_ACCESS_TOKEN
    /// - Config: spotify_access_token = "..."
    pub spotify_access_token: Option<String>,

    /// Path to the SQLite memo database.
    ///
    /// Can be set via:
    /// - CLI: --db /path/to/db
    /// - ENV: WATSONG_DATABASE_PATH
    /// - Config: database_path = "/path/to/db"
    /// - Default: ~/.local/share/watsong/memo.db
    #[serde(default = "default_db_path")]
    pub database_path: PathBuf,

    /// Number of search results considered per album description (at most 50).
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,

    /// Tracks per batched feature request (at most 100).
    #[serde(default = "default_feature_batch_size")]
    pub feature_batch_size: usize,

    /// Request pacing for the Spotify client.
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// Logger options.
    #[serde(default)]
    pub logging: twyg::Opts,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spotify_access_token: None,
            database_path: default_db_path(),
            search_limit: default_search_limit(),
            feature_batch_size: default_feature_batch_size(),
            requests_per_second: default_requests_per_second(),
            logging: twyg::Opts::default(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/watsong/config.toml
    /// Reads environment variables with WATSONG_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("watsong");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder.build().context("Failed to build configuration")?;

        Ok(config)
    }

    /// Load configuration with custom database path.
    ///
    /// This is used when the --db CLI flag is provided.
    pub fn load_with_db_path(db_path: PathBuf) -> Result<Self> {
        let mut config = Self::load()?;
        config.database_path = db_path;
        Ok(config)
    }
}

/// Get the default database path.
///
/// Returns: ~/.local/share/watsong/memo.db (or platform equivalent)
fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("watsong")
        .join("memo.db")
}

const fn default_search_limit() -> u32 {
    DEFAULT_SEARCH_LIMIT
}

const fn default_feature_batch_size() -> usize {
    MAX_FEATURE_BATCH
}

const fn default_requests_per_second() -> u32 {
    DEFAULT_REQUESTS_PER_SECOND
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/watsong/config.toml
/// - macOS: ~/Library/Application Support/watsong/config.toml
/// - Windows: %APPDATA%\watsong\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("watsong")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Watsong Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (WATSONG_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Spotify Web API access token
# Used for album search, track listings and audio features
#
# Can also be set via:
# - Environment: WATSONG_SPOTIFY_ACCESS_TOKEN=your-token-here
spotify_access_token = "your-spotify-access-token-here"

# Path to the SQLite memo database
#
# Holds memoized search results, track listings and audio features so
# repeated lookups never hit the network
#
# Can also be set via:
# - CLI: watsong --db /custom/path.db prime albums.toml
# - Environment: WATSONG_DATABASE_PATH=/custom/path.db
#
# Default: Platform-specific data directory
#database_path = "/path/to/custom/memo.db"

# Search results considered per album description (at most 50)
#search_limit = 50

# Tracks per batched audio-features request (at most 100)
#feature_batch_size = 100

# Spotify request pacing
#requests_per_second = 10

#[logging]
#coloured = true
#level = "info"
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}
