pub mod albums;
pub mod config;
pub mod pick;
pub mod prime;
pub mod status;

pub use pick::run_pick;
pub use prime::run_prime;
pub use status::show_status;

use anyhow::{Context, Result};
use watsong_catalog::{Config, MemoStore, SpotifyClient};
use watsong_core::schema::Database;

/// When a command needs a configured Spotify token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    /// Every run hits the network.
    Required,
    /// A warm memo answers without the network; misses fail and are logged.
    OnMiss,
}

fn access_token(config: &Config, need: Token) -> Result<&str> {
    match (config.spotify_access_token.as_deref(), need) {
        (Some(token), _) => Ok(token),
        (None, Token::OnMiss) => {
            log::warn!("No Spotify access token configured; only memoized lookups will succeed");
            Ok("")
        }
        (None, Token::Required) => anyhow::bail!(
            "No Spotify access token configured.\n\n\
             Set WATSONG_SPOTIFY_ACCESS_TOKEN or add spotify_access_token to {}",
            watsong_catalog::config::config_file_path().display()
        ),
    }
}

/// Build the Spotify client from the configured token.
fn spotify_client(config: &Config, need: Token) -> Result<SpotifyClient> {
    let token = access_token(config, need)?;
    let client = SpotifyClient::new(token)
        .context("Failed to create Spotify client")?
        .with_requests_per_second(config.requests_per_second);
    Ok(client)
}

/// Open the memo over the configured SQLite database.
fn open_memo(config: &Config) -> Result<MemoStore> {
    let db = Database::open(&config.database_path).with_context(|| {
        format!(
            "Failed to open memo database: {}",
            config.database_path.display()
        )
    })?;
    Ok(MemoStore::open(db))
}
