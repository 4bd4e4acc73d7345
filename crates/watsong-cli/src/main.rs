use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use watsong_catalog::Config;
use watsong_core::DEFAULT_DIAL;
use watsong_search::DEFAULT_K;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "watsong", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the memo database (default: ~/.local/share/watsong/memo.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Warm the lookup memo for a list of albums
    ///
    /// Reads album descriptions from a `.json` array or a `.toml` file with
    /// `[[album]]` tables, each carrying a `title` and optional `artists`.
    /// For every album:
    ///
    /// - Searches the catalog by title and picks the first match
    /// - Fetches the album's track listing
    /// - Fetches audio features for every track, in batches
    ///
    /// Everything fetched is written to the memo database, so later `pick`
    /// runs over the same albums make no network calls.
    Prime {
        /// Album list (.json or .toml)
        albums: PathBuf,
    },
    /// Pick the tracks closest to a target feel
    ///
    /// Dials are non-negative numbers, usually between 0 and 1. A dial left
    /// out defaults to 0.02.
    Pick {
        /// Album list (.json or .toml)
        albums: PathBuf,

        /// Target energy
        #[arg(long, default_value_t = DEFAULT_DIAL)]
        energy: f64,

        /// Target lyrics (speechiness)
        #[arg(long, default_value_t = DEFAULT_DIAL)]
        lyrics: f64,

        /// Target danceability
        #[arg(long, default_value_t = DEFAULT_DIAL)]
        dance: f64,

        /// Target valence
        #[arg(long, default_value_t = DEFAULT_DIAL)]
        valence: f64,

        /// Number of tracks to pick
        #[arg(short = 'n', long = "count", default_value_t = DEFAULT_K)]
        count: usize,
    },
    /// Show memo entry counts
    Status,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Print an example config file
    Example,
    /// Create the config file if it does not exist
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.db {
        Some(db) => Config::load_with_db_path(db)?,
        None => Config::load()?,
    };

    twyg::setup(config.logging.clone())
        .map_err(|e| anyhow::anyhow!("Failed to set up logging: {e:?}"))?;

    // Ensure database directory exists
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    match cli.command {
        Commands::Prime { albums } => {
            commands::run_prime(&config, &albums).await?;
        }
        Commands::Pick {
            albums,
            energy,
            lyrics,
            dance,
            valence,
            count,
        } => {
            let target = watsong_core::Feel::new(energy, lyrics, dance, valence)?;
            commands::run_pick(&config, &albums, target, count).await?;
        }
        Commands::Status => {
            commands::show_status(&config)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show_config(&config)?,
            ConfigAction::Path => commands::config::show_path()?,
            ConfigAction::Example => commands::config::show_example()?,
            ConfigAction::Init => commands::config::init_config()?,
        },
    }

    Ok(())
}
