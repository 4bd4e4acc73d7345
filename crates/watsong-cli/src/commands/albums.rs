use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use watsong_core::AlbumDescription;

/// TOML album list: a sequence of `[[album]]` tables.
#[derive(Debug, Deserialize)]
struct AlbumFile {
    #[serde(default)]
    album: Vec<AlbumDescription>,
}

/// Read album descriptions from a `.json` array or a `.toml` file.
pub fn load_albums(path: &Path) -> Result<Vec<AlbumDescription>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read album list: {}", path.display()))?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("json") => parse_json(&contents),
        Some("toml") => parse_toml(&contents),
        _ => anyhow::bail!(
            "Unsupported album list format: {}\n\nUse a .json or .toml file",
            path.display()
        ),
    }
    .with_context(|| format!("Failed to parse album list: {}", path.display()))
}

fn parse_json(contents: &str) -> Result<Vec<AlbumDescription>> {
    Ok(serde_json::from_str(contents)?)
}

fn parse_toml(contents: &str) -> Result<Vec<AlbumDescription>> {
    let file: AlbumFile = toml::from_str(contents)?;
    Ok(file.album)
}
