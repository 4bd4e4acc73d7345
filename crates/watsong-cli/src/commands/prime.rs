use anyhow::Result;
use std::path::Path;
use watsong_catalog::{CatalogResolver, Config, FeatureAnnotator};

use super::albums::load_albums;

pub async fn run_prime(config: &Config, albums_path: &Path) -> Result<()> {
    let descriptions = load_albums(albums_path)?;
    if descriptions.is_empty() {
        println!("No albums listed in {}", albums_path.display());
        return Ok(());
    }

    log::info!("Priming memo for {} albums", descriptions.len());

    let client = super::spotify_client(config, super::Token::Required)?;
    let mut memo = super::open_memo(config)?;

    let resolver = CatalogResolver::new(&client)
        .with_search_limit(config.search_limit);
    let report = resolver.prime_cache(&mut memo, &descriptions).await;

    let tracks = report.tracks();
    let annotator = FeatureAnnotator::new(&client)
        .with_batch_size(config.feature_batch_size);
    let features = annotator.prime(&mut memo, &tracks).await;

    println!("\nPrime complete\n");
    println!("  Albums resolved:   {}", report.albums.len());
    println!("  Tracks listed:     {}", tracks.len());
    println!("  Features fetched:  {}", features.fetched);
    if features.missing > 0 {
        println!("  Features missing:  {}", features.missing);
    }
    if features.failed_chunks > 0 {
        println!("  Failed batches:    {}", features.failed_chunks);
    }

    for description in &report.unresolved {
        println!("  ✗ not found: {description}");
    }
    for (description, error) in &report.failed {
        println!("  ✗ failed: {description}: {error}");
    }

    Ok(())
}
