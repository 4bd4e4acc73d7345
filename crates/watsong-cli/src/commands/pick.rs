use anyhow::Result;
use std::path::Path;
use watsong_catalog::{CatalogResolver, Config, FeatureAnnotator};
use watsong_core::{Feel, Track};

use super::albums::load_albums;

pub async fn run_pick(
    config: &Config,
    albums_path: &Path,
    target: Feel,
    count: usize,
) -> Result<()> {
    let descriptions = load_albums(albums_path)?;

    let client = super::spotify_client(config, super::Token::OnMiss)?;
    let mut memo = super::open_memo(config)?;

    let resolver = CatalogResolver::new(&client)
        .with_search_limit(config.search_limit);
    let annotator = FeatureAnnotator::new(&client)
        .with_batch_size(config.feature_batch_size);

    let tracks = resolver.resolve_tracks(&mut memo, &descriptions).await;
    let tracks = annotator.annotate(&mut memo, tracks).await;
    memo.flush_all();

    let pool = annotated(tracks);
    if pool.is_empty() {
        println!("No tracks with audio features for the listed albums.");
        return Ok(());
    }

    let picked = watsong_search::select_scored(&target, &pool, count)?;

    println!(
        "\n{} of {} tracks closest to energy={} lyrics={} dance={} valence={}\n",
        picked.len(),
        pool.len(),
        target.energy(),
        target.lyrics(),
        target.dance(),
        target.valence()
    );
    for (rank, scored) in picked.iter().enumerate() {
        let track = scored.track;
        println!(
            "{:>3}. {} - {}  [{:.4}]",
            rank + 1,
            track.title,
            track.artists.join(", "),
            scored.distance
        );
        println!("     {}", track.uri);
    }

    Ok(())
}

/// Drop tracks the provider had no features for.
fn annotated(tracks: Vec<Track>) -> Vec<Track> {
    let total = tracks.len();
    let pool: Vec<Track> = tracks.into_iter().filter(Track::is_annotated).collect();
    if pool.len() < total {
        log::warn!(
            "Skipping {} tracks without audio features",
            total - pool.len()
        );
    }
    pool
}
