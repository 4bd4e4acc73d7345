//! Album resolution.
//!
//! Turns an [`AlbumDescription`] into an [`Album`] with its track list,
//! consulting the memo before the provider at both steps (search, then
//! track listing).

use watsong_core::{Album, AlbumDescription, MemoKind, Track};

use crate::error::ProviderResult;
use crate::memo::MemoStore;
use crate::provider::{AlbumCandidate, CatalogProvider, SearchKind, SearchProvider, TrackStub};

/// Default number of search results considered per description.
pub const DEFAULT_SEARCH_LIMIT: u32 = 50;

/// Largest page the search endpoint accepts.
pub const MAX_SEARCH_LIMIT: u32 = 50;

/// Memo key for a search.
///
/// Only the title takes part; the artist list is used later to choose
/// among the results, not to narrow the search.
#[must_use]
pub fn search_key(title: &str, _artists: &[String]) -> String {
    title.to_string()
}

/// Pick the album id to use from ranked search results.
///
/// The first candidate whose primary artist is one of `artists` wins;
/// otherwise the top-ranked candidate. `None` when there are no results.
#[must_use]
pub fn pick_album_id<'a>(candidates: &'a [AlbumCandidate], artists: &[String]) -> Option<&'a str> {
    candidates
        .iter()
        .find(|candidate| {
            candidate
                .primary_artist
                .as_ref()
                .is_some_and(|artist| artists.contains(artist))
        })
        .or_else(|| candidates.first())
        .map(|candidate| candidate.id.as_str())
}

/// Outcome of a [`CatalogResolver::prime_cache`] pass.
#[derive(Debug, Default)]
pub struct PrimeReport {
    /// Resolved albums, in input order.
    pub albums: Vec<Album>,
    /// Descriptions the provider had no results for.
    pub unresolved: Vec<AlbumDescription>,
    /// Descriptions whose lookup failed, with the error message.
    pub failed: Vec<(AlbumDescription, String)>,
}

impl PrimeReport {
    /// Every track of every resolved album, in order.
    #[must_use]
    pub fn tracks(&self) -> Vec<Track> {
        self.albums
            .iter()
            .flat_map(|album| album.tracks.iter().cloned())
            .collect()
    }
}

/// Resolves album descriptions through a search + catalog provider.
#[derive(Debug, Clone)]
pub struct CatalogResolver<P> {
    provider: P,
    search_limit: u32,
}

impl<P> CatalogResolver<P>
where
    P: SearchProvider + CatalogProvider,
{
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    /// Results considered per search, clamped into `1..=50`.
    #[must_use]
    pub fn with_search_limit(mut self, limit: u32) -> Self {
        self.search_limit = limit.clamp(1, MAX_SEARCH_LIMIT);
        self
    }

    /// Resolve one description.
    ///
    /// Returns `Ok(None)` when the search has no results. Fetched search
    /// results and track listings are memoized but not flushed.
    ///
    /// # Errors
    /// Returns the provider error when a search or track listing call
    /// fails. Nothing is memoized for the failed lookup.
    pub async fn resolve_album(
        &self,
        memo: &mut MemoStore,
        description: &AlbumDescription,
    ) -> ProviderResult<Option<Album>> {
        let key = search_key(&description.title, &description.artists);

        let album_id = {
            let candidates = self.search(memo, &key).await?;
            match pick_album_id(candidates, &description.artists) {
                Some(id) => id.to_string(),
                None => {
                    log::debug!("No search results for {}", description);
                    return Ok(None);
                }
            }
        };

        let stubs = self.list_tracks(memo, &album_id).await?;
        let tracks = stubs
            .iter()
            .map(|stub| {
                Track::new(&stub.title, &stub.uri)
                    .with_artists(stub.artists.iter().cloned())
            })
            .collect();

        Ok(Some(Album {
            title: description.title.clone(),
            id: album_id,
            artists: description.artists.clone(),
            tracks,
        }))
    }

    /// Resolve a batch of descriptions, then flush the search and track
    /// listing memos once each.
    ///
    /// A description without results, or whose lookup fails, is recorded
    /// in the report and the batch carries on.
    pub async fn prime_cache(
        &self,
        memo: &mut MemoStore,
        descriptions: &[AlbumDescription],
    ) -> PrimeReport {
        let mut report = PrimeReport::default();

        for description in descriptions {
            match self.resolve_album(memo, description).await {
                Ok(Some(album)) => report.albums.push(album),
                Ok(None) => {
                    log::warn!("No album found for {}", description);
                    report.unresolved.push(description.clone());
                }
                Err(e) => {
                    log::warn!("Failed to resolve {}: {}", description, e);
                    report.failed.push((description.clone(), e.to_string()));
                }
            }
        }

        memo.flush(MemoKind::Search);
        memo.flush(MemoKind::Tracks);

        log::info!(
            "Primed {} albums ({} unresolved, {} failed)",
            report.albums.len(),
            report.unresolved.len(),
            report.failed.len()
        );
        report
    }

    /// All tracks of every description that resolves, in order.
    ///
    /// Failures are logged and skipped. Does not flush.
    pub async fn resolve_tracks(
        &self,
        memo: &mut MemoStore,
        descriptions: &[AlbumDescription],
    ) -> Vec<Track> {
        let mut tracks = Vec::new();
        for description in descriptions {
            match self.resolve_album(memo, description).await {
                Ok(Some(album)) => tracks.extend(album.tracks),
                Ok(None) => {}
                Err(e) => log::warn!("Failed to resolve {}: {}", description, e),
            }
        }
        tracks
    }

    async fn search<'m>(
        &self,
        memo: &'m mut MemoStore,
        key: &str,
    ) -> ProviderResult<&'m [AlbumCandidate]> {
        if !memo.search.contains(key) {
            log::debug!("Search memo miss for {:?}", key);
            let results = self
                .provider
                .search(key, SearchKind::Album, self.search_limit)
                .await?;
            memo.search.insert(key, results);
        }
        Ok(memo.search.get(key).map(Vec::as_slice).unwrap_or_default())
    }

    async fn list_tracks<'m>(
        &self,
        memo: &'m mut MemoStore,
        album_id: &str,
    ) -> ProviderResult<&'m [TrackStub]> {
        if !memo.tracks.contains(album_id) {
            log::debug!("Track listing memo miss for album {}", album_id);
            let stubs = self.provider.list_tracks(album_id).await?;
            memo.tracks.insert(album_id, stubs);
        }
        Ok(memo
            .tracks
            .get(album_id)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }
}
