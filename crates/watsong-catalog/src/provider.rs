//! Capability traits for the external collaborators.
//!
//! The resolver and annotator only ever talk to a provider through these
//! traits, so tests can swap in a stub and the live client
//! ([`crate::spotify::SpotifyClient`]) stays out of the core logic.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use watsong_core::Feel;

use crate::error::ProviderResult;

/// Largest batch the feature provider accepts in one call.
pub const MAX_FEATURE_BATCH: usize = 100;

/// What kind of entity a search asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    Album,
}

impl SearchKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Album => "album",
        }
    }
}

/// One ranked search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumCandidate {
    pub id: String,
    pub name: String,
    /// Name of the first credited artist, if the provider lists any.
    pub primary_artist: Option<String>,
}

/// A track as listed by the catalog, before features are attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackStub {
    pub title: String,
    pub uri: String,
    pub artists: Vec<String>,
}

/// Raw audio descriptors as the feature provider reports them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub energy: f64,
    pub danceability: f64,
    pub speechiness: f64,
    pub valence: f64,
}

impl TryFrom<AudioFeatures> for Feel {
    type Error = watsong_core::Error;

    fn try_from(features: AudioFeatures) -> watsong_core::Result<Self> {
        Self::new(
            features.energy,
            features.speechiness,
            features.danceability,
            features.valence,
        )
    }
}

#[async_trait]
pub trait SearchProvider {
    /// Ranked results for `query`, best first, at most `limit` of them.
    async fn search(
        &self,
        query: &str,
        kind: SearchKind,
        limit: u32,
    ) -> ProviderResult<Vec<AlbumCandidate>>;
}

#[async_trait]
pub trait CatalogProvider {
    /// The album's tracks in album order.
    async fn list_tracks(&self, album_id: &str) -> ProviderResult<Vec<TrackStub>>;
}

#[async_trait]
pub trait FeatureProvider {
    /// Features of one track; `None` when the provider has no analysis.
    async fn features(&self, uri: &str) -> ProviderResult<Option<AudioFeatures>>;

    /// Features for up to [`MAX_FEATURE_BATCH`] tracks, aligned with `uris`.
    async fn features_batch(&self, uris: &[String]) -> ProviderResult<Vec<Option<AudioFeatures>>>;
}

#[async_trait]
impl<T: SearchProvider + Sync + ?Sized> SearchProvider for &T {
    async fn search(
        &self,
        query: &str,
        kind: SearchKind,
        limit: u32,
    ) -> ProviderResult<Vec<AlbumCandidate>> {
        (**self).search(query, kind, limit).await
    }
}

#[async_trait]
impl<T: CatalogProvider + Sync + ?Sized> CatalogProvider for &T {
    async fn list_tracks(&self, album_id: &str) -> ProviderResult<Vec<TrackStub>> {
        (**self).list_tracks(album_id).await
    }
}

#[async_trait]
impl<T: FeatureProvider + Sync + ?Sized> FeatureProvider for &T {
    async fn features(&self, uri: &str) -> ProviderResult<Option<AudioFeatures>> {
        (**self).features(uri).await
    }

    async fn features_batch(&self, uris: &[String]) -> ProviderResult<Vec<Option<AudioFeatures>>> {
        (**self).features_batch(uris).await
    }
}
