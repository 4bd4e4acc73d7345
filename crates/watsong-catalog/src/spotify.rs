//! Spotify Web API client.
//!
//! Implements the search, catalog and feature provider traits against
//! `api.spotify.com`. The client is handed a bearer access token; how that
//! token is obtained is up to the caller.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{
    AlbumCandidate, AudioFeatures, CatalogProvider, FeatureProvider, SearchKind, SearchProvider,
    TrackStub, MAX_FEATURE_BATCH,
};
use crate::resilience::RateLimiter;

const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";
const SOURCE_NAME: &str = "Spotify";

/// Page size for album track listings (the API maximum).
const TRACKS_PAGE_LIMIT: &str = "50";

/// Default pacing for API requests.
pub const DEFAULT_REQUESTS_PER_SECOND: u32 = 10;

// ---------------------------------------------------------------------------
// API response types (private -- only what the providers need)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchResponse {
    albums: Option<AlbumPage>,
}

#[derive(Debug, Deserialize)]
struct AlbumPage {
    #[serde(default)]
    items: Vec<SimplifiedAlbum>,
}

#[derive(Debug, Deserialize)]
struct SimplifiedAlbum {
    id: String,
    name: String,
    #[serde(default)]
    artists: Vec<ArtistRef>,
}

#[derive(Debug, Deserialize)]
struct ArtistRef {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TrackPage {
    #[serde(default)]
    items: Vec<SimplifiedTrack>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SimplifiedTrack {
    name: String,
    uri: String,
    #[serde(default)]
    artists: Vec<ArtistRef>,
}

#[derive(Debug, Deserialize)]
struct AudioFeaturesResponse {
    #[serde(default)]
    audio_features: Vec<Option<AudioFeatures>>,
}

impl From<SimplifiedAlbum> for AlbumCandidate {
    fn from(album: SimplifiedAlbum) -> Self {
        Self {
            id: album.id,
            name: album.name,
            primary_artist: album.artists.into_iter().next().map(|a| a.name),
        }
    }
}

impl From<SimplifiedTrack> for TrackStub {
    fn from(track: SimplifiedTrack) -> Self {
        Self {
            title: track.name,
            uri: track.uri,
            artists: track.artists.into_iter().map(|a| a.name).collect(),
        }
    }
}

/// The bare id of a Spotify URI (`spotify:track:<id>`); a value without
/// colons is taken to be an id already.
#[must_use]
pub fn track_id(uri: &str) -> &str {
    uri.rsplit(':').next().unwrap_or(uri)
}

/// Spotify Web API client.
///
/// Wraps an HTTP client, an access token and a rate limiter.
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    http: Client,
    access_token: String,
    base_url: String,
    rate_limiter: RateLimiter,
}

impl SpotifyClient {
    /// Create a new client.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(access_token: impl Into<String>) -> ProviderResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("watsong/0.1.0")
            .build()?;

        Ok(Self {
            http,
            access_token: access_token.into(),
            base_url: SPOTIFY_API_BASE.to_string(),
            rate_limiter: RateLimiter::new(DEFAULT_REQUESTS_PER_SECOND),
        })
    }

    /// Point the client at another API root (a proxy or a test server).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_requests_per_second(mut self, requests_per_second: u32) -> Self {
        self.rate_limiter = RateLimiter::new(requests_per_second);
        self
    }

    /// Issue a GET; `Ok(None)` on 404.
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> ProviderResult<Option<Response>> {
        self.rate_limiter.acquire().await;

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            StatusCode::TOO_MANY_REQUESTS => Err(ProviderError::RateLimited {
                source_name: SOURCE_NAME.to_string(),
            }),
            _ => {
                let response = response.error_for_status().map_err(|e| ProviderError::Http {
                    source_name: SOURCE_NAME.to_string(),
                    message: e.to_string(),
                })?;
                Ok(Some(response))
            }
        }
    }

    /// GET and decode; a 404 is an error here.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> ProviderResult<T> {
        let response = self.get(url, query).await?.ok_or_else(|| ProviderError::Http {
            source_name: SOURCE_NAME.to_string(),
            message: format!("404 Not Found: {url}"),
        })?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> ProviderResult<T> {
    response.json().await.map_err(|e| ProviderError::Parse {
        source_name: SOURCE_NAME.to_string(),
        message: e.to_string(),
    })
}

#[async_trait]
impl SearchProvider for SpotifyClient {
    async fn search(
        &self,
        query: &str,
        kind: SearchKind,
        limit: u32,
    ) -> ProviderResult<Vec<AlbumCandidate>> {
        let url = format!("{}/search", self.base_url);
        let limit = limit.to_string();
        let result: SearchResponse = self
            .get_json(
                &url,
                &[
                    ("q", query),
                    ("type", kind.as_str()),
                    ("limit", limit.as_str()),
                ],
            )
            .await?;

        Ok(result
            .albums
            .map(|page| page.items.into_iter().map(AlbumCandidate::from).collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl CatalogProvider for SpotifyClient {
    async fn list_tracks(&self, album_id: &str) -> ProviderResult<Vec<TrackStub>> {
        let first = format!("{}/albums/{}/tracks", self.base_url, album_id);
        let mut page: TrackPage = self
            .get_json(&first, &[("limit", TRACKS_PAGE_LIMIT)])
            .await?;

        let mut stubs: Vec<TrackStub> = Vec::new();
        loop {
            stubs.extend(page.items.into_iter().map(TrackStub::from));
            match page.next {
                // `next` already carries its own query string.
                Some(next) => page = self.get_json(&next, &[]).await?,
                None => break,
            }
        }
        Ok(stubs)
    }
}

#[async_trait]
impl FeatureProvider for SpotifyClient {
    async fn features(&self, uri: &str) -> ProviderResult<Option<AudioFeatures>> {
        let url = format!("{}/audio-features/{}", self.base_url, track_id(uri));
        match self.get(&url, &[]).await? {
            Some(response) => decode(response).await.map(Some),
            None => Ok(None),
        }
    }

    async fn features_batch(&self, uris: &[String]) -> ProviderResult<Vec<Option<AudioFeatures>>> {
        if uris.is_empty() {
            return Ok(Vec::new());
        }
        if uris.len() > MAX_FEATURE_BATCH {
            return Err(ProviderError::Http {
                source_name: SOURCE_NAME.to_string(),
                message: format!(
                    "batch of {} exceeds the limit of {}",
                    uris.len(),
                    MAX_FEATURE_BATCH
                ),
            });
        }

        let ids = uris
            .iter()
            .map(|uri| track_id(uri))
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}/audio-features", self.base_url);
        let result: AudioFeaturesResponse =
            self.get_json(&url, &[("ids", ids.as_str())]).await?;
        Ok(result.audio_features)
    }
}
