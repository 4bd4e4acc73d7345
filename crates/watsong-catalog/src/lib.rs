//! Album resolution and feature annotation for watsong.
//!
//! Resolves album descriptions to albums and tracks, and attaches a feel
//! vector to each track, going through the lookup memo so that a value
//! fetched once is never fetched again.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod annotate;
pub mod config;
pub mod error;
pub mod memo;
pub mod provider;
pub mod resilience;
pub mod resolve;
pub mod spotify;

pub use annotate::{FeatureAnnotator, FeaturePrimeReport};
pub use config::Config;
pub use error::{ProviderError, ProviderResult};
pub use memo::MemoStore;
pub use provider::{
    AlbumCandidate, AudioFeatures, CatalogProvider, FeatureProvider, SearchKind, SearchProvider,
    TrackStub,
};
pub use resolve::{CatalogResolver, PrimeReport};
pub use spotify::SpotifyClient;
