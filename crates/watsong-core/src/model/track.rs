use serde::{Deserialize, Serialize};

use crate::model::feel::Feel;

/// A single track on an album.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub title: String,

    /// Provider URI (e.g. `spotify:track:...`). Stable across runs; this
    /// is the key for the feature memo.
    pub uri: String,

    pub artists: Vec<String>,

    /// Filled in by the feature annotator.
    #[serde(default)]
    pub features: Option<Feel>,
}

impl Track {
    #[must_use]
    pub fn new(title: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            uri: uri.into(),
            artists: Vec::new(),
            features: None,
        }
    }

    #[must_use]
    pub fn with_artists<I, S>(mut self, artists: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.artists = artists.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_features(mut self, features: Feel) -> Self {
        self.features = Some(features);
        self
    }

    #[must_use]
    pub const fn is_annotated(&self) -> bool {
        self.features.is_some()
    }
}
