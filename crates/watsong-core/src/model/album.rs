use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::track::Track;

/// What a caller knows about an album before it is resolved: a title and
/// the credited artists, in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlbumDescription {
    pub title: String,
    #[serde(default)]
    pub artists: Vec<String>,
}

impl AlbumDescription {
    #[must_use]
    pub fn new<I, S>(title: impl Into<String>, artists: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: title.into(),
            artists: artists.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for AlbumDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.artists.is_empty() {
            write!(f, "{}", self.title)
        } else {
            write!(f, "{} ({})", self.title, self.artists.join(", "))
        }
    }
}

/// A resolved album and its tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub title: String,

    /// Provider album id.
    pub id: String,

    pub artists: Vec<String>,

    pub tracks: Vec<Track>,
}
