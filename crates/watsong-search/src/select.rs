use std::cmp::Ordering;
use std::collections::BinaryHeap;

use watsong_core::{Feel, Track};

use crate::error::SelectError;

/// Default shortlist length.
pub const DEFAULT_K: usize = 25;

/// A selected track and its squared distance to the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scored<'a> {
    pub track: &'a Track,
    pub distance: f64,
}

/// Heap entry. Ordered by distance, then by position in the pool, so the
/// heap top is always the entry to evict first.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    distance: f64,
    index: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.index.cmp(&other.index))
    }
}

/// The `k` tracks closest to `target`, nearest first, with their distances.
///
/// Equal distances keep pool order. Runs in O(n log k) using a bounded
/// max-heap.
///
/// # Errors
/// Returns [`SelectError::Unannotated`] for the first track without
/// features; no partial result is returned.
pub fn select_scored<'a>(
    target: &Feel,
    tracks: &'a [Track],
    k: usize,
) -> Result<Vec<Scored<'a>>, SelectError> {
    let mut heap: BinaryHeap<Candidate> = BinaryHeap::with_capacity(k.min(tracks.len()) + 1);

    for (index, track) in tracks.iter().enumerate() {
        let features = track.features.as_ref().ok_or_else(|| SelectError::Unannotated {
            uri: track.uri.clone(),
        })?;
        let candidate = Candidate {
            distance: target.squared_distance(features),
            index,
        };

        if heap.len() < k {
            heap.push(candidate);
        } else if let Some(mut worst) = heap.peek_mut() {
            if candidate < *worst {
                *worst = candidate;
            }
        }
    }

    Ok(heap
        .into_sorted_vec()
        .into_iter()
        .map(|candidate| Scored {
            track: &tracks[candidate.index],
            distance: candidate.distance,
        })
        .collect())
}

/// The `k` tracks closest to `target`, nearest first.
///
/// # Errors
/// Returns [`SelectError::Unannotated`] if any track lacks features.
pub fn select<'a>(
    target: &Feel,
    tracks: &'a [Track],
    k: usize,
) -> Result<Vec<&'a Track>, SelectError> {
    Ok(select_scored(target, tracks, k)?
        .into_iter()
        .map(|scored| scored.track)
        .collect())
}
