//! Feature annotation.
//!
//! Attaches a [`Feel`] to every track, memoized by track URI. Two entry
//! points:
//!
//! - [`FeatureAnnotator::prime`] fills the memo for a whole pool using the
//!   provider's batch call, in chunks of at most [`MAX_FEATURE_BATCH`].
//! - [`FeatureAnnotator::annotate`] attaches features to a list of tracks,
//!   falling back to one provider call per track the memo does not know.
//!
//! A URI that is in the memo never reaches the provider again.
//!
//! Provider values that do not form a valid [`Feel`] (negative or
//! non-finite) are logged as errors and never memoized. That track is left
//! unannotated and the rest of the pass carries on.

use std::collections::HashSet;

use watsong_core::{Feel, MemoKind, Track};

use crate::error::{ProviderError, ProviderResult};
use crate::memo::MemoStore;
use crate::provider::{AudioFeatures, FeatureProvider, MAX_FEATURE_BATCH};

/// Outcome of a [`FeatureAnnotator::prime`] pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FeaturePrimeReport {
    /// Distinct URIs that were not yet memoized.
    pub requested: usize,
    /// URIs whose features were fetched and memoized.
    pub fetched: usize,
    /// URIs the provider had no (valid) features for.
    pub missing: usize,
    /// Batch calls that failed outright.
    pub failed_chunks: usize,
}

/// Attaches features from a [`FeatureProvider`], through the memo.
#[derive(Debug, Clone)]
pub struct FeatureAnnotator<P> {
    provider: P,
    batch_size: usize,
}

impl<P> FeatureAnnotator<P>
where
    P: FeatureProvider,
{
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            batch_size: MAX_FEATURE_BATCH,
        }
    }

    /// Use smaller batches than the provider maximum.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, MAX_FEATURE_BATCH);
        self
    }

    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Attach features to `tracks`, in order.
    ///
    /// Memo hits are attached directly. Each miss costs one provider call;
    /// a real result is memoized and attached. When the provider fails or
    /// has nothing for a track, that track keeps `features: None`. The
    /// memo is not flushed.
    pub async fn annotate(&self, memo: &mut MemoStore, tracks: Vec<Track>) -> Vec<Track> {
        let mut annotated = Vec::with_capacity(tracks.len());
        let mut fetched = 0_usize;

        for mut track in tracks {
            if let Some(feel) = memo.features.get(&track.uri) {
                track.features = Some(*feel);
            } else {
                match self.fetch_one(&track.uri).await {
                    Ok(Some(feel)) => {
                        memo.features.insert(track.uri.clone(), feel);
                        track.features = Some(feel);
                        fetched += 1;
                    }
                    Ok(None) => {
                        log::debug!("No features for {}", track.uri);
                    }
                    Err(ProviderError::InvalidFeatures(e)) => {
                        log::error!(
                            "Provider sent an invalid feel for {}: {}",
                            track.uri,
                            e
                        );
                    }
                    Err(e) => {
                        log::warn!("Failed to get features for {}: {}", track.uri, e);
                    }
                }
            }
            annotated.push(track);
        }

        if fetched > 0 {
            log::debug!("Fetched features for {} tracks one at a time", fetched);
        }
        annotated
    }

    /// Memoize features for every track of `tracks` not already known,
    /// using batch calls, then flush the feature memo once.
    ///
    /// A failed or misaligned batch is logged and skipped; later batches
    /// still run.
    pub async fn prime(&self, memo: &mut MemoStore, tracks: &[Track]) -> FeaturePrimeReport {
        let mut seen = HashSet::new();
        let pending: Vec<String> = tracks
            .iter()
            .map(|track| track.uri.as_str())
            .filter(|uri| !memo.features.contains(uri) && seen.insert(*uri))
            .map(str::to_string)
            .collect();

        let mut report = FeaturePrimeReport {
            requested: pending.len(),
            ..FeaturePrimeReport::default()
        };

        for chunk in pending.chunks(self.batch_size) {
            match self.fetch_batch(chunk).await {
                Ok(results) => {
                    for (uri, result) in chunk.iter().zip(results) {
                        match result {
                            Some(feel) => {
                                memo.features.insert(uri.clone(), feel);
                                report.fetched += 1;
                            }
                            None => report.missing += 1,
                        }
                    }
                }
                Err(e) => {
                    log::warn!("Feature batch of {} tracks failed: {}", chunk.len(), e);
                    report.failed_chunks += 1;
                }
            }
        }

        memo.flush(MemoKind::Features);

        log::info!(
            "Primed features: {} requested, {} fetched, {} missing, {} failed batches",
            report.requested,
            report.fetched,
            report.missing,
            report.failed_chunks
        );
        report
    }

    async fn fetch_one(&self, uri: &str) -> ProviderResult<Option<Feel>> {
        self.provider
            .features(uri)
            .await?
            .map(Feel::try_from)
            .transpose()
            .map_err(ProviderError::from)
    }

    async fn fetch_batch(&self, uris: &[String]) -> ProviderResult<Vec<Option<Feel>>> {
        let results = self.provider.features_batch(uris).await?;
        if results.len() != uris.len() {
            return Err(ProviderError::MisalignedBatch {
                requested: uris.len(),
                returned: results.len(),
            });
        }

        Ok(uris
            .iter()
            .zip(results)
            .map(|(uri, features)| features.and_then(|f| validated(uri, f)))
            .collect())
    }
}

fn validated(uri: &str, features: AudioFeatures) -> Option<Feel> {
    match Feel::try_from(features) {
        Ok(feel) => Some(feel),
        Err(e) => {
            log::error!("Provider sent an invalid feel for {}: {}", uri, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use watsong_core::InMemoryStorage;

    #[derive(Debug, Default)]
    struct StubFeatures {
        known: HashMap<String, AudioFeatures>,
        fail_single: bool,
        fail_batches: bool,
        single_calls: AtomicUsize,
        batch_sizes: Mutex<Vec<usize>>,
    }

    impl StubFeatures {
        fn knowing(uris: &[&str]) -> Self {
            let known = uris
                .iter()
                .enumerate()
                .map(|(i, uri)| ((*uri).to_string(), features(i as f64 / 100.0)))
                .collect();
            Self {
                known,
                ..Self::default()
            }
        }

        fn single_calls(&self) -> usize {
            self.single_calls.load(Ordering::SeqCst)
        }

        fn batch_sizes(&self) -> Vec<usize> {
            self.batch_sizes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FeatureProvider for StubFeatures {
        async fn features(&self, uri: &str) -> ProviderResult<Option<AudioFeatures>> {
            self.single_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_single {
                return Err(ProviderError::RateLimited {
                    source_name: "stub".to_string(),
                });
            }
            Ok(self.known.get(uri).copied())
        }

        async fn features_batch(
            &self,
            uris: &[String],
        ) -> ProviderResult<Vec<Option<AudioFeatures>>> {
            self.batch_sizes.lock().unwrap().push(uris.len());
            if self.fail_batches {
                return Err(ProviderError::Http {
                    source_name: "stub".to_string(),
                    message: "503".to_string(),
                });
            }
            Ok(uris.iter().map(|uri| self.known.get(uri).copied()).collect())
        }
    }

    fn features(x: f64) -> AudioFeatures {
        AudioFeatures {
            energy: x,
            danceability: x,
            speechiness: x,
            valence: x,
        }
    }

    fn tracks(uris: &[&str]) -> Vec<Track> {
        uris.iter().map(|uri| Track::new(*uri, *uri)).collect()
    }

    #[tokio::test]
    async fn test_annotate_empty_makes_no_calls() {
        let provider = StubFeatures::default();
        let annotator = FeatureAnnotator::new(&provider);
        let mut memo = MemoStore::in_memory();

        let result = annotator.annotate(&mut memo, Vec::new()).await;

        assert!(result.is_empty());
        assert_eq!(provider.single_calls(), 0);
        assert!(provider.batch_sizes().is_empty());
    }

    #[tokio::test]
    async fn test_annotate_preserves_order_and_memoizes() {
        let provider = StubFeatures::knowing(&["u:a", "u:b", "u:c"]);
        let annotator = FeatureAnnotator::new(&provider);
        let mut memo = MemoStore::in_memory();

        let result = annotator
            .annotate(&mut memo, tracks(&["u:c", "u:a", "u:b"]))
            .await;

        let uris: Vec<&str> = result.iter().map(|t| t.uri.as_str()).collect();
        assert_eq!(uris, vec!["u:c", "u:a", "u:b"]);
        assert!(result.iter().all(Track::is_annotated));
        assert_eq!(result[0].features.unwrap().energy(), 0.02);
        assert_eq!(memo.features.len(), 3);
        assert!(memo.is_dirty(MemoKind::Features));
    }

    #[tokio::test]
    async fn test_second_annotate_is_served_from_memo() {
        let provider = StubFeatures::knowing(&["u:a", "u:b"]);
        let annotator = FeatureAnnotator::new(&provider);
        let mut memo = MemoStore::in_memory();

        let first = annotator.annotate(&mut memo, tracks(&["u:a", "u:b"])).await;
        assert_eq!(provider.single_calls(), 2);

        let second = annotator.annotate(&mut memo, tracks(&["u:a", "u:b"])).await;
        assert_eq!(provider.single_calls(), 2);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_annotate_leaves_unknown_and_failed_tracks_bare() {
        let provider = StubFeatures::knowing(&["u:a"]);
        let annotator = FeatureAnnotator::new(&provider);
        let mut memo = MemoStore::in_memory();

        let result = annotator.annotate(&mut memo, tracks(&["u:a", "u:zzz"])).await;
        assert!(result[0].is_annotated());
        assert!(!result[1].is_annotated());
        assert!(!memo.features.contains("u:zzz"));

        let failing = StubFeatures {
            fail_single: true,
            ..StubFeatures::knowing(&["u:b"])
        };
        let annotator = FeatureAnnotator::new(&failing);
        let result = annotator.annotate(&mut memo, tracks(&["u:a", "u:b"])).await;
        // u:a is memoized; u:b fails and is not memoized.
        assert!(result[0].is_annotated());
        assert!(!result[1].is_annotated());
        assert!(!memo.features.contains("u:b"));
        assert_eq!(failing.single_calls(), 1);
    }

    #[tokio::test]
    async fn test_negative_provider_values_are_not_memoized() {
        let mut provider = StubFeatures::default();
        provider.known.insert("u:bad".to_string(), features(-0.5));
        let annotator = FeatureAnnotator::new(&provider);
        let mut memo = MemoStore::in_memory();

        let result = annotator.annotate(&mut memo, tracks(&["u:bad"])).await;
        assert!(!result[0].is_annotated());
        assert!(memo.features.is_empty());

        let report = annotator.prime(&mut memo, &tracks(&["u:bad"])).await;
        assert_eq!(report.missing, 1);
        assert!(memo.features.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_feel_does_not_abort_the_pass() {
        let mut provider = StubFeatures::default();
        provider.known.insert("u:bad".to_string(), features(-0.5));
        provider.known.insert("u:good".to_string(), features(0.5));
        let annotator = FeatureAnnotator::new(&provider);

        let mut memo = MemoStore::in_memory();
        let result = annotator
            .annotate(&mut memo, tracks(&["u:bad", "u:good"]))
            .await;
        assert!(!result[0].is_annotated());
        assert!(result[1].is_annotated());

        let mut memo = MemoStore::in_memory();
        let report = annotator
            .prime(&mut memo, &tracks(&["u:bad", "u:good"]))
            .await;
        assert_eq!(report.fetched, 1);
        assert_eq!(report.missing, 1);
        assert_eq!(report.failed_chunks, 0);
        assert!(memo.features.contains("u:good"));
    }

    #[tokio::test]
    async fn test_prime_chunks_and_dedupes() {
        let uris: Vec<String> = (0..250).map(|i| format!("u:{i}")).collect();
        let uri_refs: Vec<&str> = uris.iter().map(String::as_str).collect();
        let provider = StubFeatures::knowing(&uri_refs);
        let annotator = FeatureAnnotator::new(&provider);
        let storage = InMemoryStorage::new();
        let mut memo = MemoStore::open(storage.clone());

        let mut pool = tracks(&uri_refs);
        pool.extend(tracks(&uri_refs[..10]));
        let report = annotator.prime(&mut memo, &pool).await;

        assert_eq!(provider.batch_sizes(), vec![100, 100, 50]);
        assert_eq!(report.requested, 250);
        assert_eq!(report.fetched, 250);
        assert_eq!(storage.save_count(MemoKind::Features), 1);
        assert_eq!(storage.len(MemoKind::Features), 250);

        // Everything is memoized now: annotate makes no calls.
        let annotated = annotator.annotate(&mut memo, pool).await;
        assert_eq!(provider.single_calls(), 0);
        assert!(annotated.iter().all(Track::is_annotated));
    }

    #[tokio::test]
    async fn test_prime_skips_memoized_uris() {
        let provider = StubFeatures::knowing(&["u:a", "u:b", "u:c"]);
        let annotator = FeatureAnnotator::new(&provider).with_batch_size(2);
        let mut memo = MemoStore::in_memory();
        memo.features.insert("u:a", Feel::default());

        let report = annotator.prime(&mut memo, &tracks(&["u:a", "u:b", "u:c"])).await;

        assert_eq!(provider.batch_sizes(), vec![2]);
        assert_eq!(report.requested, 2);
        assert_eq!(report.fetched, 2);
    }

    #[tokio::test]
    async fn test_prime_warm_pool_makes_no_calls_and_no_writes() {
        let provider = StubFeatures::knowing(&["u:a"]);
        let annotator = FeatureAnnotator::new(&provider);
        let storage = InMemoryStorage::new();
        let mut memo = MemoStore::open(storage.clone());

        annotator.prime(&mut memo, &tracks(&["u:a"])).await;
        annotator.prime(&mut memo, &tracks(&["u:a"])).await;

        assert_eq!(provider.batch_sizes(), vec![1]);
        assert_eq!(storage.save_count(MemoKind::Features), 1);
    }

    #[tokio::test]
    async fn test_prime_failed_batch_is_counted() {
        let provider = StubFeatures {
            fail_batches: true,
            ..StubFeatures::knowing(&["u:a", "u:b"])
        };
        let annotator = FeatureAnnotator::new(&provider);
        let storage = InMemoryStorage::new();
        let mut memo = MemoStore::open(storage.clone());

        let report = annotator.prime(&mut memo, &tracks(&["u:a", "u:b"])).await;

        assert_eq!(report.failed_chunks, 1);
        assert_eq!(report.fetched, 0);
        assert!(memo.features.is_empty());
        assert_eq!(storage.save_count(MemoKind::Features), 0);
    }

    #[test]
    fn test_batch_size_is_clamped() {
        let provider = StubFeatures::default();
        assert_eq!(FeatureAnnotator::new(&provider).batch_size(), 100);
        assert_eq!(FeatureAnnotator::new(&provider).with_batch_size(500).batch_size(), 100);
        assert_eq!(FeatureAnnotator::new(&provider).with_batch_size(0).batch_size(), 1);
    }
}
