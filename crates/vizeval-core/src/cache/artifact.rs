use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use super::codec::{ArtifactCodec, JsonArtifactCodec};
use crate::model::ProducedArtifact;
use crate::storage::{BlobStore, Namespace};

/// Where an artifact came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
    Cache,
    Live,
}

/// Agent output cache keyed by test id.
#[derive(Clone)]
pub struct ArtifactCache {
    store: Arc<dyn BlobStore>,
    codec: Arc<dyn ArtifactCodec>,
}

impl std::fmt::Debug for ArtifactCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactCache")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl ArtifactCache {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self::with_codec(store, Arc::new(JsonArtifactCodec))
    }

    pub fn with_codec(store: Arc<dyn BlobStore>, codec: Arc<dyn ArtifactCodec>) -> Self {
        Self { store, codec }
    }

    /// Return the cached artifact, or run `produce` and cache its output.
    ///
    /// Only an error from `produce` itself is returned. A failed cache write
    /// is logged, the key is evicted, and the fresh artifact is still handed
    /// back.
    pub async fn get_or_produce<F, Fut>(
        &self,
        test_id: &str,
        produce: F,
    ) -> anyhow::Result<(ProducedArtifact, CacheSource)>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<ProducedArtifact>>,
    {
        if let Some(artifact) = self.get(test_id).await {
            debug!(test_id, "artifact cache hit");
            return Ok((artifact, CacheSource::Cache));
        }

        let artifact = produce().await?;
        self.put_or_rollback(test_id, &artifact).await;
        Ok((artifact, CacheSource::Live))
    }

    /// Cached artifact, if present and intact.
    pub async fn get(&self, test_id: &str) -> Option<ProducedArtifact> {
        let bytes = match self.store.get(Namespace::Artifacts, test_id).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!(test_id, error = %e, "artifact cache read failed, treating as miss");
                return None;
            }
        };

        match self.codec.decode(test_id, &bytes) {
            Ok(artifact) => Some(artifact),
            Err(e) => {
                warn!(test_id, error = %e, "corrupt artifact cache entry, evicting");
                self.evict(test_id).await;
                None
            }
        }
    }

    async fn put_or_rollback(&self, test_id: &str, artifact: &ProducedArtifact) {
        let result = match self.codec.encode(test_id, artifact) {
            Ok(bytes) => self.store.put(Namespace::Artifacts, test_id, &bytes).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            warn!(test_id, error = %e, "cannot cache artifact");
            self.evict(test_id).await;
        }
    }

    async fn evict(&self, test_id: &str) {
        if let Err(e) = self.store.remove(Namespace::Artifacts, test_id).await {
            warn!(test_id, error = %e, "failed to evict artifact cache entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EvalError, EvalResult};
    use crate::model::RenderedChart;
    use crate::storage::{FsBlobStore, MemoryBlobStore};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct RefusingCodec;

    impl ArtifactCodec for RefusingCodec {
        fn encode(&self, test_id: &str, _artifact: &ProducedArtifact) -> EvalResult<Vec<u8>> {
            Err(EvalError::Codec {
                key: test_id.to_string(),
                message: "figure handle is not serializable".into(),
            })
        }

        fn decode(&self, test_id: &str, bytes: &[u8]) -> EvalResult<ProducedArtifact> {
            JsonArtifactCodec.decode(test_id, bytes)
        }
    }

    fn chart_artifact() -> ProducedArtifact {
        ProducedArtifact {
            answer: "done".into(),
            table: None,
            chart: Some(RenderedChart::new("<svg/>")),
        }
    }

    #[tokio::test]
    async fn miss_then_hit_invokes_producer_once() {
        let cache = ArtifactCache::new(Arc::new(MemoryBlobStore::new()));
        let calls = AtomicUsize::new(0);

        for expected in [CacheSource::Live, CacheSource::Cache] {
            let (artifact, source) = cache
                .get_or_produce("t1", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(chart_artifact())
                })
                .await
                .unwrap();
            assert_eq!(source, expected);
            assert_eq!(artifact, chart_artifact());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn producer_error_is_returned_and_nothing_cached() {
        let store = Arc::new(MemoryBlobStore::new());
        let cache = ArtifactCache::new(store.clone());
        let err = cache
            .get_or_produce("t1", || async { anyhow::bail!("agent crashed") })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("agent crashed"));
        assert!(store.is_empty(Namespace::Artifacts));
    }

    #[tokio::test]
    async fn unserializable_artifact_leaves_no_entry_but_is_returned() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(FsBlobStore::new(tmp.path()));
        // A stale entry for the same key must not survive the failed write.
        store
            .put(Namespace::Artifacts, "t1", b"stale")
            .await
            .unwrap();

        let cache = ArtifactCache::with_codec(store.clone(), Arc::new(RefusingCodec));
        let (artifact, source) = cache
            .get_or_produce("t1", || async { Ok(chart_artifact()) })
            .await
            .unwrap();

        assert_eq!(source, CacheSource::Live);
        assert_eq!(artifact, chart_artifact());
        assert!(store
            .get(Namespace::Artifacts, "t1")
            .await
            .unwrap()
            .is_none());
        assert!(store.keys(Namespace::Artifacts).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_entry_is_evicted_and_reproduced() {
        let store = Arc::new(MemoryBlobStore::new());
        store
            .put(Namespace::Artifacts, "t1", b"{\"truncated\":")
            .await
            .unwrap();
        let cache = ArtifactCache::new(store.clone());

        let (_, source) = cache
            .get_or_produce("t1", || async { Ok(chart_artifact()) })
            .await
            .unwrap();
        assert_eq!(source, CacheSource::Live);
        assert_eq!(cache.get("t1").await, Some(chart_artifact()));
    }
}
