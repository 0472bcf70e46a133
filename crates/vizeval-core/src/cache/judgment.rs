use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{EvalError, EvalResult};
use crate::model::{CheckResult, ResultRecord};
use crate::storage::{BlobStore, Namespace};

/// Finalized check results keyed by test id, stored as a flat JSON list of
/// `{answer, aspect, rationale}`.
#[derive(Debug, Clone)]
pub struct JudgmentCache {
    store: Arc<dyn BlobStore>,
}

impl JudgmentCache {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, test_id: &str) -> Option<ResultRecord> {
        let bytes = match self.store.get(Namespace::Judgments, test_id).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!(test_id, error = %e, "judgment cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_slice::<Vec<CheckResult>>(&bytes) {
            Ok(results) => {
                debug!(test_id, "judgment cache hit");
                Some(ResultRecord::new(test_id, results))
            }
            Err(e) => {
                warn!(test_id, error = %e, "corrupt judgment cache entry, evicting");
                if let Err(e) = self.store.remove(Namespace::Judgments, test_id).await {
                    warn!(test_id, error = %e, "failed to evict judgment cache entry");
                }
                None
            }
        }
    }

    /// Store (or overwrite) the results of `record`.
    pub async fn put(&self, record: &ResultRecord) -> EvalResult<()> {
        let bytes = serde_json::to_vec_pretty(&record.results).map_err(|e| EvalError::Codec {
            key: record.test_id.clone(),
            message: format!("failed to serialize check results: {}", e),
        })?;
        self.store
            .put(Namespace::Judgments, &record.test_id, &bytes)
            .await
    }

    pub async fn remove(&self, test_id: &str) -> EvalResult<()> {
        self.store.remove(Namespace::Judgments, test_id).await
    }

    /// Every readable entry, ordered by test id. Corrupt entries are skipped.
    pub async fn list(&self) -> EvalResult<Vec<ResultRecord>> {
        let mut records = Vec::new();
        for test_id in self.store.keys(Namespace::Judgments).await? {
            if let Some(record) = self.get(&test_id).await {
                records.push(record);
            }
        }
        Ok(records)
    }
}
