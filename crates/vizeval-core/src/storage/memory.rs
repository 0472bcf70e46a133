use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{BlobStore, Namespace};
use crate::error::EvalResult;

/// In-process store; entries live as long as the value.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    entries: Mutex<HashMap<(Namespace, String), Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<(Namespace, String), Vec<u8>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self, ns: Namespace) -> usize {
        self.entries()
            .keys()
            .filter(|(n, _)| *n == ns)
            .count()
    }

    pub fn is_empty(&self, ns: Namespace) -> bool {
        self.len(ns) == 0
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, ns: Namespace, test_id: &str) -> EvalResult<Option<Vec<u8>>> {
        Ok(self.entries()
            .get(&(ns, test_id.to_string()))
            .cloned())
    }

    async fn put(&self, ns: Namespace, test_id: &str, bytes: &[u8]) -> EvalResult<()> {
        self.entries()
            .insert((ns, test_id.to_string()), bytes.to_vec());
        Ok(())
    }

    async fn remove(&self, ns: Namespace, test_id: &str) -> EvalResult<()> {
        self.entries()
            .remove(&(ns, test_id.to_string()));
        Ok(())
    }

    async fn keys(&self, ns: Namespace) -> EvalResult<Vec<String>> {
        let mut ids: Vec<String> = self.entries()
            .keys()
            .filter(|(n, _)| *n == ns)
            .map(|(_, id)| id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn clear(&self, ns: Namespace) -> EvalResult<()> {
        self.entries().retain(|(n, _), _| *n != ns);
        Ok(())
    }
}
