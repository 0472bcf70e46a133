use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::keys::{decode_key, encode_key};
use super::{BlobStore, Namespace};
use crate::error::{EvalError, EvalResult};

const ENTRY_EXT: &str = "json";
const TEMP_EXT: &str = "tmp";

/// Filesystem blob store rooted at one directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default location: `<user cache dir>/vizeval`.
    pub fn default_root() -> EvalResult<PathBuf> {
        let base = dirs::cache_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| EvalError::cache("could not determine cache directory"))?;
        Ok(base.join("vizeval"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ns_dir(&self, ns: Namespace) -> PathBuf {
        self.root.join(ns.as_str())
    }

    pub(crate) fn entry_path(&self, ns: Namespace, test_id: &str) -> PathBuf {
        self.ns_dir(ns)
            .join(format!("{}.{}", encode_key(test_id), ENTRY_EXT))
    }
}

/// Removes the temp file on drop unless disarmed. Covers a `put` cancelled
/// between write and rename.
struct TempFileGuard {
    path: PathBuf,
    armed: bool,
}

impl TempFileGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if self.armed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

async fn write_then_rename(temp_path: &Path, path: &Path, bytes: &[u8]) -> EvalResult<()> {
    fs::write(temp_path, bytes)
        .await
        .map_err(|e| EvalError::cache(format!("failed to write temp file: {}", e)))?;

    fs::rename(temp_path, path)
        .await
        .map_err(|e| EvalError::cache(format!("failed to rename temp file: {}", e)))?;

    Ok(())
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn get(&self, ns: Namespace, test_id: &str) -> EvalResult<Option<Vec<u8>>> {
        let path = self.entry_path(ns, test_id);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(EvalError::cache(format!(
                "failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn put(&self, ns: Namespace, test_id: &str, bytes: &[u8]) -> EvalResult<()> {
        let dir = self.ns_dir(ns);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| EvalError::cache(format!("failed to create cache directory: {}", e)))?;

        let path = self.entry_path(ns, test_id);
        let temp_path = dir.join(format!(
            "{}.{}.{}",
            encode_key(test_id),
            uuid::Uuid::new_v4().simple(),
            TEMP_EXT
        ));

        let guard = TempFileGuard::new(temp_path);
        write_then_rename(&guard.path, &path, bytes).await?;
        guard.disarm();
        debug!(ns = ns.as_str(), test_id, "stored cache entry");
        Ok(())
    }

    async fn remove(&self, ns: Namespace, test_id: &str) -> EvalResult<()> {
        let path = self.entry_path(ns, test_id);
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(ns = ns.as_str(), test_id, "evicted cache entry");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(EvalError::cache(format!(
                "failed to evict cache entry: {}",
                e
            ))),
        }
    }

    async fn keys(&self, ns: Namespace) -> EvalResult<Vec<String>> {
        let dir = self.ns_dir(ns);
        let mut ids = Vec::new();
        if !dir.exists() {
            return Ok(ids);
        }

        let mut entries = fs::read_dir(&dir)
            .await
            .map_err(|e| EvalError::cache(format!("failed to read cache directory: {}", e)))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| EvalError::cache(format!("failed to read directory entry: {}", e)))?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            let Some(stem) = name.strip_suffix(&format!(".{}", ENTRY_EXT)) else {
                continue;
            };
            if let Some(id) = decode_key(stem) {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }

    async fn clear(&self, ns: Namespace) -> EvalResult<()> {
        let dir = self.ns_dir(ns);
        if dir.exists() {
            fs::remove_dir_all(&dir)
                .await
                .map_err(|e| EvalError::cache(format!("failed to clear cache: {}", e)))?;
            debug!(ns = ns.as_str(), "cleared cache namespace");
        }
        Ok(())
    }
}
