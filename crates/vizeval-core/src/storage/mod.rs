//! Key-addressable blob storage behind both caches.
//!
//! # Layout (filesystem backend)
//!
//! ```text
//! <root>/artifacts/{key}.json     # agent output envelope
//! <root>/judgments/{key}.json     # flat list of check results
//! <root>/{ns}/{key}.{uuid}.tmp    # in-flight write, never read as an entry
//! ```
//!
//! `put` is put-or-rollback: bytes land under a temp name and are renamed
//! onto the entry name; on any failure the temp file is removed, so a reader
//! sees either the previous entry or the complete new one.

use async_trait::async_trait;

use crate::error::EvalResult;

mod fs;
mod keys;
mod memory;

pub use fs::FsBlobStore;
pub use keys::{decode_key, encode_key};
pub use memory::MemoryBlobStore;

/// Independent cache namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Artifacts,
    Judgments,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Artifacts => "artifacts",
            Namespace::Judgments => "judgments",
        }
    }
}

#[async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug {
    /// Read an entry. `Ok(None)` on miss.
    async fn get(&self, ns: Namespace, test_id: &str) -> EvalResult<Option<Vec<u8>>>;

    /// Atomically replace an entry.
    async fn put(&self, ns: Namespace, test_id: &str, bytes: &[u8]) -> EvalResult<()>;

    /// Remove an entry. Removing a missing entry is not an error.
    async fn remove(&self, ns: Namespace, test_id: &str) -> EvalResult<()>;

    /// Test ids with a committed entry in `ns`.
    async fn keys(&self, ns: Namespace) -> EvalResult<Vec<String>>;

    /// Drop every entry in `ns`.
    async fn clear(&self, ns: Namespace) -> EvalResult<()>;
}
