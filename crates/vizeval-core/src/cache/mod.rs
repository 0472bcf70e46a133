//! The two cache tiers.
//!
//! - [`ArtifactCache`]: agent output per test id, so a rerun never calls the
//!   agent again for a test it already answered.
//! - [`JudgmentCache`]: the finalized check results per test id. A hit skips
//!   the whole pipeline, agent included.
//!
//! Neither tier expires entries. Corrupt entries are evicted on read and
//! reported as misses.

mod artifact;
mod codec;
mod judgment;

pub use artifact::{ArtifactCache, CacheSource};
pub use codec::{ArtifactCodec, JsonArtifactCodec};
pub use judgment::JudgmentCache;
