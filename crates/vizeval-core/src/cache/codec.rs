use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{EvalError, EvalResult};
use crate::model::ProducedArtifact;

/// Encoding seam for artifact entries.
pub trait ArtifactCodec: Send + Sync {
    fn encode(&self, test_id: &str, artifact: &ProducedArtifact) -> EvalResult<Vec<u8>>;
    fn decode(&self, test_id: &str, bytes: &[u8]) -> EvalResult<ProducedArtifact>;
}

/// On-disk artifact entry. The digest covers the serialized artifact and is
/// checked on every read.
#[derive(Debug, Serialize, Deserialize)]
struct ArtifactEnvelope {
    digest: String,
    stored_at: DateTime<Utc>,
    artifact: ProducedArtifact,
}

fn artifact_digest(test_id: &str, artifact: &ProducedArtifact) -> EvalResult<String> {
    let bytes = serde_json::to_vec(artifact).map_err(|e| EvalError::Codec {
        key: test_id.to_string(),
        message: format!("failed to serialize artifact: {}", e),
    })?;
    Ok(format!("sha256:{}", hex::encode(Sha256::digest(&bytes))))
}

/// JSON envelope codec with integrity digest.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonArtifactCodec;

impl ArtifactCodec for JsonArtifactCodec {
    fn encode(&self, test_id: &str, artifact: &ProducedArtifact) -> EvalResult<Vec<u8>> {
        let envelope = ArtifactEnvelope {
            digest: artifact_digest(test_id, artifact)?,
            stored_at: Utc::now(),
            artifact: artifact.clone(),
        };
        serde_json::to_vec_pretty(&envelope).map_err(|e| EvalError::Codec {
            key: test_id.to_string(),
            message: format!("failed to serialize artifact envelope: {}", e),
        })
    }

    fn decode(&self, test_id: &str, bytes: &[u8]) -> EvalResult<ProducedArtifact> {
        let envelope: ArtifactEnvelope =
            serde_json::from_slice(bytes).map_err(|e| EvalError::Codec {
                key: test_id.to_string(),
                message: format!("failed to parse artifact envelope: {}", e),
            })?;
        let actual = artifact_digest(test_id, &envelope.artifact)?;
        if actual != envelope.digest {
            return Err(EvalError::Codec {
                key: test_id.to_string(),
                message: format!(
                    "digest mismatch: expected {}, got {}",
                    envelope.digest, actual
                ),
            });
        }
        Ok(envelope.artifact)
    }
}
