//! Machine-readable score summary (`summary.json`).

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EvalError, EvalResult};
use crate::model::{ResultRecord, TestCase};
use crate::report::write_atomic;
use crate::scoring::{breakdown, mean_of, score_tests, Breakdown, TestScore};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub schema_version: u32,
    /// RFC 3339 creation time.
    pub generated_at: String,
    /// Distinct test ids scored.
    pub tests: usize,
    /// Records (trials) scored.
    pub records: usize,
    pub scores: BTreeMap<String, f64>,
    pub per_test: Vec<serde_json::Value>,
    pub by_chart: BTreeMap<String, BTreeMap<String, f64>>,
    pub by_difficulty: BTreeMap<String, BTreeMap<String, f64>>,
}

impl ScoreSummary {
    pub fn build(records: &[ResultRecord], tests: &[TestCase]) -> Self {
        let per_test: Vec<TestScore> = score_tests(records);
        Self {
            schema_version: SCHEMA_VERSION,
            generated_at: chrono::Utc::now().to_rfc3339(),
            tests: per_test.len(),
            records: records.len(),
            scores: mean_of(&per_test),
            per_test: per_test
                .iter()
                .filter_map(|s| serde_json::to_value(s).ok())
                .collect(),
            by_chart: breakdown(records, tests, Breakdown::Chart),
            by_difficulty: breakdown(records, tests, Breakdown::Difficulty),
        }
    }
}

pub fn write_summary(summary: &ScoreSummary, out: &Path) -> EvalResult<()> {
    let json = serde_json::to_vec_pretty(summary).map_err(|e| EvalError::Codec {
        key: out.display().to_string(),
        message: e.to_string(),
    })?;
    write_atomic(out, &json)
}
