//! Pure reduction of result records into fail rates and quality scores.
//!
//! Records are grouped by test id first; each record of an id is one trial.
//! Per-id metrics are fractions (or means) over that id's trials, and the
//! global score is the unweighted mean of each metric across ids.
//!
//! An aspect that never ran in a trial (the pipeline stopped earlier) counts
//! as passed for that trial.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::aspect::{Aspect, AspectGroup};
use crate::model::{ResultRecord, TestCase};

pub const INVALID_RATE: &str = "invalid_rate";
pub const ILLEGAL_RATE: &str = "illegal_rate";
pub const PASS_RATE: &str = "pass_rate";
pub const READABILITY_SCORE: &str = "readability_score";
pub const QUALITY_SCORE: &str = "quality_score";

/// Bucket for records whose test id is not in the test set.
pub const UNKNOWN_BUCKET: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestScore {
    pub test_id: String,
    pub trials: usize,
    pub invalid_rate: f64,
    pub illegal_rate: f64,
    pub pass_rate: f64,
    /// Undefined when no trial passed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readability_score: Option<f64>,
    pub quality_score: f64,
    /// `<aspect>_fail_rate` for every aspect.
    #[serde(flatten)]
    pub fail_rates: BTreeMap<String, f64>,
}

impl TestScore {
    fn from_trials(test_id: &str, trials: &[&ResultRecord]) -> Self {
        let count = trials.len() as f64;
        let fraction = |pred: &dyn Fn(&ResultRecord) -> bool| {
            trials.iter().filter(|&&r| pred(r)).count() as f64 / count
        };

        let fail_rates = Aspect::ALL
            .iter()
            .map(|aspect| {
                (
                    aspect.fail_rate_key(),
                    fraction(&|r: &ResultRecord| r.aspect_failed(*aspect)),
                )
            })
            .collect();

        let passing: Vec<&&ResultRecord> = trials.iter().filter(|r| r.passed()).collect();
        let readability_sum: f64 = passing.iter().map(|r| r.readability_value()).sum();
        let all_sum: f64 = trials.iter().map(|r| r.readability_value()).sum();

        Self {
            test_id: test_id.to_string(),
            trials: trials.len(),
            invalid_rate: fraction(&|r: &ResultRecord| r.group_failed(AspectGroup::Valid)),
            illegal_rate: fraction(&|r: &ResultRecord| r.group_failed(AspectGroup::Legal)),
            pass_rate: passing.len() as f64 / count,
            readability_score: if passing.is_empty() {
                None
            } else {
                Some(readability_sum / passing.len() as f64)
            },
            quality_score: all_sum / count,
            fail_rates,
        }
    }

    /// Flat metric map; `readability_score` is absent when undefined.
    pub fn metrics(&self) -> BTreeMap<String, f64> {
        let mut m = self.fail_rates.clone();
        m.insert(INVALID_RATE.to_string(), self.invalid_rate);
        m.insert(ILLEGAL_RATE.to_string(), self.illegal_rate);
        m.insert(PASS_RATE.to_string(), self.pass_rate);
        if let Some(score) = self.readability_score {
            m.insert(READABILITY_SCORE.to_string(), score);
        }
        m.insert(QUALITY_SCORE.to_string(), self.quality_score);
        m
    }
}

/// Per-test-id scores, ordered by test id.
pub fn score_tests(records: &[ResultRecord]) -> Vec<TestScore> {
    let mut by_id: BTreeMap<&str, Vec<&ResultRecord>> = BTreeMap::new();
    for record in records {
        by_id.entry(record.test_id.as_str()).or_default().push(record);
    }
    by_id
        .into_iter()
        .map(|(id, trials)| TestScore::from_trials(id, &trials))
        .collect()
}

/// Global score: the mean of each metric over the ids that define it.
pub fn score(records: &[ResultRecord]) -> BTreeMap<String, f64> {
    mean_of(&score_tests(records))
}

pub fn mean_of(scores: &[TestScore]) -> BTreeMap<String, f64> {
    let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for s in scores {
        for (key, value) in s.metrics() {
            let slot = sums.entry(key).or_insert((0.0, 0));
            slot.0 += value;
            slot.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(key, (sum, n))| (key, sum / n as f64))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breakdown {
    Chart,
    Difficulty,
}

/// Global metrics per chart kind or per difficulty label.
pub fn breakdown(
    records: &[ResultRecord],
    tests: &[TestCase],
    by: Breakdown,
) -> BTreeMap<String, BTreeMap<String, f64>> {
    let index: BTreeMap<&str, &TestCase> = tests.iter().map(|t| (t.id.as_str(), t)).collect();

    let mut buckets: BTreeMap<String, Vec<TestScore>> = BTreeMap::new();
    for score in score_tests(records) {
        let bucket = match index.get(score.test_id.as_str()) {
            Some(test) => match by {
                Breakdown::Chart => test.ground_truth.chart.clone(),
                Breakdown::Difficulty => test.difficulty.clone(),
            },
            None => UNKNOWN_BUCKET.to_string(),
        };
        buckets.entry(bucket).or_default().push(score);
    }

    buckets
        .into_iter()
        .map(|(bucket, scores)| (bucket, mean_of(&scores)))
        .collect()
}
