//! Benchmark test set loading (JSONL, one test per line).

use std::collections::HashMap;
use std::path::Path;

use crate::error::{EvalError, EvalResult};
use crate::model::TestCase;

pub fn load_tests(path: &Path) -> EvalResult<Vec<TestCase>> {
    let raw = std::fs::read_to_string(path).map_err(|e| EvalError::Loader {
        line: 0,
        message: format!("cannot read {}: {}", path.display(), e),
    })?;
    parse_tests(&raw)
}

/// Blank lines are skipped; line numbers in errors are 1-based.
pub fn parse_tests(raw: &str) -> EvalResult<Vec<TestCase>> {
    let mut tests = Vec::new();
    for (i, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let test: TestCase = serde_json::from_str(line).map_err(|e| EvalError::Loader {
            line: i + 1,
            message: e.to_string(),
        })?;
        tests.push(test);
    }
    Ok(tests)
}

/// Keep at most `max` tests per group, in input order.
pub fn sample_per_group(tests: Vec<TestCase>, max: usize) -> Vec<TestCase> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    tests
        .into_iter()
        .filter(|t| {
            let n = seen.entry(t.group.clone()).or_default();
            *n += 1;
            *n <= max
        })
        .collect()
}
