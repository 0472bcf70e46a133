//! Result records as JSONL, one record per line. Several files from
//! repeated runs can be scored together as independent trials.

use std::path::Path;

use crate::error::{EvalError, EvalResult};
use crate::model::ResultRecord;
use crate::report::write_atomic;

pub fn write_records(path: &Path, records: &[ResultRecord]) -> EvalResult<()> {
    let mut out = Vec::new();
    for record in records {
        serde_json::to_writer(&mut out, record).map_err(|e| EvalError::Codec {
            key: record.test_id.clone(),
            message: e.to_string(),
        })?;
        out.push(b'\n');
    }
    write_atomic(path, &out)
}

pub fn read_records(path: &Path) -> EvalResult<Vec<ResultRecord>> {
    let raw = std::fs::read_to_string(path).map_err(|e| EvalError::Loader {
        line: 0,
        message: format!("cannot read {}: {}", path.display(), e),
    })?;
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|e| EvalError::Loader {
                line: i + 1,
                message: format!("{}: {}", path.display(), e),
            })
        })
        .collect()
}
