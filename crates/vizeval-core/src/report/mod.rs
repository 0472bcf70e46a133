pub mod console;
pub mod progress;
pub mod records;
pub mod summary;

pub use progress::{ProgressEvent, ProgressSink};
pub use records::{read_records, write_records};
pub use summary::{write_summary, ScoreSummary};

use std::path::Path;

use crate::error::{EvalError, EvalResult};

/// Write via a sibling temp file and rename; the temp file is removed on
/// failure.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> EvalResult<()> {
    let io_err = |what: &str, e: std::io::Error| EvalError::Output {
        path: path.display().to_string(),
        message: format!("{}: {}", what, e),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_err("create parent directory", e))?;
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(
        ".{}.{}.tmp",
        file_name,
        uuid::Uuid::new_v4().simple()
    ));

    let result = std::fs::write(&tmp, bytes)
        .map_err(|e| io_err("write temp file", e))
        .and_then(|_| std::fs::rename(&tmp, path).map_err(|e| io_err("rename into place", e)));
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}
