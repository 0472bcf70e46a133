//! Process exit codes. Part of the public contract of the `vizeval` binary.
//!
//! Failing checks are benchmark results, not errors: a completed run exits
//! with [`EXIT_SUCCESS`] whatever the pass rate.

use vizeval_core::EvalError;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_CONFIG_ERROR: i32 = 2; // bad config, arguments, or input files
pub const EXIT_INFRA_ERROR: i32 = 3; // cache, output, or external program failure

/// Exit code for an error that aborted a command.
pub fn from_error(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<EvalError>())
        .map(EvalError::exit_code)
        .unwrap_or(EXIT_INFRA_ERROR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_errors_keep_their_code() {
        let err = anyhow::Error::new(EvalError::config("bad yaml"));
        assert_eq!(from_error(&err), EXIT_CONFIG_ERROR);

        let err = anyhow::Error::new(EvalError::cache("disk full")).context("writing cache");
        assert_eq!(from_error(&err), EXIT_INFRA_ERROR);
    }

    #[test]
    fn foreign_errors_are_infrastructure() {
        assert_eq!(from_error(&anyhow::anyhow!("boom")), EXIT_INFRA_ERROR);
    }
}
