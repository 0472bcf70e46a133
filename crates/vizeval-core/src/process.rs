//! JSON-over-stdio invocation of external programs (agents, checks).

use std::process::Stdio;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::config::CommandSpec;
use crate::error::{EvalError, EvalResult};

const STDERR_EXCERPT: usize = 500;

fn build_command(spec: &CommandSpec, extra_args: &[String]) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new(&spec.program);
    cmd.args(&spec.args)
        .args(extra_args)
        .envs(&spec.env)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}

/// Run `spec` with `input` serialized as JSON on stdin and parse stdout as `T`.
///
/// The child is killed if the call is dropped (e.g. by an outer per-test
/// deadline).
pub async fn run_json<I, T>(spec: &CommandSpec, extra_args: &[String], input: &I) -> EvalResult<T>
where
    I: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let fail = |message: String| EvalError::Command {
        program: spec.program.clone(),
        message,
    };

    let payload =
        serde_json::to_vec(input).map_err(|e| fail(format!("cannot encode request: {}", e)))?;

    debug!(program = %spec.program, bytes = payload.len(), "spawning command");
    let mut child = build_command(spec, extra_args)
        .spawn()
        .map_err(|e| fail(format!("failed to spawn: {}", e)))?;

    // Feed stdin while stdout and stderr drain; the deadline covers both.
    let stdin = child.stdin.take();
    let exchange = async move {
        let write = async move {
            match stdin {
                Some(mut stdin) => match stdin.write_all(&payload).await {
                    // A program that ignores its input may close stdin early.
                    Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
                    other => other,
                },
                None => Ok(()),
            }
        };
        tokio::join!(write, child.wait_with_output())
    };

    let (written, output) = match spec.timeout_secs {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), exchange)
            .await
            .map_err(|_| fail(format!("timed out after {}s", secs)))?,
        None => exchange.await,
    };
    written.map_err(|e| fail(format!("failed to write stdin: {}", e)))?;
    let output = output.map_err(|e| fail(format!("process error: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(fail(format!(
            "exited with {}: {}",
            output.status.code().unwrap_or(-1),
            stderr.trim().chars().take(STDERR_EXCERPT).collect::<String>()
        )));
    }

    serde_json::from_slice(&output.stdout)
        .map_err(|e| fail(format!("malformed JSON on stdout: {}", e)))
}
