//! Bounded execution of external programs.
//!
//! Every tool the pipeline touches (toolchain, front-end compiler, renderer,
//! the user's program) goes through [`run_bounded`], which enforces a
//! wall-clock limit and caps how much of each output stream is retained.

use std::fmt;
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::config::StageLimits;
use crate::error::StageError;

/// Pipeline stage an external invocation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Building the front-end compiler itself (startup only).
    Build,
    /// Persisting the submitted source.
    WriteSource,
    /// Front-end compiler in `--debug` mode, producing a graph description.
    DebugGraph,
    /// Front-end compiler producing assembly.
    FrontEnd,
    /// Native toolchain assembling and linking.
    Assemble,
    /// Running the user's program.
    Execute,
    /// Graph renderer producing an image.
    Render,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Build => "compiler build",
            Self::WriteSource => "source write",
            Self::DebugGraph => "debug graph",
            Self::FrontEnd => "front-end compile",
            Self::Assemble => "native assemble",
            Self::Execute => "program execution",
            Self::Render => "graph render",
        };
        f.write_str(name)
    }
}

/// Captured result of a finished process.
#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    /// Set when either stream exceeded the retention cap.
    pub truncated: bool,
}

impl ProcessOutput {
    /// Standard output followed by standard error.
    pub fn combined(&self) -> String {
        let mut text = String::with_capacity(self.stdout.len() + self.stderr.len());
        text.push_str(&self.stdout);
        text.push_str(&self.stderr);
        text
    }

    /// Exit status as shown to users.
    pub fn status_text(&self) -> String {
        match self.status.code() {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Run `command` to completion within `limits`.
///
/// Stdin is closed. Both output streams are drained fully so the child never
/// blocks on a full pipe, but at most `limits.max_output_bytes` of each is
/// kept. On timeout the child is killed and [`StageError::TimedOut`] is
/// returned.
pub async fn run_bounded(
    stage: Stage,
    command: &mut Command,
    limits: &StageLimits,
) -> Result<ProcessOutput, StageError> {
    let program = command
        .as_std()
        .get_program()
        .to_string_lossy()
        .into_owned();

    tracing::debug!(%stage, %program, "spawning process");

    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command.spawn().map_err(|source| StageError::Spawn {
        stage,
        program: program.clone(),
        source,
    })?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let cap = limits.max_output_bytes;

    let collect = async {
        let (out, err, status) = tokio::join!(
            read_capped(stdout, cap),
            read_capped(stderr, cap),
            child.wait()
        );
        let io_err = |source| StageError::Spawn {
            stage,
            program: program.clone(),
            source,
        };
        let (stdout, out_truncated) = out.map_err(io_err)?;
        let (stderr, err_truncated) = err.map_err(io_err)?;
        let status = status.map_err(io_err)?;
        Ok::<_, StageError>(ProcessOutput {
            status,
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            truncated: out_truncated || err_truncated,
        })
    };

    let outcome = tokio::time::timeout(limits.timeout, collect).await;
    match outcome {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(%stage, %program, "process exceeded {:?}, killing", limits.timeout);
            if let Err(e) = child.kill().await {
                tracing::debug!("kill after timeout failed: {}", e);
            }
            Err(StageError::TimedOut {
                stage,
                limit: limits.timeout,
            })
        }
    }
}

/// Drain `reader` to EOF, keeping at most `cap` bytes.
async fn read_capped<R>(reader: Option<R>, cap: usize) -> std::io::Result<(Vec<u8>, bool)>
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return Ok((Vec::new(), false));
    };

    let mut kept = Vec::new();
    let mut truncated = false;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        let room = cap.saturating_sub(kept.len());
        if n > room {
            truncated = true;
        }
        kept.extend_from_slice(&chunk[..n.min(room)]);
    }

    Ok((kept, truncated))
}

#[cfg(all(test, unix))]
mod tests {
    use std::time::Duration;

    use super::*;

    fn limits(timeout_ms: u64, max_output_bytes: usize) -> StageLimits {
        StageLimits {
            timeout: Duration::from_millis(timeout_ms),
            max_output_bytes,
        }
    }

    #[tokio::test]
    async fn test_captures_both_streams() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo out; echo err 1>&2; exit 3"]);
        let output = run_bounded(Stage::Execute, &mut cmd, &limits(5_000, 1024))
            .await
            .unwrap();

        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
        assert_eq!(output.combined(), "out\nerr\n");
        assert_eq!(output.status.code(), Some(3));
        assert!(!output.truncated);
    }

    #[tokio::test]
    async fn test_output_is_capped() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "printf 'abcdefghij'"]);
        let output = run_bounded(Stage::Execute, &mut cmd, &limits(5_000, 4))
            .await
            .unwrap();

        assert_eq!(output.stdout, "abcd");
        assert!(output.truncated);
    }

    #[tokio::test]
    async fn test_timeout_kills_process() {
        let mut cmd = Command::new("sleep");
        cmd.arg("10");
        let err = run_bounded(Stage::Execute, &mut cmd, &limits(100, 1024))
            .await
            .unwrap_err();

        assert!(matches!(err, StageError::TimedOut { stage: Stage::Execute, .. }));
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let mut cmd = Command::new("/nonexistent/asmscope-test-binary");
        let err = run_bounded(Stage::FrontEnd, &mut cmd, &limits(1_000, 1024))
            .await
            .unwrap_err();

        assert!(matches!(err, StageError::Spawn { stage: Stage::FrontEnd, .. }));
    }
}
