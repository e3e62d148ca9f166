//! Error types for asmscope-core.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::process::Stage;

/// Result type for asmscope-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can escape asmscope-core.
///
/// Per-request failures never show up here; they are absorbed into
/// [`crate::PipelineResult`]. Compiler build failures have their own
/// [`BuildError`].
#[derive(Debug, Error)]
pub enum Error {
    /// The work directory could not be prepared.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to produce the front-end compiler binary.
///
/// Fatal to the whole process: no request may be served without a binary.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A declared compiler source file does not exist.
    #[error("compiler source not found: {}", .0.display())]
    MissingSource(PathBuf),

    /// The native toolchain program could not be located.
    #[error("toolchain `{program}` not found in PATH")]
    ToolchainNotFound { program: String },

    /// The native toolchain ran and rejected the sources.
    #[error("compiler build failed ({status}):\n{stderr}")]
    Toolchain { status: String, stderr: String },

    /// The build ran past its time limit.
    #[error("compiler build timed out after {}s", .0.as_secs_f64())]
    TimedOut(Duration),

    /// Spawning the toolchain failed.
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// IO error while inspecting sources or the binary.
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Typed outcome of a failed pipeline stage.
///
/// Each variant carries the context that ends up in the diagnostic log.
#[derive(Debug, Error)]
pub enum StageError {
    /// The submitted source could not be persisted.
    #[error("failed to write source to {}: {source}", path.display())]
    SourceWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An external program could not be launched.
    #[error("internal error: failed to launch `{program}` during {stage}: {source}")]
    Spawn {
        stage: Stage,
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// An external program exceeded its time limit and was killed.
    #[error("{stage} timed out after {}s", limit.as_secs_f64())]
    TimedOut { stage: Stage, limit: Duration },

    /// The front-end compiler finished without writing assembly.
    #[error("no assembly produced at {}", expected.display())]
    NoAssembly {
        expected: PathBuf,
        stdout: String,
        stderr: String,
    },

    /// The native toolchain rejected the generated assembly.
    #[error("assembler failed ({status}): {stderr}")]
    AssembleFailed { status: String, stderr: String },

    /// Any other IO failure inside the workspace.
    #[error("internal error: IO error at {} during {stage}: {source}", path.display())]
    Io {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StageError {
    /// Render this failure as diagnostic log entries.
    ///
    /// `NoAssembly` keeps both compiler streams verbatim, labeled separately.
    pub fn log_lines(&self) -> Vec<String> {
        match self {
            Self::NoAssembly { stdout, stderr, .. } => vec![
                self.to_string(),
                format!("compiler stdout: {}", stdout),
                format!("compiler stderr: {}", stderr),
            ],
            _ => vec![self.to_string()],
        }
    }

    /// Stage the failure belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            Self::SourceWrite { .. } => Stage::WriteSource,
            Self::Spawn { stage, .. } | Self::TimedOut { stage, .. } | Self::Io { stage, .. } => {
                *stage
            }
            Self::NoAssembly { .. } => Stage::FrontEnd,
            Self::AssembleFailed { .. } => Stage::Assemble,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_assembly_logs_both_streams() {
        let err = StageError::NoAssembly {
            expected: PathBuf::from("/tmp/x.s"),
            stdout: "parsing".to_string(),
            stderr: "syntax error".to_string(),
        };
        let lines = err.log_lines();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("no assembly produced"));
        assert_eq!(lines[1], "compiler stdout: parsing");
        assert_eq!(lines[2], "compiler stderr: syntax error");
    }

    #[test]
    fn test_timeout_is_distinct() {
        let err = StageError::TimedOut {
            stage: Stage::Execute,
            limit: Duration::from_secs(5),
        };
        assert_eq!(err.stage(), Stage::Execute);
        assert_eq!(err.to_string(), "program execution timed out after 5s");
    }

    #[test]
    fn test_io_failure_keeps_its_stage() {
        let err = StageError::Io {
            stage: Stage::FrontEnd,
            path: PathBuf::from("/tmp/x.s"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.stage(), Stage::FrontEnd);
        assert!(
            err.to_string()
                .starts_with("internal error: IO error at /tmp/x.s during front-end compile")
        );
    }

    #[test]
    fn test_prepare_failure_is_io_error() {
        let err = Error::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.to_string(), "IO error: gone");
    }
}
