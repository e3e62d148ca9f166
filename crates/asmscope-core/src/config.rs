//! Configuration for the compiler cache and the request pipeline.

use std::path::PathBuf;
use std::time::Duration;

/// Time and output bounds for one external invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageLimits {
    /// Wall-clock limit before the process is killed.
    pub timeout: Duration,

    /// Bytes retained per output stream; the rest is drained and dropped.
    pub max_output_bytes: usize,
}

impl StageLimits {
    /// Limits with the default 64 KiB output cap.
    pub const fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            max_output_bytes: 64 * 1024,
        }
    }
}

impl Default for StageLimits {
    fn default() -> Self {
        Self::with_timeout(Duration::from_secs(10))
    }
}

/// How [`crate::CompilerCache`] decides the binary is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Freshness {
    /// Rebuild when any source is strictly newer than the binary.
    #[default]
    ModifiedTime,

    /// Rebuild when the hash of all sources differs from the recorded one.
    ContentHash,
}

/// Configuration for building the front-end compiler.
#[derive(Debug, Clone)]
pub struct CompilerBuildConfig {
    /// Every source file the binary is built from.
    pub sources: Vec<PathBuf>,

    /// Where the built binary lives.
    pub binary: PathBuf,

    /// Native toolchain program (resolved through `PATH`).
    pub toolchain: String,

    /// Extra toolchain arguments, placed before the sources.
    pub toolchain_args: Vec<String>,

    /// Staleness policy.
    pub freshness: Freshness,

    /// Bounds for the build invocation.
    pub limits: StageLimits,
}

impl CompilerBuildConfig {
    /// Source files the front-end compiler is built from, relative to its
    /// source directory.
    pub const DEFAULT_SOURCES: [&'static str; 6] = [
        "main.cpp",
        "scanner.cpp",
        "parser.cpp",
        "ast.cpp",
        "visitor.cpp",
        "token.cpp",
    ];

    /// Build configuration for a compiler source directory, with the binary
    /// placed in `work_dir`.
    pub fn for_source_dir(source_dir: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
        let source_dir = source_dir.into();
        Self {
            sources: Self::DEFAULT_SOURCES
                .iter()
                .map(|name| source_dir.join(name))
                .collect(),
            binary: work_dir.into().join("compiler.out"),
            ..Self::default()
        }
    }
}

impl Default for CompilerBuildConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            binary: PathBuf::from("temp/compiler.out"),
            toolchain: "g++".to_string(),
            toolchain_args: Vec::new(),
            freshness: Freshness::default(),
            limits: StageLimits::with_timeout(Duration::from_secs(60)),
        }
    }
}

/// Configuration for per-request pipeline runs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Base directory every workspace lives in.
    pub work_dir: PathBuf,

    /// Native toolchain used to assemble and link generated assembly.
    pub assembler: String,

    /// Extra assembler arguments, placed before the assembly path.
    pub assembler_args: Vec<String>,

    /// Whether to run the debug-graph stage.
    pub render_graph: bool,

    /// Graph renderer program.
    pub renderer: String,

    /// Bounds for the front-end compiler (both modes).
    pub front_end_limits: StageLimits,

    /// Bounds for the native assemble/link step.
    pub assemble_limits: StageLimits,

    /// Bounds for running the user's program.
    pub execute_limits: StageLimits,

    /// Bounds for the graph renderer.
    pub render_limits: StageLimits,
}

impl PipelineConfig {
    /// Default configuration rooted at `work_dir`.
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            ..Self::default()
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("temp"),
            assembler: "g++".to_string(),
            assembler_args: Vec::new(),
            render_graph: false,
            renderer: "dot".to_string(),
            front_end_limits: StageLimits::default(),
            assemble_limits: StageLimits::default(),
            execute_limits: StageLimits::with_timeout(Duration::from_secs(5)),
            render_limits: StageLimits::default(),
        }
    }
}
