//! Core engine for asmscope.
//!
//! Turns a submitted source program into a native run, its generated
//! assembly, and a source line -> instruction correlation.
//!
//! This crate provides:
//! - Per-request workspace allocation
//! - Build-and-cache of the front-end compiler binary
//! - The compile → assemble → execute pipeline with bounded processes
//! - Artifact collection (stack snapshots, line maps, marker scanning)
//! - Debug-graph repair and rendering

pub mod artifacts;
pub mod cache;
pub mod config;
pub mod error;
pub mod graph;
pub mod model;
pub mod pipeline;
pub mod process;
pub mod result;
pub mod workspace;

pub use artifacts::{
    ArtifactCollector, CollectedArtifacts, LineMapStrategy, MarkerScan, MarkerScanner,
    StructuredLineMap,
};
pub use cache::{CacheStatus, CompilerBinary, CompilerCache};
pub use config::{CompilerBuildConfig, Freshness, PipelineConfig, StageLimits};
pub use error::{BuildError, Error, Result, StageError};
pub use model::{LineInstructionMap, PipelineResult, StackFrame, StackVariable};
pub use pipeline::{Pipeline, PipelineState, RunOutcome};
pub use process::Stage;
pub use result::ResultAssembler;
pub use workspace::{Workspace, WorkspaceAllocator};
