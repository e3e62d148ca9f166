//! Request-scoped compile → assemble → execute pipeline.
//!
//! # Stages
//!
//! ```text
//! Allocated ──► SourceWritten ──► FrontEndCompiled ──► NativelyAssembled ──► Executed
//!     │              │                   │                     │                 │
//!     └──────────────┴───────────────────┴─────────────────────┴─────────────────┴──► ArtifactsCollected
//! ```
//!
//! Any stage may fail; the run then jumps straight to artifact collection
//! with `succeeded = false`. Failures never escape [`Pipeline::run`]: the
//! caller always gets a [`PipelineResult`].

use std::fs;

use tokio::process::Command;

use crate::artifacts::ArtifactCollector;
use crate::cache::CompilerBinary;
use crate::config::PipelineConfig;
use crate::error::{Result, StageError};
use crate::graph::{GraphRenderer, repair_graph};
use crate::model::PipelineResult;
use crate::process::{Stage, run_bounded};
use crate::result::ResultAssembler;
use crate::workspace::{Workspace, WorkspaceAllocator, assembly_path_for};

/// Last state a run reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum PipelineState {
    #[default]
    Allocated,
    SourceWritten,
    FrontEndCompiled,
    NativelyAssembled,
    Executed,
    ArtifactsCollected,
}

/// What the stages produced, handed to artifact collection.
#[derive(Debug, Default)]
pub struct RunOutcome {
    pub state: PipelineState,
    pub program_output: String,
    /// Raw assembly, kept even if a later stage fails.
    pub assembly: Option<String>,
    pub image_b64: Option<String>,
    pub log: Vec<String>,
    pub failure: Option<StageError>,
}

impl RunOutcome {
    fn fail(&mut self, error: StageError) {
        self.log.extend(error.log_lines());
        self.failure = Some(error);
    }
}

/// Runs submitted programs through the compile pipeline.
///
/// Shared across requests; every run gets its own [`Workspace`], so runs
/// never touch each other's files.
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    compiler: CompilerBinary,
    allocator: WorkspaceAllocator,
    collector: ArtifactCollector,
    renderer: GraphRenderer,
}

impl Pipeline {
    /// Create a pipeline using a ready compiler.
    ///
    /// Creates the work directory if needed. Workspace paths are absolute so
    /// the user's program can run with the work directory as its cwd.
    pub fn new(mut config: PipelineConfig, compiler: CompilerBinary) -> Result<Self> {
        WorkspaceAllocator::new(&config.work_dir).prepare()?;
        config.work_dir = fs::canonicalize(&config.work_dir)?;
        let allocator = WorkspaceAllocator::new(&config.work_dir);
        let renderer = GraphRenderer::new(&config.renderer, config.render_limits);

        Ok(Self {
            config,
            compiler,
            allocator,
            collector: ArtifactCollector::default(),
            renderer,
        })
    }

    /// Replace the artifact collector.
    pub fn with_collector(mut self, collector: ArtifactCollector) -> Self {
        self.collector = collector;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn compiler(&self) -> &CompilerBinary {
        &self.compiler
    }

    /// Run `source` in a freshly allocated workspace.
    pub async fn run(&self, source: &str) -> PipelineResult {
        let workspace = self.allocator.allocate();
        self.run_in(&workspace, source).await
    }

    /// Run `source` in the given workspace.
    pub async fn run_in(&self, workspace: &Workspace, source: &str) -> PipelineResult {
        tracing::info!(id = %workspace.id, "Pipeline run started");

        let mut outcome = RunOutcome::default();
        if let Err(e) = self.run_stages(workspace, source, &mut outcome).await {
            tracing::info!(id = %workspace.id, stage = %e.stage(), "Pipeline stopped: {}", e);
            outcome.fail(e);
        }

        let collected = self
            .collector
            .collect(workspace, outcome.assembly.as_deref());
        outcome.state = PipelineState::ArtifactsCollected;

        let result = ResultAssembler::assemble(outcome, collected);
        tracing::info!(id = %workspace.id, succeeded = result.succeeded, "Pipeline run finished");
        result
    }

    async fn run_stages(
        &self,
        workspace: &Workspace,
        source: &str,
        outcome: &mut RunOutcome,
    ) -> std::result::Result<(), StageError> {
        fs::write(&workspace.source_path, source).map_err(|source| StageError::SourceWrite {
            path: workspace.source_path.clone(),
            source,
        })?;
        outcome.state = PipelineState::SourceWritten;

        if self.config.render_graph {
            self.debug_graph(workspace, outcome).await;
        }

        let assembly_path = self.front_end(workspace, outcome).await?;
        outcome.state = PipelineState::FrontEndCompiled;

        let assembly = fs::read_to_string(&assembly_path).map_err(|source| StageError::Io {
            stage: Stage::FrontEnd,
            path: assembly_path.clone(),
            source,
        })?;
        outcome.assembly = Some(assembly);

        self.assemble(workspace).await?;
        outcome.state = PipelineState::NativelyAssembled;

        self.execute(workspace, outcome).await?;
        outcome.state = PipelineState::Executed;

        Ok(())
    }

    /// Run the front-end compiler and return the assembly path it wrote.
    ///
    /// Success is the assembly file existing, not the compiler's exit code.
    async fn front_end(
        &self,
        workspace: &Workspace,
        outcome: &mut RunOutcome,
    ) -> std::result::Result<std::path::PathBuf, StageError> {
        let mut cmd = Command::new(self.compiler.path());
        cmd.arg(&workspace.source_path);
        let output = run_bounded(Stage::FrontEnd, &mut cmd, &self.config.front_end_limits).await?;

        let expected = assembly_path_for(&workspace.source_path);
        if !expected.is_file() {
            return Err(StageError::NoAssembly {
                expected,
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }

        if !output.status.success() {
            tracing::debug!(
                id = %workspace.id,
                "Front-end compiler produced assembly despite {}",
                output.status_text()
            );
        }
        if output.truncated {
            outcome.log.push("front-end compiler output truncated".to_string());
        }

        Ok(expected)
    }

    async fn assemble(&self, workspace: &Workspace) -> std::result::Result<(), StageError> {
        let mut cmd = Command::new(&self.config.assembler);
        cmd.args(&self.config.assembler_args)
            .arg(&workspace.assembly_path)
            .arg("-o")
            .arg(&workspace.executable_path);
        let output = run_bounded(Stage::Assemble, &mut cmd, &self.config.assemble_limits).await?;

        if !output.status.success() {
            return Err(StageError::AssembleFailed {
                status: output.status_text(),
                stderr: output.stderr,
            });
        }
        Ok(())
    }

    /// Run the user's program. A non-zero exit is not a failure.
    async fn execute(
        &self,
        workspace: &Workspace,
        outcome: &mut RunOutcome,
    ) -> std::result::Result<(), StageError> {
        let mut cmd = Command::new(&workspace.executable_path);
        cmd.current_dir(&self.config.work_dir);
        let output = run_bounded(Stage::Execute, &mut cmd, &self.config.execute_limits).await?;

        outcome.program_output = output.combined();
        if output.truncated {
            outcome.log.push(format!(
                "program output truncated to {} bytes per stream",
                self.config.execute_limits.max_output_bytes
            ));
        }
        if !output.status.success() {
            outcome.log.push(format!("program finished with {}", output.status_text()));
        }
        Ok(())
    }

    /// Produce the memory-flow image. Never fails the run.
    async fn debug_graph(&self, workspace: &Workspace, outcome: &mut RunOutcome) {
        let mut cmd = Command::new(self.compiler.path());
        cmd.arg(&workspace.source_path).arg("--debug");
        let output =
            match run_bounded(Stage::DebugGraph, &mut cmd, &self.config.front_end_limits).await {
                Ok(output) => output,
                Err(e) => {
                    outcome.log.push(format!("graph unavailable: {}", e));
                    return;
                }
            };

        let Some(graph) = repair_graph(&output.stdout) else {
            outcome.log.push("graph unavailable: no graph found in compiler output".to_string());
            return;
        };

        if !self.renderer.is_available() {
            outcome.log.push(format!(
                "graph unavailable: renderer `{}` not found",
                self.config.renderer
            ));
            return;
        }

        match self.renderer.render(workspace, &graph).await {
            Ok(image) => outcome.image_b64 = Some(image),
            Err(e) => outcome.log.push(format!("graph unavailable: {}", e)),
        }
    }
}
