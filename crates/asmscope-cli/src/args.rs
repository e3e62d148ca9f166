//! Command-line options shared by `serve` and `compile`.

use std::path::PathBuf;
use std::time::Duration;

use asmscope_core::{
    CompilerBinary, CompilerBuildConfig, Freshness, Pipeline, PipelineConfig, StageLimits,
};
use clap::{Args, ValueEnum};

/// Staleness policy for the compiler binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FreshnessArg {
    /// Compare modification times
    Mtime,
    /// Compare a hash of the sources
    Hash,
}

impl From<FreshnessArg> for Freshness {
    fn from(arg: FreshnessArg) -> Self {
        match arg {
            FreshnessArg::Mtime => Freshness::ModifiedTime,
            FreshnessArg::Hash => Freshness::ContentHash,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct PipelineArgs {
    /// Directory for per-request workspaces and the built compiler
    #[arg(long, default_value = "temp")]
    pub work_dir: PathBuf,

    /// Directory holding the front-end compiler sources
    #[arg(long, default_value = "compiler_src", conflicts_with = "compiler_bin")]
    pub compiler_src: PathBuf,

    /// Use an already built front-end compiler instead of building one
    #[arg(long)]
    pub compiler_bin: Option<PathBuf>,

    /// Toolchain used to build the compiler and to assemble programs
    #[arg(long, default_value = "g++")]
    pub toolchain: String,

    /// When to rebuild the compiler
    #[arg(long, value_enum, default_value = "mtime")]
    pub freshness: FreshnessArg,

    /// Render the memory graph (needs Graphviz `dot`)
    #[arg(long)]
    pub graph: bool,

    /// Seconds each compile/assemble step may take
    #[arg(long, default_value = "10")]
    pub step_timeout: u64,

    /// Seconds the submitted program may run
    #[arg(long, default_value = "5")]
    pub exec_timeout: u64,

    /// Bytes of program output kept per stream
    #[arg(long, default_value = "65536")]
    pub max_output: usize,
}

impl PipelineArgs {
    /// Get a ready compiler (prebuilt or built from source) and wrap it in a
    /// pipeline. Fails if the compiler can't be built.
    pub async fn pipeline(&self) -> anyhow::Result<Pipeline> {
        match &self.compiler_bin {
            Some(path) => {
                let binary = CompilerBinary::prebuilt(path)?;
                Ok(Pipeline::new(self.pipeline_config(), binary)?)
            }
            None => Ok(asmscope_server::prepare_pipeline(
                self.build_config(),
                self.pipeline_config(),
            )
            .await?),
        }
    }

    pub fn build_config(&self) -> CompilerBuildConfig {
        CompilerBuildConfig {
            toolchain: self.toolchain.clone(),
            freshness: self.freshness.into(),
            ..CompilerBuildConfig::for_source_dir(&self.compiler_src, &self.work_dir)
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        let step = StageLimits {
            timeout: Duration::from_secs(self.step_timeout),
            max_output_bytes: self.max_output,
        };
        PipelineConfig {
            assembler: self.toolchain.clone(),
            render_graph: self.graph,
            front_end_limits: step,
            assemble_limits: step,
            render_limits: step,
            execute_limits: StageLimits {
                timeout: Duration::from_secs(self.exec_timeout),
                max_output_bytes: self.max_output,
            },
            ..PipelineConfig::new(&self.work_dir)
        }
    }
}
