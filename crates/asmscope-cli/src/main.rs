//! asmscope CLI - compile, run and correlate submitted programs.

mod args;
mod colors;
mod compile;
mod serve;

use clap::{Parser, Subcommand};

use args::PipelineArgs;

#[derive(Parser)]
#[command(name = "asmscope")]
#[command(about = "Compile programs and correlate source lines with generated assembly")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the compiler and start the HTTP server
    Serve {
        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Host address to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },

    /// Run one source file through the pipeline
    Compile {
        /// Path to the source file
        source: String,

        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Serve {
            pipeline,
            host,
            port,
        } => serve::execute(&pipeline, host, port).await?,

        Commands::Compile {
            source,
            pipeline,
            json,
        } => compile::execute(&source, &pipeline, json).await?,
    }

    Ok(())
}
