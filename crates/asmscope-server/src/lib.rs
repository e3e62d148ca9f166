//! asmscope HTTP server.
//!
//! Exposes the compile pipeline over HTTP for the interactive front end.
//!
//! # Architecture
//!
//! - **Startup**: builds (or reuses) the front-end compiler once; a build
//!   failure stops the process before any request is accepted
//! - **Protocol**: request/response bodies
//! - **Routes**: HTTP handlers

pub mod error;
pub mod protocol;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use asmscope_core::{CompilerBuildConfig, CompilerCache, Pipeline, PipelineConfig};

pub use error::{ServerError, ServerResult};
pub use protocol::{CompileRequest, CompileResponse};
pub use routes::{AppState, create_router};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Make the compiler ready and build the pipeline around it.
///
/// Runs before any request traffic. Fails with [`ServerError::Build`] if
/// the compiler can't be built.
pub async fn prepare_pipeline(
    build: CompilerBuildConfig,
    config: PipelineConfig,
) -> ServerResult<Pipeline> {
    let (binary, status) = CompilerCache::new(build).ensure_ready().await?;
    tracing::info!("Compiler ready ({:?}): {}", status, binary.path().display());
    Ok(Pipeline::new(config, binary)?)
}

/// Serve `pipeline` until Ctrl+C.
pub async fn serve(pipeline: Pipeline, config: ServerConfig) -> ServerResult<()> {
    let state = Arc::new(AppState { pipeline });
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|_| ServerError::InvalidAddress(format!("{}:{}", config.host, config.port)))?;

    tracing::info!("Starting asmscope server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received shutdown signal");
            let _ = shutdown_tx.send(());
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
