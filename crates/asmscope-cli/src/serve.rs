//! Serve command implementation for asmscope CLI.
//!
//! Makes the compiler ready, then starts the HTTP server.

use asmscope_server::ServerConfig;

use crate::args::PipelineArgs;
use crate::colors;

/// Start the compile server.
pub async fn execute(args: &PipelineArgs, host: String, port: u16) -> anyhow::Result<()> {
    println!(
        "\n{}asmscope Server{} - Compile & Correlate",
        colors::BOLD,
        colors::RESET
    );
    println!("{}", "─".repeat(50));

    match &args.compiler_bin {
        Some(bin) => println!("{}  ◆ Compiler:{} {}", colors::CYAN, colors::RESET, bin.display()),
        None => println!(
            "{}  ◆ Compiler sources:{} {}",
            colors::CYAN,
            colors::RESET,
            args.compiler_src.display()
        ),
    }

    // A compiler that can't be built means nothing can be served.
    let pipeline = args.pipeline().await?;

    let config = ServerConfig { host, port };

    println!(
        "{}  ◆ Server:{} http://{}:{}",
        colors::CYAN,
        colors::RESET,
        config.host,
        config.port
    );
    println!(
        "{}  ◆ Workspaces:{} {}",
        colors::CYAN,
        colors::RESET,
        pipeline.config().work_dir.display()
    );
    println!("{}", "─".repeat(50));
    println!("{}Press Ctrl+C to stop{}", colors::GREEN, colors::RESET);
    println!();

    asmscope_server::serve(pipeline, config).await?;

    Ok(())
}
