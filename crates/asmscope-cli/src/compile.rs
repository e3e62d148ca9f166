//! Compile command implementation for asmscope CLI.
//!
//! Runs a single source file through the pipeline and prints the result.

use std::fs;
use std::path::Path;
use std::time::Instant;

use asmscope_core::PipelineResult;

use crate::args::PipelineArgs;
use crate::colors;

/// Compile, run and correlate one source file.
pub async fn execute(source_path: &str, args: &PipelineArgs, json: bool) -> anyhow::Result<()> {
    let path = Path::new(source_path);
    if !path.exists() {
        anyhow::bail!("Source file not found: {}", source_path);
    }
    let source = fs::read_to_string(path)?;

    let pipeline = args.pipeline().await?;

    let start = Instant::now();
    let result = pipeline.run(&source).await;
    let elapsed = start.elapsed();

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_report(&source, &result);
        println!(
            "\n{}Finished in {:.2}s{}",
            colors::DIM,
            elapsed.as_secs_f64(),
            colors::RESET
        );
    }

    if !result.succeeded {
        anyhow::bail!("{} did not compile and run", source_path);
    }
    Ok(())
}

fn print_report(source: &str, result: &PipelineResult) {
    let (color, label) = if result.succeeded {
        (colors::GREEN, "success")
    } else {
        (colors::RED, "failed")
    };
    println!("{}{}{}{}", colors::BOLD, color, label, colors::RESET);

    if !result.diagnostic_log.is_empty() {
        println!("\n{}Logs:{}", colors::BOLD, colors::RESET);
        println!("{}", "─".repeat(50));
        for entry in &result.diagnostic_log {
            println!("{}{}{}", colors::YELLOW, entry, colors::RESET);
        }
    }

    if let Some(map) = &result.line_instruction_map {
        println!("\n{}Source → assembly:{}", colors::BOLD, colors::RESET);
        println!("{}", "─".repeat(50));
        let lines: Vec<&str> = source.lines().collect();
        for (line, instructions) in map {
            let text = lines
                .get((*line as usize).saturating_sub(1))
                .copied()
                .unwrap_or("");
            println!("{}{:>4} │{} {}", colors::CYAN, line, colors::RESET, text.trim());
            for instruction in instructions {
                println!("     {}│ {}{}", colors::DIM, instruction, colors::RESET);
            }
        }
    }

    if !result.stack_frames.is_empty() {
        println!("\n{}Stack snapshots:{}", colors::BOLD, colors::RESET);
        println!("{}", "─".repeat(50));
        for frame in &result.stack_frames {
            let line = frame
                .source_line
                .map(|l| format!(" (line {})", l))
                .unwrap_or_default();
            println!("{}{}{}{}", colors::CYAN, frame.label, line, colors::RESET);
            for var in &frame.variables {
                let offset = var.offset.map(|o| format!(" @{}", o)).unwrap_or_default();
                println!("    {} = {}{}", var.name, var.value, offset);
            }
        }
    }

    if result.succeeded {
        println!("\n{}Output:{}", colors::BOLD, colors::RESET);
        println!("{}", "─".repeat(50));
        print!("{}", result.program_output);
    }
}
