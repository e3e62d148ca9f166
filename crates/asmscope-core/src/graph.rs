//! Debug-graph extraction, repair and rendering.
//!
//! In `--debug` mode the front-end compiler prints a Graphviz description of
//! memory state to stdout, possibly preceded by other chatter and sometimes
//! missing its final `}`. The repaired text is rendered to PNG by an external
//! renderer and returned base64-encoded.

use std::fs;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tokio::process::Command;

use crate::config::StageLimits;
use crate::error::StageError;
use crate::process::{Stage, run_bounded};
use crate::workspace::Workspace;

/// Token the graph description starts with.
pub const GRAPH_HEADER: &str = "digraph MemoryFlow";

/// Closing delimiter of a graph description.
pub const GRAPH_CLOSE: &str = "}";

/// Extract the graph description from compiler output and repair it.
///
/// Returns `None` when the header is absent. Text before the header is
/// dropped and surrounding whitespace trimmed; if the result doesn't end in
/// `}`, exactly one line holding `}` is appended.
pub fn repair_graph(stdout: &str) -> Option<String> {
    let start = stdout.find(GRAPH_HEADER)?;
    let mut graph = stdout[start..].trim().to_string();
    if !graph.ends_with(GRAPH_CLOSE) {
        graph.push('\n');
        graph.push_str(GRAPH_CLOSE);
    }
    Some(graph)
}

/// Renders graph descriptions for one pipeline.
#[derive(Debug, Clone)]
pub struct GraphRenderer {
    program: String,
    limits: StageLimits,
}

impl GraphRenderer {
    pub fn new(program: impl Into<String>, limits: StageLimits) -> Self {
        Self {
            program: program.into(),
            limits,
        }
    }

    /// Whether the renderer can be found on `PATH`.
    pub fn is_available(&self) -> bool {
        which::which(&self.program).is_ok()
    }

    /// Write `graph` to the workspace and render it, returning base64 PNG.
    pub async fn render(&self, workspace: &Workspace, graph: &str) -> Result<String, RenderError> {
        fs::write(&workspace.graph_path, graph).map_err(|source| StageError::Io {
            stage: Stage::Render,
            path: workspace.graph_path.clone(),
            source,
        })?;

        let mut cmd = Command::new(&self.program);
        cmd.arg("-Tpng")
            .arg(&workspace.graph_path)
            .arg("-o")
            .arg(&workspace.image_path);

        let output = run_bounded(Stage::Render, &mut cmd, &self.limits).await?;
        if !output.status.success() {
            return Err(RenderError::Failed {
                status: output.status_text(),
                stderr: output.stderr,
            });
        }

        let png = fs::read(&workspace.image_path).map_err(|source| StageError::Io {
            stage: Stage::Render,
            path: workspace.image_path.clone(),
            source,
        })?;
        Ok(STANDARD.encode(png))
    }
}

/// Why rendering produced no image. Never fatal to a request.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Stage(#[from] StageError),

    #[error("graph renderer failed ({status}): {stderr}")]
    Failed { status: String, stderr: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repair_appends_one_closing_line() {
        let raw = "type check ok\ndigraph MemoryFlow {\n  step0 [label=\"Start\"];\n";
        let repaired = repair_graph(raw).unwrap();

        assert!(repaired.starts_with(GRAPH_HEADER));
        assert!(repaired.ends_with("\n}"));
        assert_eq!(repaired.matches('}').count(), 1);
        assert_eq!(repaired.lines().last(), Some("}"));
    }

    #[test]
    fn test_complete_graph_untouched() {
        let raw = "digraph MemoryFlow {\n  a -> b;\n}\n\n";
        assert_eq!(repair_graph(raw).unwrap(), "digraph MemoryFlow {\n  a -> b;\n}");
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(repair_graph("digraph Other {}"), None);
        assert_eq!(repair_graph(""), None);
    }
}
