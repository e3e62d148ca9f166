//! Collection of optional structured artifacts after a pipeline run.
//!
//! Nothing in here fails: a missing or unreadable artifact degrades the
//! corresponding field to empty/absent and leaves a note in the log.
//!
//! The line -> instruction map has two sources, tried in order:
//!
//! ```text
//! StructuredLineMap  (<id>_stack.json.asm.json written by the compiler)
//!        │ absent / unreadable
//!        ▼
//! MarkerScan         (debug markers embedded in the assembly text)
//! ```

mod markers;

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

pub use markers::{LineKind, MarkerScanner};

use crate::model::{LineInstructionMap, StackFrame};
use crate::workspace::Workspace;

/// Inputs available to a line-map strategy.
#[derive(Debug, Clone, Copy)]
pub struct LineMapInputs<'a> {
    /// Where the compiler may have written a structured line map.
    pub artifact_path: &'a Path,
    /// Raw assembly text, if the front-end compiler produced any.
    pub assembly: Option<&'a str>,
}

/// One way of obtaining a line -> instruction map.
pub trait LineMapStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Produce a map, or `None` if this strategy has nothing to offer.
    ///
    /// Problems worth surfacing to the user go into `log`.
    fn line_map(
        &self,
        inputs: &LineMapInputs<'_>,
        log: &mut Vec<String>,
    ) -> Option<LineInstructionMap>;
}

/// Loads the authoritative map written by the front-end compiler.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredLineMap;

impl LineMapStrategy for StructuredLineMap {
    fn name(&self) -> &'static str {
        "structured"
    }

    fn line_map(
        &self,
        inputs: &LineMapInputs<'_>,
        log: &mut Vec<String>,
    ) -> Option<LineInstructionMap> {
        let text = read_optional(inputs.artifact_path, "line map", log)?;
        match serde_json::from_str(&text) {
            Ok(map) => Some(map),
            Err(e) => {
                tracing::warn!("Unreadable line map {}: {}", inputs.artifact_path.display(), e);
                log.push(format!("could not parse line map artifact: {}", e));
                None
            }
        }
    }
}

/// Derives the map from markers in the assembly text.
#[derive(Debug, Clone, Default)]
pub struct MarkerScan {
    scanner: MarkerScanner,
}

impl MarkerScan {
    pub fn new(scanner: MarkerScanner) -> Self {
        Self { scanner }
    }
}

impl LineMapStrategy for MarkerScan {
    fn name(&self) -> &'static str {
        "marker-scan"
    }

    fn line_map(
        &self,
        inputs: &LineMapInputs<'_>,
        _log: &mut Vec<String>,
    ) -> Option<LineInstructionMap> {
        inputs.assembly.map(|asm| self.scanner.scan(asm))
    }
}

/// Artifacts gathered for one workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectedArtifacts {
    pub stack_frames: Vec<StackFrame>,
    pub line_map: Option<LineInstructionMap>,
    /// Diagnostic notes about degraded artifacts.
    pub log: Vec<String>,
}

/// Loads stack snapshots and loads or derives the line map.
pub struct ArtifactCollector {
    strategies: Vec<Box<dyn LineMapStrategy>>,
}

impl Default for ArtifactCollector {
    fn default() -> Self {
        Self::with_strategies(vec![
            Box::new(StructuredLineMap),
            Box::new(MarkerScan::default()),
        ])
    }
}

impl std::fmt::Debug for ArtifactCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.strategies.iter().map(|s| s.name()).collect();
        f.debug_struct("ArtifactCollector")
            .field("strategies", &names)
            .finish()
    }
}

impl ArtifactCollector {
    /// Collector trying `strategies` in order for the line map.
    pub fn with_strategies(strategies: Vec<Box<dyn LineMapStrategy>>) -> Self {
        Self { strategies }
    }

    /// Gather every artifact available for `workspace`.
    pub fn collect(&self, workspace: &Workspace, assembly: Option<&str>) -> CollectedArtifacts {
        let mut log = Vec::new();
        let stack_frames = load_stack_frames(&workspace.stack_artifact_path, &mut log);
        let line_map = self.load_or_derive(
            &LineMapInputs {
                artifact_path: &workspace.line_map_artifact_path,
                assembly,
            },
            &mut log,
        );

        CollectedArtifacts {
            stack_frames,
            line_map,
            log,
        }
    }

    /// First map any strategy produces.
    pub fn load_or_derive(
        &self,
        inputs: &LineMapInputs<'_>,
        log: &mut Vec<String>,
    ) -> Option<LineInstructionMap> {
        self.strategies.iter().find_map(|strategy| {
            let map = strategy.line_map(inputs, log)?;
            tracing::debug!(
                "Line map from {} strategy ({} lines)",
                strategy.name(),
                map.len()
            );
            Some(map)
        })
    }
}

/// Parse the stack snapshot file, if there is one.
pub fn load_stack_frames(path: &Path, log: &mut Vec<String>) -> Vec<StackFrame> {
    let Some(text) = read_optional(path, "stack snapshot", log) else {
        return Vec::new();
    };
    match serde_json::from_str(&text) {
        Ok(frames) => frames,
        Err(e) => {
            tracing::warn!("Unreadable stack snapshot {}: {}", path.display(), e);
            log.push(format!("could not parse stack snapshot artifact: {}", e));
            Vec::new()
        }
    }
}

/// Read a file whose absence is normal.
fn read_optional(path: &Path, what: &str, log: &mut Vec<String>) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => {
            log.push(format!("could not read {} artifact: {}", what, e));
            None
        }
    }
}
