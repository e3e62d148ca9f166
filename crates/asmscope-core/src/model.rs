//! Data records produced by a pipeline run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Source line number (1-based) -> instruction lines, in emission order.
///
/// Serialized as a JSON object keyed by the decimal line number.
pub type LineInstructionMap = BTreeMap<u32, Vec<String>>;

/// One variable inside a stack snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackVariable {
    pub name: String,
    pub value: String,

    /// Frame-pointer-relative offset in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub declared_type: Option<String>,
}

/// Point-in-time snapshot of one logical call frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    pub label: String,

    #[serde(rename = "vars", default)]
    pub variables: Vec<StackVariable>,

    #[serde(rename = "sp", default, skip_serializing_if = "Option::is_none")]
    pub stack_pointer: Option<i64>,

    /// `0` is used by the front-end compiler for the global frame.
    #[serde(rename = "line", default, skip_serializing_if = "Option::is_none")]
    pub source_line: Option<u32>,

    #[serde(rename = "idx", default, skip_serializing_if = "Option::is_none")]
    pub snapshot_index: Option<u32>,

    #[serde(rename = "func", default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
}

/// Everything one pipeline run produced.
///
/// Has the same shape whether or not the run succeeded, so callers can
/// render partial results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub succeeded: bool,
    pub program_output: String,
    pub diagnostic_log: Vec<String>,
    pub assembly_text: Option<String>,
    pub line_instruction_map: Option<LineInstructionMap>,
    pub stack_frames: Vec<StackFrame>,

    /// Rendered debug graph, base64-encoded PNG.
    pub image_b64: Option<String>,
}

impl PipelineResult {
    /// Diagnostic log joined with newlines.
    pub fn joined_log(&self) -> String {
        self.diagnostic_log.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_matches_compiler_json() {
        let json = r#"{"label":"decl x","line":3,"idx":0,"vars":[{"name":"x","value":"5","offset":-8,"type":"int"}]}"#;
        let frame: StackFrame = serde_json::from_str(json).unwrap();

        assert_eq!(frame.label, "decl x");
        assert_eq!(frame.source_line, Some(3));
        assert_eq!(frame.snapshot_index, Some(0));
        assert_eq!(frame.stack_pointer, None);
        assert_eq!(frame.variables.len(), 1);
        assert_eq!(frame.variables[0].offset, Some(-8));
        assert_eq!(frame.variables[0].declared_type.as_deref(), Some("int"));
    }

    #[test]
    fn test_line_map_keys_are_numbers_as_strings() {
        let mut map = LineInstructionMap::new();
        map.insert(7, vec!["MOV".to_string()]);
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"7":["MOV"]}"#);

        let parsed: LineInstructionMap =
            serde_json::from_str(r#"{"12":[" pushq %rbp"]}"#).unwrap();
        assert_eq!(parsed[&12], vec![" pushq %rbp".to_string()]);
    }
}
