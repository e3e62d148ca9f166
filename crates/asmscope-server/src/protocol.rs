//! Request and response bodies for the compile endpoint.

use asmscope_core::{LineInstructionMap, PipelineResult, StackFrame};
use serde::{Deserialize, Serialize};

/// Body of `POST /compile`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileRequest {
    /// Raw source text.
    pub code: String,
}

/// Response to `POST /compile`.
///
/// Sent with status 200 whether or not the program compiled; `success`
/// tells the two apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileResponse {
    pub success: bool,

    /// What the program printed (stdout then stderr).
    pub output: String,

    /// Diagnostic log, newline-joined.
    pub logs: String,

    /// Base64 PNG of the memory graph.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_b64: Option<String>,

    /// Generated assembly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asm: Option<String>,

    /// Source line -> instructions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asm_by_line: Option<LineInstructionMap>,

    /// Stack snapshots in execution order.
    #[serde(default)]
    pub stack: Vec<StackFrame>,
}

impl From<PipelineResult> for CompileResponse {
    fn from(result: PipelineResult) -> Self {
        Self {
            success: result.succeeded,
            logs: result.joined_log(),
            output: result.program_output,
            image_b64: result.image_b64,
            asm: result.assembly_text,
            asm_by_line: result.line_instruction_map,
            stack: result.stack_frames,
        }
    }
}
