//! Merging stage outcome and collected artifacts into one result record.

use crate::artifacts::CollectedArtifacts;
use crate::model::PipelineResult;
use crate::pipeline::RunOutcome;

/// Pure merge into [`PipelineResult`]; makes no decisions of its own.
pub struct ResultAssembler;

impl ResultAssembler {
    /// Stage log entries come first, artifact notes after.
    pub fn assemble(outcome: RunOutcome, collected: CollectedArtifacts) -> PipelineResult {
        let mut diagnostic_log = outcome.log;
        diagnostic_log.extend(collected.log);

        PipelineResult {
            succeeded: outcome.failure.is_none(),
            program_output: outcome.program_output,
            diagnostic_log,
            assembly_text: outcome.assembly,
            line_instruction_map: collected.line_map,
            stack_frames: collected.stack_frames,
            image_b64: outcome.image_b64,
        }
    }
}
