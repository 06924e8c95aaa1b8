//! Build-stage partition of an instruction stream

use super::parser::Instruction;
use crate::error::{PinError, Result};

/// An instruction stream split at every base-image declaration.
///
/// Stage `i` starts at the `i`-th `FROM` and runs up to (not including) the
/// next one. Instructions before the first `FROM` form the prelude.
#[derive(Debug, Clone)]
pub struct Layers<'a> {
    instructions: &'a [Instruction],
    boundaries: Vec<usize>,
}

impl<'a> Layers<'a> {
    /// Compute stage boundaries from a parsed instruction list
    pub fn partition(instructions: &'a [Instruction]) -> Self {
        let boundaries = instructions
            .iter()
            .enumerate()
            .filter(|(_, i)| i.is_from())
            .map(|(idx, _)| idx)
            .collect();
        Layers {
            instructions,
            boundaries,
        }
    }

    /// Indices into the instruction list where each stage begins
    pub fn boundaries(&self) -> &[usize] {
        &self.boundaries
    }

    /// Number of build stages (base-image declarations)
    pub fn stage_count(&self) -> usize {
        self.boundaries.len()
    }

    /// Instructions before the first base-image declaration
    pub fn prelude(&self) -> &'a [Instruction] {
        let end = self
            .boundaries
            .first()
            .copied()
            .unwrap_or(self.instructions.len());
        &self.instructions[..end]
    }

    /// Instructions of stage `index` (0-based)
    pub fn stage(&self, index: usize) -> Result<&'a [Instruction]> {
        let start = *self.boundaries.get(index).ok_or_else(|| {
            PinError::ParseInconsistency(format!(
                "layer {} requested but the Dockerfile has {} stage(s)",
                index,
                self.boundaries.len()
            ))
        })?;
        let end = self
            .boundaries
            .get(index + 1)
            .copied()
            .unwrap_or(self.instructions.len());
        Ok(&self.instructions[start..end])
    }
}
