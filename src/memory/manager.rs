use super::{mem::Memory, segment::Segment, val::MemoryValue};
use crate::{constant::F, errors::memory::MemoryError};

/// A high level manager for the memory.
#[derive(Debug, Default)]
pub struct MemoryManager {
    pub memory: Memory,
}

impl MemoryManager {
    #[must_use]
    pub fn num_segments(&self) -> usize {
        self.memory.num_segments()
    }

    /// Flat base address of every segment in the relocated, 1-based space.
    fn segment_offsets(&self) -> Vec<usize> {
        let mut offsets = Vec::with_capacity(self.memory.segments.len());
        let mut base = 1;
        for segment in &self.memory.segments {
            offsets.push(base);
            base += segment.len();
        }
        offsets
    }

    /// Relocates all segments into a single linear address space.
    ///
    /// Cell `(s, o)` lands at flat index `base(s) + o`, where bases are the
    /// cumulative logical segment lengths starting at 1. Address values are
    /// rewritten to the field element of their own flat index; unknown cells
    /// stay `None`. Index 0 is never populated.
    pub fn relocate_memory(&self) -> Result<Vec<Option<F>>, MemoryError> {
        let offsets = self.segment_offsets();
        let total: usize = 1 + self
            .memory
            .segments
            .iter()
            .map(Segment::len)
            .sum::<usize>();

        let mut relocated = vec![None; total];
        for (segment_index, segment) in self.memory.segments.iter().enumerate() {
            for (offset, cell) in segment.data.iter().take(segment.len()).enumerate() {
                let Some(value) = cell else { continue };
                relocated[offsets[segment_index] + offset] = Some(match value {
                    MemoryValue::Int(felt) => *felt,
                    MemoryValue::Address(address) => {
                        let base = offsets.get(address.segment_index).ok_or(
                            MemoryError::UnallocatedSegment(address.segment_index, offsets.len()),
                        )?;
                        F::from((base + address.offset) as u64)
                    }
                });
            }
        }
        Ok(relocated)
    }
}
