use super::{address::MemoryAddress, builtin::BuiltinRunner, segment::Segment, val::MemoryValue};
use crate::{constant::F, errors::memory::MemoryError};

/// The whole VM memory, divided into dynamically allocated segments.
///
/// Segment 0 holds the program bytecode, segment 1 the execution stack;
/// further segments are appended in allocation order and never freed during a
/// run, so addresses cannot dangle.
#[derive(Debug, Default)]
pub struct Memory {
    pub(crate) segments: Vec<Segment>,
}

impl Memory {
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[must_use]
    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    /// Allocates a segment pre-sized to `data`, writing each element.
    ///
    /// Returns the index of the new segment.
    pub fn allocate_segment(&mut self, data: &[F]) -> Result<usize, MemoryError> {
        let mut segment = Segment::empty_with_length(data.len());
        for (offset, felt) in data.iter().enumerate() {
            segment.write(offset, MemoryValue::Int(*felt))?;
        }
        self.segments.push(segment);
        Ok(self.segments.len() - 1)
    }

    /// Allocates an empty segment and returns its index.
    pub fn allocate_empty_segment(&mut self) -> usize {
        self.segments.push(Segment::empty());
        self.segments.len() - 1
    }

    /// Allocates an empty segment driven by a builtin hook.
    pub fn allocate_empty_segment_with_builtin(
        &mut self,
        builtin: Box<dyn BuiltinRunner>,
    ) -> usize {
        self.segments.push(Segment::empty().with_builtin_runner(builtin));
        self.segments.len() - 1
    }

    /// Writes a value, failing on unallocated segments or cell rewrites.
    pub fn write(
        &mut self,
        segment_index: usize,
        offset: usize,
        value: MemoryValue,
    ) -> Result<(), MemoryError> {
        self.segment_mut(segment_index)?.write(offset, value)
    }

    pub fn write_to_address(
        &mut self,
        address: MemoryAddress,
        value: MemoryValue,
    ) -> Result<(), MemoryError> {
        self.write(address.segment_index, address.offset, value)
    }

    /// Reads a value; unknown cells are resolved by the segment's builtin.
    pub fn read(&mut self, segment_index: usize, offset: usize) -> Result<MemoryValue, MemoryError> {
        self.segment_mut(segment_index)?.read(offset)
    }

    pub fn read_from_address(&mut self, address: MemoryAddress) -> Result<MemoryValue, MemoryError> {
        self.read(address.segment_index, address.offset)
    }

    /// Returns the raw cell, which may be unknown; never invokes the builtin.
    pub fn peek(
        &mut self,
        segment_index: usize,
        offset: usize,
    ) -> Result<Option<MemoryValue>, MemoryError> {
        self.segment_mut(segment_index)?.peek(offset)
    }

    pub fn peek_from_address(
        &mut self,
        address: MemoryAddress,
    ) -> Result<Option<MemoryValue>, MemoryError> {
        self.peek(address.segment_index, address.offset)
    }

    fn segment_mut(&mut self, segment_index: usize) -> Result<&mut Segment, MemoryError> {
        let num_segments = self.segments.len();
        self.segments
            .get_mut(segment_index)
            .ok_or(MemoryError::UnallocatedSegment(segment_index, num_segments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: u64) -> MemoryValue {
        MemoryValue::Int(F::from(n))
    }

    #[test]
    fn test_allocate_segment_with_data() {
        let mut memory = Memory::default();
        let data = [F::from(10u64), F::from(20u64), F::from(30u64)];
        let index = memory.allocate_segment(&data).unwrap();

        assert_eq!(index, 0);
        assert_eq!(memory.segments()[0].len(), 3);
        for (offset, felt) in data.iter().enumerate() {
            assert_eq!(memory.read(0, offset), Ok(MemoryValue::Int(*felt)));
        }
    }

    #[test]
    fn test_allocate_empty_segments_in_order() {
        let mut memory = Memory::default();
        assert_eq!(memory.allocate_empty_segment(), 0);
        assert_eq!(memory.allocate_empty_segment(), 1);
        assert_eq!(memory.num_segments(), 2);
    }

    #[test]
    fn test_write_to_unallocated_segment() {
        let mut memory = Memory::default();
        memory.allocate_empty_segment();
        let err = memory.write(1, 0, int(1)).unwrap_err();
        assert_eq!(err, MemoryError::UnallocatedSegment(1, 1));
    }

    #[test]
    fn test_address_roundtrip() {
        let mut memory = Memory::default();
        memory.allocate_empty_segment();
        memory.allocate_empty_segment();

        let address = MemoryAddress::new(1, 7);
        let value = MemoryValue::Address(MemoryAddress::new(0, 3));
        memory.write_to_address(address, value).unwrap();
        assert_eq!(memory.read_from_address(address), Ok(value));
        assert_eq!(memory.peek_from_address(address), Ok(Some(value)));
    }

    #[test]
    fn test_builtin_segment_allocation() {
        use crate::memory::builtin::NoBuiltin;

        let mut memory = Memory::default();
        let index = memory.allocate_empty_segment_with_builtin(Box::new(NoBuiltin));
        assert_eq!(index, 0);
        // The default hook initializes unknown cells to zero on read.
        assert_eq!(memory.read(0, 3), Ok(int(0)));
    }

    #[test]
    fn test_peek_leaves_cell_unknown() {
        let mut memory = Memory::default();
        memory.allocate_empty_segment();
        assert_eq!(memory.peek(0, 2), Ok(None));
        // A later write still succeeds, unlike after an inferring read.
        assert!(memory.write(0, 2, int(5)).is_ok());
    }
}
