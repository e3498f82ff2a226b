use super::{
    builtin::{BuiltinRunner, NoBuiltin},
    val::MemoryValue,
};
use crate::errors::memory::MemoryError;

/// Empty segments reserve this many cells up front.
const DEFAULT_SEGMENT_CAPACITY: usize = 100;

/// An append-only region of single-assignment cells.
///
/// The logical length is `last_index + 1`, the largest offset ever written or
/// touched; the physical buffer grows by doubling and never shrinks.
#[derive(Debug)]
pub struct Segment {
    pub(crate) data: Vec<Option<MemoryValue>>,
    last_index: Option<usize>,
    builtin: Box<dyn BuiltinRunner>,
}

impl Segment {
    #[must_use]
    pub fn empty() -> Self {
        Self::empty_with_capacity(DEFAULT_SEGMENT_CAPACITY)
    }

    #[must_use]
    pub fn empty_with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            last_index: None,
            builtin: Box::new(NoBuiltin),
        }
    }

    #[must_use]
    pub fn empty_with_length(length: usize) -> Self {
        Self {
            data: vec![None; length],
            last_index: length.checked_sub(1),
            builtin: Box::new(NoBuiltin),
        }
    }

    #[must_use]
    pub fn with_builtin_runner(mut self, builtin: Box<dyn BuiltinRunner>) -> Self {
        self.builtin = builtin;
        self
    }

    /// Effective length of the segment: the rightmost touched offset + 1.
    #[must_use]
    pub fn len(&self) -> usize {
        self.last_index.map_or(0, |last| last + 1)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Physical length of the underlying buffer.
    #[must_use]
    pub fn real_len(&self) -> usize {
        self.data.len()
    }

    /// Writes a value at `offset`, growing the segment if needed.
    ///
    /// Rewriting a known cell with a different value fails; rewriting with the
    /// same value is idempotent. The builtin sees every successful store.
    pub fn write(&mut self, offset: usize, value: MemoryValue) -> Result<(), MemoryError> {
        self.prepare(offset)?;

        if let Some(existing) = self.data[offset] {
            if existing != value {
                return Err(MemoryError::RewriteCell(offset, existing, value));
            }
        }
        self.data[offset] = Some(value);
        self.builtin.check_write(&self.data, offset, &value)
    }

    /// Reads the value at `offset`, asking the builtin to infer unknown cells.
    pub fn read(&mut self, offset: usize) -> Result<MemoryValue, MemoryError> {
        self.prepare(offset)?;

        if self.data[offset].is_none() {
            self.builtin.infer_value(&mut self.data, offset)?;
        }
        self.data[offset].ok_or(MemoryError::UnknownValue(offset))
    }

    /// Returns the raw cell at `offset` without invoking builtin inference.
    pub fn peek(&mut self, offset: usize) -> Result<Option<MemoryValue>, MemoryError> {
        self.prepare(offset)?;
        Ok(self.data[offset])
    }

    /// Grows the buffer to cover `offset` and extends the logical length.
    fn prepare(&mut self, offset: usize) -> Result<(), MemoryError> {
        if offset >= self.real_len() {
            let new_size = offset.checked_add(1).ok_or(MemoryError::VecCapacityExceeded)?;
            self.increase_segment_size(new_size)?;
        }
        if self.last_index.map_or(true, |last| offset > last) {
            self.last_index = Some(offset);
        }
        Ok(())
    }

    /// Grows the physical buffer to `max(new_size, 2 * real_len)`.
    fn increase_segment_size(&mut self, new_size: usize) -> Result<(), MemoryError> {
        debug_assert!(
            new_size >= self.real_len(),
            "cannot decrease segment size: {} -> {}",
            self.real_len(),
            new_size,
        );
        let target = new_size.max(self.real_len().saturating_mul(2));
        self.data
            .try_reserve(target.saturating_sub(self.data.capacity()))
            .map_err(|_| MemoryError::VecCapacityExceeded)?;
        self.data.resize(target, None);
        Ok(())
    }
}
