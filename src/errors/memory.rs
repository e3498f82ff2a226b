use thiserror::Error;

use super::math::MathError;
use crate::memory::val::MemoryValue;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum MemoryError {
    /// An operation targeted a segment that has not been allocated.
    #[error("Unallocated segment: cannot access segment {0}, only {1} segments are allocated")]
    UnallocatedSegment(usize, usize),

    /// Write-once violation: a known cell was written with a different value.
    #[error("Rewriting cell at offset {0}: old value: {1}, new value: {2}")]
    RewriteCell(usize, MemoryValue, MemoryValue),

    /// A read of an unknown cell that builtin inference did not resolve.
    #[error("Unknown value at offset {0}")]
    UnknownValue(usize),

    /// A field element was required but an address was found.
    #[error("Expected a field element, found {0}")]
    ExpectedInteger(MemoryValue),

    /// An address was required but a field element was found.
    #[error("Expected a memory address, found {0}")]
    ExpectedMemoryAddress(MemoryValue),

    /// A memory operation would exceed the capacity of a segment vector.
    #[error("Memory overflow: the requested address exceeds the machine's capacity")]
    VecCapacityExceeded,

    #[error(transparent)]
    Math(#[from] MathError),
}
