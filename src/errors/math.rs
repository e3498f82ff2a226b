use thiserror::Error;

use crate::{constant::F, memory::address::MemoryAddress};

#[derive(Debug, Error, Eq, PartialEq)]
pub enum MathError {
    #[error("Operation failed: {0} + {1}, maximum offset value exceeded")]
    MemoryAddressAddUsizeOffsetExceeded(MemoryAddress, usize),
    #[error("Operation failed: {0} + {1}, offset does not fit in the address space")]
    MemoryAddressAddFeltOffsetExceeded(MemoryAddress, F),
    #[error("Offset overflow: {0} + {1}")]
    RegisterOffsetOverflow(usize, i16),
    #[error("Cannot add two memory addresses: {0} + {1}")]
    AddMemoryAddresses(MemoryAddress, MemoryAddress),
    #[error("Cannot subtract addresses of different segments: {0} - {1}")]
    SubMemoryAddressesDifferentSegments(MemoryAddress, MemoryAddress),
    #[error("Cannot subtract a memory address from a field element: {0} - {1}")]
    SubAddressFromFelt(F, MemoryAddress),
    #[error("Cannot multiply with a memory address: {0}")]
    MulWithMemoryAddress(MemoryAddress),
    #[error("Cannot divide with a memory address: {0}")]
    DivWithMemoryAddress(MemoryAddress),
    #[error("Updating ap overflowed: {0} + {1}")]
    UpdateApOverflow(usize, u64),
    #[error("Field element does not fit in u64: {0}")]
    FeltDoesNotFitInU64(F),
    #[error("Division by zero")]
    DivisionByZero,
}
