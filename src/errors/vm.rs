use thiserror::Error;

use super::{instruction::InstructionError, math::MathError, memory::MemoryError};
use crate::memory::address::MemoryAddress;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum VirtualMachineError {
    #[error(transparent)]
    Memory(#[from] MemoryError),
    #[error(transparent)]
    Math(#[from] MathError),
    #[error("Decoding instruction: {0}")]
    Instruction(#[from] InstructionError),
    /// Operand inference needs at least two of dst, op0 and op1 to be known.
    #[error("Too many unknown operands")]
    TooManyUnknownOperands,
    /// Operand inference requires the dst cell to be known.
    #[error("Cannot infer operand: dst cell {0} is unknown")]
    UnknownDst(MemoryAddress),
    /// An unconstrained res reached a consumer that needs a value.
    #[error("Instruction leaves res unconstrained but a value is required")]
    UnconstrainedRes,
}
