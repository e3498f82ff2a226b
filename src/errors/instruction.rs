use thiserror::Error;

use crate::constant::F;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum InstructionError {
    /// The instruction word must fit in 63 bits.
    #[error("Instruction value exceeds 63 bits: {0}")]
    ValueExceeds63Bits(F),
    #[error("Invalid op1 source bits in flags {0:#06x}")]
    InvalidOp1Source(u16),
    #[error("Invalid res logic bits in flags {0:#06x}")]
    InvalidResLogic(u16),
    #[error("Invalid pc update bits in flags {0:#06x}")]
    InvalidPcUpdate(u16),
    #[error("Invalid ap update bits in flags {0:#06x}")]
    InvalidApUpdate(u16),
    #[error("Invalid opcode bits in flags {0:#06x}")]
    InvalidOpcode(u16),
    #[error("Malformed call instruction, flags {0:#06x}")]
    MalformedCallInstruction(u16),
    #[error("Malformed ret instruction, flags {0:#06x}")]
    MalformedRetInstruction(u16),
}
