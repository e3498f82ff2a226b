use thiserror::Error;

use super::{memory::MemoryError, vm::VirtualMachineError};
use crate::memory::address::MemoryAddress;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum RunnerError {
    #[error(transparent)]
    Memory(#[from] MemoryError),
    #[error("Label '{0}' not found. Try compiling with proof mode")]
    MissingLabel(String),
    #[error("Unknown entrypoint: {0}")]
    UnknownEntrypoint(String),
    #[error("Cannot re-run using the same runner")]
    ReRun,
    #[error("Proof mode is off")]
    ProofModeDisabled,
    #[error("pc {pc} step {step}: max step limit exceeded ({max_steps})")]
    MaxStepsExceeded {
        pc: MemoryAddress,
        step: usize,
        max_steps: usize,
    },
    #[error("pc {pc} step {step}: {source}")]
    Step {
        pc: MemoryAddress,
        step: usize,
        source: VirtualMachineError,
    },
}
