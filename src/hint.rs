use crate::{core::VirtualMachine, errors::vm::VirtualMachineError};

/// Out-of-band computation run once per step, before the instruction at the
/// current pc is decoded.
///
/// The VM does not own any hint implementation; callers plug one in. Hints may
/// populate memory cells subject to the single-assignment rule, and a hint
/// error aborts the step.
pub trait HintRunner {
    fn run_hint(&mut self, vm: &mut VirtualMachine) -> Result<(), VirtualMachineError>;
}

/// Hint runner for programs without hints.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHint;

impl HintRunner for NoOpHint {
    fn run_hint(&mut self, _vm: &mut VirtualMachine) -> Result<(), VirtualMachineError> {
        Ok(())
    }
}
