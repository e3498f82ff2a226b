use std::fmt;

use ark_ff::Zero;

use super::val::MemoryValue;
use crate::{constant::F, errors::memory::MemoryError};

/// Per-segment hook validating writes and resolving reads of unwritten cells.
///
/// `check_write` runs after every store and may veto it (e.g. a range check).
/// `infer_value` runs when an unwritten cell is read and must either populate
/// `data[offset]` or fail.
pub trait BuiltinRunner: fmt::Debug {
    fn check_write(
        &mut self,
        data: &[Option<MemoryValue>],
        offset: usize,
        value: &MemoryValue,
    ) -> Result<(), MemoryError>;

    fn infer_value(
        &mut self,
        data: &mut [Option<MemoryValue>],
        offset: usize,
    ) -> Result<(), MemoryError>;
}

/// Default hook: approves every write and initializes unwritten cells to zero.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBuiltin;

impl BuiltinRunner for NoBuiltin {
    fn check_write(
        &mut self,
        _data: &[Option<MemoryValue>],
        _offset: usize,
        _value: &MemoryValue,
    ) -> Result<(), MemoryError> {
        Ok(())
    }

    fn infer_value(
        &mut self,
        data: &mut [Option<MemoryValue>],
        offset: usize,
    ) -> Result<(), MemoryError> {
        data[offset] = Some(MemoryValue::Int(F::zero()));
        Ok(())
    }
}
