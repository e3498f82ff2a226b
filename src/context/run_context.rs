use std::fmt;

use crate::{
    constant::EXECUTION_SEGMENT,
    memory::address::MemoryAddress,
    trace::RelocatedTraceEntry,
};

/// The register state of the VM.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunContext {
    /// Address of the current instruction; stays inside the program segment
    /// during normal execution.
    pub pc: MemoryAddress,
    /// Allocation pointer into the execution segment.
    pub ap: usize,
    /// Frame pointer into the execution segment; constant within one function
    /// invocation.
    pub fp: usize,
}

impl RunContext {
    #[must_use]
    pub const fn new(pc: MemoryAddress, ap: usize, fp: usize) -> Self {
        Self { pc, ap, fp }
    }

    #[must_use]
    pub const fn address_ap(&self) -> MemoryAddress {
        MemoryAddress::new(EXECUTION_SEGMENT, self.ap)
    }

    #[must_use]
    pub const fn address_fp(&self) -> MemoryAddress {
        MemoryAddress::new(EXECUTION_SEGMENT, self.fp)
    }

    #[must_use]
    pub const fn address_pc(&self) -> MemoryAddress {
        self.pc
    }

    /// Maps the registers into the flat 1-based address space: the program
    /// segment starts at address 1, the execution segment right after it.
    #[must_use]
    pub const fn relocate(&self, execution_segment_offset: usize) -> RelocatedTraceEntry {
        RelocatedTraceEntry {
            ap: (self.ap + execution_segment_offset) as u64,
            fp: (self.fp + execution_segment_offset) as u64,
            pc: (self.pc.offset + 1) as u64,
        }
    }
}

impl fmt::Display for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Context {{pc: {}, ap: {}, fp: {}}}",
            self.pc, self.ap, self.fp
        )
    }
}
