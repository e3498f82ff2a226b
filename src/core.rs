use std::collections::HashMap;

use ark_ff::Zero;

use crate::{
    bytecode::instruction::{ApUpdate, Instruction, Op1Source, Opcode, PcUpdate, Register, ResLogic},
    constant::{EXECUTION_SEGMENT, F, PROGRAM_SEGMENT},
    context::run_context::RunContext,
    errors::{math::MathError, vm::VirtualMachineError},
    hint::HintRunner,
    memory::{address::MemoryAddress, manager::MemoryManager, val::MemoryValue},
    trace::RelocatedTraceEntry,
    utils::{felt_to_u64, safe_offset},
};

#[derive(Debug, Default, Clone, Copy)]
pub struct VirtualMachineConfig {
    /// When on, the VM records a register snapshot before every step.
    pub proof_mode: bool,
}

pub struct VirtualMachine {
    pub context: RunContext,
    pub memory_manager: MemoryManager,
    pub step: usize,
    config: VirtualMachineConfig,
    trace: Option<Vec<RunContext>>,
    /// Decoded instructions, keyed by pc offset.
    instructions: HashMap<usize, Instruction>,
}

impl VirtualMachine {
    #[must_use]
    pub fn new(
        context: RunContext,
        memory_manager: MemoryManager,
        config: VirtualMachineConfig,
    ) -> Self {
        Self {
            context,
            memory_manager,
            step: 0,
            config,
            trace: config.proof_mode.then(Vec::new),
            instructions: HashMap::new(),
        }
    }

    /// Runs a single step: hint, decode, then the instruction itself.
    ///
    /// In proof mode the pre-step context is appended to the trace before any
    /// state changes.
    pub fn run_step(&mut self, hint_runner: &mut dyn HintRunner) -> Result<(), VirtualMachineError> {
        hint_runner.run_hint(self)?;

        let instruction = match self.instructions.get(&self.context.pc.offset) {
            Some(instruction) => *instruction,
            None => {
                let word: F = self
                    .memory_manager
                    .memory
                    .read_from_address(self.context.pc)?
                    .try_into()?;
                let instruction = Instruction::decode(&word)?;
                self.instructions.insert(self.context.pc.offset, instruction);
                instruction
            }
        };

        if let Some(trace) = self.trace.as_mut() {
            trace.push(self.context);
        }

        self.run_instruction(&instruction)?;
        self.step += 1;
        Ok(())
    }

    /// Executes one decoded instruction and commits the register updates.
    ///
    /// The order is fixed and observable through single-assignment memory:
    /// operand addresses, inference, res, opcode assertions, then pc/ap/fp
    /// computed against the pre-step context and committed together.
    pub fn run_instruction(
        &mut self,
        instruction: &Instruction,
    ) -> Result<(), VirtualMachineError> {
        let dst_addr = self.dst_address(instruction)?;
        let op0_addr = self.op0_address(instruction)?;
        let op1_addr = self.op1_address(instruction, op0_addr)?;

        let mut res = self.infer_operand(instruction, dst_addr, op0_addr, op1_addr)?;
        if res.is_none() {
            res = self.compute_res(instruction, op0_addr, op1_addr)?;
        }

        self.opcode_assertions(instruction, dst_addr, op0_addr, res.as_ref())?;

        let next_pc = self.update_pc(instruction, dst_addr, op1_addr, res.as_ref())?;
        let next_ap = self.update_ap(instruction, res.as_ref())?;
        let next_fp = self.update_fp(instruction, dst_addr)?;

        self.context.pc = next_pc;
        self.context.ap = next_ap;
        self.context.fp = next_fp;
        Ok(())
    }

    fn dst_address(&self, instruction: &Instruction) -> Result<MemoryAddress, VirtualMachineError> {
        let register = match instruction.dst_register {
            Register::Ap => self.context.ap,
            Register::Fp => self.context.fp,
        };
        let offset = safe_offset(register, instruction.off_dst)
            .ok_or(MathError::RegisterOffsetOverflow(register, instruction.off_dst))?;
        Ok(MemoryAddress::new(EXECUTION_SEGMENT, offset))
    }

    fn op0_address(&self, instruction: &Instruction) -> Result<MemoryAddress, VirtualMachineError> {
        let register = match instruction.op0_register {
            Register::Ap => self.context.ap,
            Register::Fp => self.context.fp,
        };
        let offset = safe_offset(register, instruction.off_op0)
            .ok_or(MathError::RegisterOffsetOverflow(register, instruction.off_op0))?;
        Ok(MemoryAddress::new(EXECUTION_SEGMENT, offset))
    }

    fn op1_address(
        &mut self,
        instruction: &Instruction,
        op0_addr: MemoryAddress,
    ) -> Result<MemoryAddress, VirtualMachineError> {
        let base = match instruction.op1_source {
            // op0 holds the base address and must be one.
            Op1Source::Op0 => self
                .memory_manager
                .memory
                .read_from_address(op0_addr)?
                .try_into()?,
            Op1Source::Imm => self.context.address_pc(),
            Op1Source::FpPlusOffOp1 => self.context.address_fp(),
            Op1Source::ApPlusOffOp1 => self.context.address_ap(),
        };
        let offset = safe_offset(base.offset, instruction.off_op1)
            .ok_or(MathError::RegisterOffsetOverflow(base.offset, instruction.off_op1))?;
        Ok(MemoryAddress::new(base.segment_index, offset))
    }

    /// Deduces the single unknown operand of an `AssertEq` with Add or Mul res.
    ///
    /// A source-level `x = y - z` compiles to `y = x + z`, so dst is known and
    /// exactly one of op0/op1 may be missing. The missing operand is computed
    /// from dst and written back; dst doubles as res.
    fn infer_operand(
        &mut self,
        instruction: &Instruction,
        dst_addr: MemoryAddress,
        op0_addr: MemoryAddress,
        op1_addr: MemoryAddress,
    ) -> Result<Option<MemoryValue>, VirtualMachineError> {
        if instruction.opcode != Opcode::AssertEq
            || !matches!(instruction.res, ResLogic::AddOperands | ResLogic::MulOperands)
        {
            return Ok(None);
        }

        let op0_value = self.memory_manager.memory.peek_from_address(op0_addr)?;
        let op1_value = self.memory_manager.memory.peek_from_address(op1_addr)?;
        if op0_value.is_some() && op1_value.is_some() {
            return Ok(None);
        }

        let dst_value = self
            .memory_manager
            .memory
            .peek_from_address(dst_addr)?
            .ok_or(VirtualMachineError::UnknownDst(dst_addr))?;

        let (known_value, unknown_addr) = match (op0_value, op1_value) {
            (Some(value), None) => (value, op1_addr),
            (None, Some(value)) => (value, op0_addr),
            _ => return Err(VirtualMachineError::TooManyUnknownOperands),
        };

        let missing_value = match instruction.res {
            ResLogic::AddOperands => dst_value.sub(&known_value)?,
            _ => dst_value.div(&known_value)?,
        };

        self.memory_manager
            .memory
            .write_to_address(unknown_addr, missing_value)?;
        Ok(Some(dst_value))
    }

    fn compute_res(
        &mut self,
        instruction: &Instruction,
        op0_addr: MemoryAddress,
        op1_addr: MemoryAddress,
    ) -> Result<Option<MemoryValue>, VirtualMachineError> {
        match instruction.res {
            ResLogic::Unconstrained => Ok(None),
            ResLogic::Op1 => Ok(Some(
                self.memory_manager.memory.read_from_address(op1_addr)?,
            )),
            ResLogic::AddOperands | ResLogic::MulOperands => {
                let op0 = self.memory_manager.memory.read_from_address(op0_addr)?;
                let op1 = self.memory_manager.memory.read_from_address(op1_addr)?;
                let res = if instruction.res == ResLogic::AddOperands {
                    op0.add(&op1)?
                } else {
                    op0.mul(&op1)?
                };
                Ok(Some(res))
            }
        }
    }

    fn opcode_assertions(
        &mut self,
        instruction: &Instruction,
        dst_addr: MemoryAddress,
        op0_addr: MemoryAddress,
        res: Option<&MemoryValue>,
    ) -> Result<(), VirtualMachineError> {
        match instruction.opcode {
            Opcode::Call => {
                // The frame: [dst] = caller fp, [op0] = return pc.
                let frame_value = MemoryValue::Address(self.context.address_fp());
                self.memory_manager
                    .memory
                    .write_to_address(dst_addr, frame_value)?;

                let return_pc = self.context.pc.add_usize(instruction.size())?;
                self.memory_manager
                    .memory
                    .write_to_address(op0_addr, MemoryValue::Address(return_pc))?;
            }
            Opcode::AssertEq => {
                // The write-once rule turns this store into an equality check
                // whenever dst is already known.
                let res = *res.ok_or(VirtualMachineError::UnconstrainedRes)?;
                self.memory_manager.memory.write_to_address(dst_addr, res)?;
            }
            Opcode::Ret | Opcode::Nop => {}
        }
        Ok(())
    }

    fn update_pc(
        &mut self,
        instruction: &Instruction,
        dst_addr: MemoryAddress,
        op1_addr: MemoryAddress,
        res: Option<&MemoryValue>,
    ) -> Result<MemoryAddress, VirtualMachineError> {
        match instruction.pc_update {
            PcUpdate::NextInstr => Ok(self.context.pc.add_usize(instruction.size())?),
            PcUpdate::Jump => {
                let res = res.ok_or(VirtualMachineError::UnconstrainedRes)?;
                Ok(MemoryAddress::try_from(*res)?)
            }
            PcUpdate::JumpRel => {
                let res = res.ok_or(VirtualMachineError::UnconstrainedRes)?;
                let delta: F = (*res).try_into()?;
                Ok(self.context.pc.add_felt(&delta)?)
            }
            PcUpdate::Jnz => {
                let dst: F = self
                    .memory_manager
                    .memory
                    .read_from_address(dst_addr)?
                    .try_into()?;
                if dst.is_zero() {
                    Ok(self.context.pc.add_usize(instruction.size())?)
                } else {
                    let delta: F = self
                        .memory_manager
                        .memory
                        .read_from_address(op1_addr)?
                        .try_into()?;
                    Ok(self.context.pc.add_felt(&delta)?)
                }
            }
        }
    }

    fn update_ap(
        &self,
        instruction: &Instruction,
        res: Option<&MemoryValue>,
    ) -> Result<usize, VirtualMachineError> {
        match instruction.ap_update {
            ApUpdate::SameAp => Ok(self.context.ap),
            ApUpdate::AddImm => {
                let res = res.ok_or(VirtualMachineError::UnconstrainedRes)?;
                let delta: F = (*res).try_into()?;
                let delta = felt_to_u64(&delta)?;
                self.context
                    .ap
                    .checked_add(delta as usize)
                    .ok_or_else(|| MathError::UpdateApOverflow(self.context.ap, delta).into())
            }
            ApUpdate::Add1 => Ok(self.context.ap + 1),
            ApUpdate::Add2 => Ok(self.context.ap + 2),
        }
    }

    fn update_fp(
        &mut self,
        instruction: &Instruction,
        dst_addr: MemoryAddress,
    ) -> Result<usize, VirtualMachineError> {
        match instruction.opcode {
            // The two frame cells written by the call sit below the new frame.
            Opcode::Call => Ok(self.context.ap + 2),
            Opcode::Ret => {
                // [dst] holds the caller frame pointer, of the form (exec, fp - 2).
                let dst = self.memory_manager.memory.read_from_address(dst_addr)?;
                let address = MemoryAddress::try_from(dst)?;
                Ok(address.offset)
            }
            Opcode::Nop | Opcode::AssertEq => Ok(self.context.fp),
        }
    }

    /// Relocated register trace, available in proof mode only.
    #[must_use]
    pub fn execution_trace(&self) -> Option<Vec<RelocatedTraceEntry>> {
        let trace = self.trace.as_ref()?;
        // The prover expects addressing to start at 1, with the execution
        // segment placed right after the bytecode.
        let execution_segment_offset =
            self.memory_manager.memory.segments()[PROGRAM_SEGMENT].len() + 1;
        Some(
            trace
                .iter()
                .map(|context| {
                    assert_eq!(
                        context.pc.segment_index, PROGRAM_SEGMENT,
                        "trace pc left the program segment",
                    );
                    context.relocate(execution_segment_offset)
                })
                .collect(),
        )
    }

    #[must_use]
    pub const fn proof_mode(&self) -> bool {
        self.config.proof_mode
    }

    /// Number of recorded trace entries so far.
    #[must_use]
    pub fn trace_len(&self) -> usize {
        self.trace.as_ref().map_or(0, Vec::len)
    }
}
