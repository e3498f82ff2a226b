use ark_ff::Zero;

use crate::{
    bytecode::program::Program,
    constant::{EXECUTION_SEGMENT, F, PROGRAM_SEGMENT},
    context::run_context::RunContext,
    core::{VirtualMachine, VirtualMachineConfig},
    errors::runner::RunnerError,
    hint::{HintRunner, NoOpHint},
    memory::{address::MemoryAddress, manager::MemoryManager, val::MemoryValue},
    trace::{encode_memory, encode_trace},
    utils::next_power_of_two,
};

/// Drives a compiled zero program from entrypoint to its sentinel end pc.
///
/// The runner owns the segment layout: bytecode lands in segment 0, the
/// execution stack in segment 1, and any further segments are allocated on
/// demand during initialization.
pub struct ZeroRunner {
    program: Program,
    vm: VirtualMachine,
    hint_runner: Box<dyn HintRunner>,
    proof_mode: bool,
    max_steps: usize,
    run_finished: bool,
}

impl ZeroRunner {
    pub fn new(program: Program, proof_mode: bool, max_steps: usize) -> Result<Self, RunnerError> {
        let mut memory_manager = MemoryManager::default();
        memory_manager.memory.allocate_segment(&program.bytecode)?; // PROGRAM_SEGMENT
        memory_manager.memory.allocate_empty_segment(); // EXECUTION_SEGMENT

        let vm = VirtualMachine::new(
            RunContext::default(),
            memory_manager,
            VirtualMachineConfig { proof_mode },
        );

        Ok(Self {
            program,
            vm,
            hint_runner: Box::new(NoOpHint),
            proof_mode,
            max_steps,
            run_finished: false,
        })
    }

    /// Replaces the hint runner invoked before each step.
    #[must_use]
    pub fn with_hint_runner(mut self, hint_runner: Box<dyn HintRunner>) -> Self {
        self.hint_runner = hint_runner;
        self
    }

    /// Runs the program to completion.
    ///
    /// In proof mode, one extra step runs past the end pc and execution is
    /// padded until the step count is a power of two.
    pub fn run(&mut self) -> Result<(), RunnerError> {
        if self.run_finished {
            return Err(RunnerError::ReRun);
        }
        self.run_finished = true;

        let end = self.initialize_main_entrypoint()?;
        tracing::debug!(pc = %self.pc(), end = %end, "initialized main entrypoint");

        self.run_until_pc(end)?;
        tracing::debug!(steps = self.steps(), "reached end pc");

        if self.proof_mode {
            self.run_for(self.vm.step + 1)?;
            let target = next_power_of_two(self.vm.step);
            self.run_for(target)?;
            tracing::debug!(steps = self.steps(), "padded execution");
        }
        Ok(())
    }

    /// Prepares the initial stack frame and registers, returning the end pc.
    pub fn initialize_main_entrypoint(&mut self) -> Result<MemoryAddress, RunnerError> {
        if self.proof_mode {
            let start = self.label("__start__")?;
            let end = self.label("__end__")?;

            let memory = &mut self.vm.memory_manager.memory;
            let program_len = memory.segments()[PROGRAM_SEGMENT].len();
            let offset = memory.segments()[EXECUTION_SEGMENT].len();

            // A dummy frame so the final ret has somewhere to return to: fp
            // points past the bytecode, the saved pc is zero.
            let dummy_fp = MemoryValue::Address(MemoryAddress::new(
                PROGRAM_SEGMENT,
                program_len + offset + 2,
            ));
            memory.write(EXECUTION_SEGMENT, offset, dummy_fp)?;
            memory.write(EXECUTION_SEGMENT, offset + 1, MemoryValue::Int(F::zero()))?;

            self.vm.context.pc = MemoryAddress::new(PROGRAM_SEGMENT, start);
            self.vm.context.ap = offset + 2;
            self.vm.context.fp = self.vm.context.ap;
            return Ok(MemoryAddress::new(PROGRAM_SEGMENT, end));
        }

        let return_fp_segment = self.vm.memory_manager.memory.allocate_empty_segment();
        let return_fp = MemoryValue::Address(MemoryAddress::new(return_fp_segment, 0));
        self.initialize_entrypoint("main", &[], return_fp)
    }

    /// Sets up a call frame for `func_name`: positional arguments, the return
    /// fp and a sentinel end address the final ret will jump to.
    pub fn initialize_entrypoint(
        &mut self,
        func_name: &str,
        arguments: &[F],
        return_fp: MemoryValue,
    ) -> Result<MemoryAddress, RunnerError> {
        let end_segment = self.vm.memory_manager.memory.allocate_empty_segment();
        let end = MemoryAddress::new(end_segment, 0);

        let memory = &mut self.vm.memory_manager.memory;
        for (offset, argument) in arguments.iter().enumerate() {
            memory.write(EXECUTION_SEGMENT, offset, MemoryValue::Int(*argument))?;
        }
        let offset = memory.segments()[EXECUTION_SEGMENT].len();
        memory.write(EXECUTION_SEGMENT, offset, return_fp)?;
        memory.write(EXECUTION_SEGMENT, offset + 1, MemoryValue::Address(end))?;

        let pc = *self
            .program
            .entrypoints
            .get(func_name)
            .ok_or_else(|| RunnerError::UnknownEntrypoint(func_name.to_string()))?;

        self.vm.context.pc = MemoryAddress::new(PROGRAM_SEGMENT, pc);
        self.vm.context.ap = offset + 2;
        self.vm.context.fp = self.vm.context.ap;
        Ok(end)
    }

    /// Steps the VM until the program counter reaches `pc`.
    pub fn run_until_pc(&mut self, pc: MemoryAddress) -> Result<(), RunnerError> {
        while self.vm.context.pc != pc {
            self.step()?;
        }
        Ok(())
    }

    /// Steps the VM until the step counter reaches `steps`.
    pub fn run_for(&mut self, steps: usize) -> Result<(), RunnerError> {
        while self.vm.step < steps {
            self.step()?;
        }
        Ok(())
    }

    fn label(&self, name: &str) -> Result<usize, RunnerError> {
        self.program
            .labels
            .get(name)
            .copied()
            .ok_or_else(|| RunnerError::MissingLabel(name.to_string()))
    }

    fn step(&mut self) -> Result<(), RunnerError> {
        let pc = self.vm.context.pc;
        let step = self.vm.step;
        if step >= self.max_steps {
            return Err(RunnerError::MaxStepsExceeded {
                pc,
                step,
                max_steps: self.max_steps,
            });
        }
        self.vm
            .run_step(self.hint_runner.as_mut())
            .map_err(|source| RunnerError::Step { pc, step, source })
    }

    /// Encoded relocated trace and memory, ready to be written to disk.
    pub fn build_proof(&self) -> Result<(Vec<u8>, Vec<u8>), RunnerError> {
        let trace = self
            .vm
            .execution_trace()
            .ok_or(RunnerError::ProofModeDisabled)?;
        let memory = self.vm.memory_manager.relocate_memory()?;
        Ok((encode_trace(&trace), encode_memory(&memory)))
    }

    #[must_use]
    pub const fn vm(&self) -> &VirtualMachine {
        &self.vm
    }

    #[must_use]
    pub fn vm_mut(&mut self) -> &mut VirtualMachine {
        &mut self.vm
    }

    #[must_use]
    pub const fn pc(&self) -> MemoryAddress {
        self.vm.context.pc
    }

    #[must_use]
    pub const fn steps(&self) -> usize {
        self.vm.step
    }
}
