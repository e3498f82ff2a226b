use ark_ff::PrimeField;

use crate::{constant::F, errors::instruction::InstructionError};

// A 63-bit instruction word packs three biased 16-bit offsets and 15 flag
// bits: off_dst | off_op0 | off_op1 | flags.
const OFF_OP0_SHIFT: u32 = 16;
const OFF_OP1_SHIFT: u32 = 32;
const FLAGS_SHIFT: u32 = 48;
const OFFSET_MASK: u64 = 0xffff;
const OFFSET_BIAS: i32 = 1 << 15;

// Bit positions inside the 16-bit flag word.
const DST_REG_BIT: u16 = 0;
const OP0_REG_BIT: u16 = 1;
const OP1_IMM_BIT: u16 = 2;
const RES_ADD_BIT: u16 = 5;
const PC_JUMP_ABS_BIT: u16 = 7;
const AP_ADD_BIT: u16 = 10;
const OPCODE_CALL_BIT: u16 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    Ap,
    Fp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op1Source {
    /// op1 is addressed through the value of op0.
    Op0,
    /// op1 is the immediate stored at pc + 1.
    Imm,
    FpPlusOffOp1,
    ApPlusOffOp1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResLogic {
    Op1,
    AddOperands,
    MulOperands,
    Unconstrained,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PcUpdate {
    NextInstr,
    /// Absolute jump to res.
    Jump,
    /// Relative jump by res.
    JumpRel,
    /// Conditional relative jump by op1 when dst is nonzero.
    Jnz,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApUpdate {
    SameAp,
    AddImm,
    Add1,
    /// Only produced by `Call`, which reserves two cells for the frame.
    Add2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Nop,
    Call,
    Ret,
    AssertEq,
}

/// A fully decoded instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction {
    pub off_dst: i16,
    pub off_op0: i16,
    pub off_op1: i16,
    pub dst_register: Register,
    pub op0_register: Register,
    pub op1_source: Op1Source,
    pub res: ResLogic,
    pub pc_update: PcUpdate,
    pub ap_update: ApUpdate,
    pub opcode: Opcode,
}

impl Instruction {
    /// Number of bytecode cells the instruction occupies: 2 with an
    /// immediate, 1 otherwise.
    #[must_use]
    pub const fn size(&self) -> usize {
        match self.op1_source {
            Op1Source::Imm => 2,
            _ => 1,
        }
    }

    /// Unpacks a 63-bit instruction word, rejecting reserved bit patterns.
    pub fn decode(word: &F) -> Result<Self, InstructionError> {
        let bigint = word.into_bigint();
        if bigint.0[1..].iter().any(|&limb| limb != 0) || bigint.0[0] >> 63 != 0 {
            return Err(InstructionError::ValueExceeds63Bits(*word));
        }
        let word = bigint.0[0];

        let off_dst = decode_offset((word & OFFSET_MASK) as u16);
        let off_op0 = decode_offset(((word >> OFF_OP0_SHIFT) & OFFSET_MASK) as u16);
        let off_op1 = decode_offset(((word >> OFF_OP1_SHIFT) & OFFSET_MASK) as u16);
        let flags = (word >> FLAGS_SHIFT) as u16;

        let dst_register = if flags & (1 << DST_REG_BIT) == 0 {
            Register::Ap
        } else {
            Register::Fp
        };
        let op0_register = if flags & (1 << OP0_REG_BIT) == 0 {
            Register::Ap
        } else {
            Register::Fp
        };

        let op1_source = match (flags >> OP1_IMM_BIT) & 0b111 {
            0b000 => Op1Source::Op0,
            0b001 => Op1Source::Imm,
            0b010 => Op1Source::FpPlusOffOp1,
            0b100 => Op1Source::ApPlusOffOp1,
            _ => return Err(InstructionError::InvalidOp1Source(flags)),
        };

        let pc_update = match (flags >> PC_JUMP_ABS_BIT) & 0b111 {
            0b000 => PcUpdate::NextInstr,
            0b001 => PcUpdate::Jump,
            0b010 => PcUpdate::JumpRel,
            0b100 => PcUpdate::Jnz,
            _ => return Err(InstructionError::InvalidPcUpdate(flags)),
        };

        // res is unconstrained exactly under Jnz; any res bit there is reserved.
        let res = match (flags >> RES_ADD_BIT) & 0b11 {
            0b00 if pc_update == PcUpdate::Jnz => ResLogic::Unconstrained,
            0b00 => ResLogic::Op1,
            0b01 if pc_update != PcUpdate::Jnz => ResLogic::AddOperands,
            0b10 if pc_update != PcUpdate::Jnz => ResLogic::MulOperands,
            _ => return Err(InstructionError::InvalidResLogic(flags)),
        };

        let mut ap_update = match (flags >> AP_ADD_BIT) & 0b11 {
            0b00 => ApUpdate::SameAp,
            0b01 => ApUpdate::AddImm,
            0b10 => ApUpdate::Add1,
            _ => return Err(InstructionError::InvalidApUpdate(flags)),
        };

        let opcode = match (flags >> OPCODE_CALL_BIT) & 0b111 {
            0b000 => Opcode::Nop,
            0b001 => Opcode::Call,
            0b010 => Opcode::Ret,
            0b100 => Opcode::AssertEq,
            _ => return Err(InstructionError::InvalidOpcode(flags)),
        };

        match opcode {
            // Call stores the return pc at [ap + 1], so op0 must be addressed
            // through Ap, res carries the jump target and ap advances by the
            // two reserved frame cells.
            Opcode::Call => {
                if op0_register != Register::Ap
                    || res != ResLogic::Op1
                    || !matches!(pc_update, PcUpdate::Jump | PcUpdate::JumpRel)
                    || ap_update != ApUpdate::SameAp
                {
                    return Err(InstructionError::MalformedCallInstruction(flags));
                }
                ap_update = ApUpdate::Add2;
            }
            Opcode::Ret => {
                if res != ResLogic::Op1
                    || pc_update != PcUpdate::Jump
                    || ap_update != ApUpdate::SameAp
                {
                    return Err(InstructionError::MalformedRetInstruction(flags));
                }
            }
            _ => {}
        }

        Ok(Self {
            off_dst,
            off_op0,
            off_op1,
            dst_register,
            op0_register,
            op1_source,
            res,
            pc_update,
            ap_update,
            opcode,
        })
    }
}

/// Offsets are stored biased by 2^15.
const fn decode_offset(raw: u16) -> i16 {
    (raw as i32 - OFFSET_BIAS) as i16
}
