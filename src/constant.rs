use ark_ff::fields::{Fp256, MontBackend, MontConfig};

/// Base field of the STARK curve: p = 2^251 + 17 * 2^192 + 1.
#[derive(MontConfig)]
#[modulus = "3618502788666131213697322783095070105623107215331596699973092056135872020481"]
#[generator = "3"]
pub struct StarkFieldConfig;

pub type F = Fp256<MontBackend<StarkFieldConfig, 4>>;

/// Segment holding the read-only bytecode.
pub const PROGRAM_SEGMENT: usize = 0;
/// Segment holding the runtime stack frames.
pub const EXECUTION_SEGMENT: usize = 1;
