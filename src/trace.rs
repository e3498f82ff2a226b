use ark_ff::{BigInteger, PrimeField};

use crate::constant::F;

/// A register snapshot after relocation to the flat address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelocatedTraceEntry {
    pub ap: u64,
    pub fp: u64,
    pub pc: u64,
}

const TRACE_ENTRY_SIZE: usize = 3 * 8;
const ADDR_SIZE: usize = 8;
const FELT_SIZE: usize = 32;

/// Encodes a trace as 24-byte little-endian records: ap || fp || pc.
#[must_use]
pub fn encode_trace(trace: &[RelocatedTraceEntry]) -> Vec<u8> {
    let mut content = Vec::with_capacity(trace.len() * TRACE_ENTRY_SIZE);
    for entry in trace {
        content.extend_from_slice(&entry.ap.to_le_bytes());
        content.extend_from_slice(&entry.fp.to_le_bytes());
        content.extend_from_slice(&entry.pc.to_le_bytes());
    }
    content
}

#[must_use]
pub fn decode_trace(content: &[u8]) -> Vec<RelocatedTraceEntry> {
    content
        .chunks_exact(TRACE_ENTRY_SIZE)
        .map(|chunk| RelocatedTraceEntry {
            ap: u64::from_le_bytes(chunk[..8].try_into().unwrap()),
            fp: u64::from_le_bytes(chunk[8..16].try_into().unwrap()),
            pc: u64::from_le_bytes(chunk[16..24].try_into().unwrap()),
        })
        .collect()
}

/// Encodes a relocated memory image as (address: u64 LE, felt: 32 bytes LE)
/// records, populated cells only, in ascending address order.
#[must_use]
pub fn encode_memory(memory: &[Option<F>]) -> Vec<u8> {
    let populated = memory.iter().flatten().count();
    let mut content = Vec::with_capacity(populated * (ADDR_SIZE + FELT_SIZE));
    for (address, felt) in memory.iter().enumerate() {
        let Some(felt) = felt else { continue };
        content.extend_from_slice(&(address as u64).to_le_bytes());
        content.extend_from_slice(&felt.into_bigint().to_bytes_le());
    }
    content
}

#[must_use]
pub fn decode_memory(content: &[u8]) -> Vec<Option<F>> {
    let records = content.chunks_exact(ADDR_SIZE + FELT_SIZE);
    // The records are sorted, so the last address bounds the image.
    let len = records
        .clone()
        .last()
        .map_or(0, |chunk| u64::from_le_bytes(chunk[..8].try_into().unwrap()) as usize + 1);

    let mut memory = vec![None; len];
    for chunk in records {
        let address = u64::from_le_bytes(chunk[..8].try_into().unwrap()) as usize;
        memory[address] = Some(F::from_le_bytes_mod_order(&chunk[8..]));
    }
    memory
}
