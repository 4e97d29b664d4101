// tests/test_utils.rs

use lox_vm::{Chunk, OpCode, Value};

// Builds a chunk from constants (each loaded with the short or long form as the
// pool size dictates) followed by plain opcodes, all on line 1.
#[allow(dead_code)]
pub fn chunk_with(constants: &[Value], ops: &[OpCode]) -> Chunk {
    let mut chunk = Chunk::new();
    for &value in constants {
        chunk.write_constant(value, 1).unwrap();
    }
    for &op in ops {
        chunk.write_opcode(op, 1);
    }
    chunk
}

// Fills the pool with `count` filler constants without emitting any code.
#[allow(dead_code)]
pub fn chunk_with_pool(count: usize) -> Chunk {
    let mut chunk = Chunk::new();
    for i in 0..count {
        chunk.add_constant(i as f64);
    }
    chunk
}

// Extracts the mnemonic column of a listing, skipping the banner.
#[allow(dead_code)]
pub fn mnemonics(listing: &str) -> Vec<String> {
    listing
        .lines()
        .skip(1)
        .filter_map(|line| line.get(10..))
        .filter_map(|rest| rest.split_whitespace().next())
        .map(str::to_string)
        .collect()
}
