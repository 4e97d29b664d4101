// src/vm/chunk.rs

use crate::error::ChunkError;
use crate::value::Value;
use crate::vm::opcode::{encode_long_index, OpCode, MAX_CONSTANTS, MAX_SHORT_CONSTANT};

/// One run of the compressed line table: `length` consecutive code bytes
/// that all came from source line `line`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRun {
    pub length: usize,
    pub line: u32,
}

// A chunk of bytecode representing a compiled script.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Chunk {
    // Opcodes and their inline operand bytes.
    pub code: Vec<u8>,
    // The pool of constant values used by the code, addressed by index.
    pub constants: Vec<Value>,
    // Run-length encoded byte offset -> source line mapping.
    // The run lengths always sum to `code.len()`.
    lines: Vec<LineRun>,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    // Appends a byte, which can be an opcode or an operand, tagged with its source line.
    pub fn write(&mut self, byte: u8, line: u32) {
        self.code.push(byte);
        match self.lines.last_mut() {
            Some(run) if run.line == line => run.length += 1,
            _ => self.lines.push(LineRun { length: 1, line }),
        }
    }

    pub fn write_opcode(&mut self, op: OpCode, line: u32) {
        self.write(op.into(), line);
    }

    // Adds a value to the constant pool and returns its index.
    // Identical values are stored again; there is no deduplication.
    pub fn add_constant(&mut self, value: Value) -> usize {
        self.constants.push(value);
        self.constants.len() - 1
    }

    /// Adds `value` to the pool and emits the instruction that loads it:
    /// `OP_CONSTANT` while the index fits in one byte, `OP_CONSTANT_LONG` after that.
    pub fn write_constant(&mut self, value: Value, line: u32) -> Result<usize, ChunkError> {
        if self.constants.len() >= MAX_CONSTANTS {
            return Err(ChunkError::TooManyConstants { count: self.constants.len() + 1 });
        }
        let index = self.add_constant(value);
        if index <= MAX_SHORT_CONSTANT {
            self.write_opcode(OpCode::Constant, line);
            self.write(index as u8, line);
        } else {
            self.write_opcode(OpCode::ConstantLong, line);
            for byte in encode_long_index(index) {
                self.write(byte, line);
            }
        }
        Ok(index)
    }

    /// Source line of the byte at `offset`, found by walking the runs.
    /// Returns `None` past the end of the code.
    pub fn get_line(&self, offset: usize) -> Option<u32> {
        let mut end = 0;
        for run in &self.lines {
            end += run.length;
            if offset < end {
                return Some(run.line);
            }
        }
        None
    }

    pub fn line_runs(&self) -> &[LineRun] {
        &self.lines
    }
}
