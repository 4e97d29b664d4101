// src/lib.rs

// --- Module Declarations ---
pub mod compiler;
pub mod error;
pub mod scanner;
pub mod value;
pub mod vm;

// --- Public API Re-exports ---
pub use compiler::compile;
pub use error::{ChunkError, CompileError, InterpretError, RuntimeError, RuntimeErrorKind};
pub use value::Value;
pub use vm::{
    disassemble_chunk, disassemble_to_string, interpret, interpret_with, Chunk, InterpretResult,
    OpCode, Vm, VmConfig,
};
