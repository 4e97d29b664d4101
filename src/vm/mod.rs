// src/vm/mod.rs

// Declare the modules within the `vm` crate.
pub mod chunk;
pub mod debug;
pub mod opcode;
pub mod vm;
pub mod vm_test;

// Re-export the key structures and functions.
pub use chunk::{Chunk, LineRun};
pub use debug::{disassemble_chunk, disassemble_instruction, disassemble_to_string};
pub use opcode::OpCode;
pub use vm::{interpret, interpret_with, InterpretResult, Vm, VmConfig, DEFAULT_STACK_CAPACITY};
