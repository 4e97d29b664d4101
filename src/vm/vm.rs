// src/vm/vm.rs

use log::{debug, log_enabled, trace, warn, Level};

use crate::compiler::compile;
use crate::error::{InterpretError, RuntimeError, RuntimeErrorKind};
use crate::value::{write_value, Value};
use crate::vm::chunk::Chunk;
use crate::vm::debug::disassemble_instruction;
use crate::vm::opcode::{decode_long_index, OpCode};

/// `Ok` carries the value left by `OP_RETURN`; `Err` tells compile failures
/// (nothing ran) apart from runtime failures (execution aborted).
pub type InterpretResult = Result<Value, InterpretError>;

pub const DEFAULT_STACK_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmConfig {
    // Slots allocated up front; the stack still grows past this on demand.
    pub initial_stack_capacity: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig { initial_stack_capacity: DEFAULT_STACK_CAPACITY }
    }
}

/// The main entry point: compile `source` and run it on a fresh VM.
pub fn interpret(source: &str) -> InterpretResult {
    interpret_with(source, VmConfig::default())
}

pub fn interpret_with(source: &str, config: VmConfig) -> InterpretResult {
    let chunk = compile(source)?;
    let mut vm = Vm::with_config(&chunk, config);
    Ok(vm.run()?)
}

/// The Virtual Machine. Borrows the chunk it executes and owns its value stack.
pub struct Vm<'a> {
    chunk: &'a Chunk,
    ip: usize, // Byte offset of the next instruction
    stack: Vec<Value>,
}

impl<'a> Vm<'a> {
    pub fn new(chunk: &'a Chunk) -> Self {
        Self::with_config(chunk, VmConfig::default())
    }

    pub fn with_config(chunk: &'a Chunk, config: VmConfig) -> Self {
        Vm {
            chunk,
            ip: 0,
            stack: Vec::with_capacity(config.initial_stack_capacity),
        }
    }

    /// Point the VM at another chunk, rewinding the cursor and clearing the stack.
    /// The stack allocation is kept for the next run.
    pub fn reset(&mut self, chunk: &'a Chunk) {
        self.chunk = chunk;
        self.ip = 0;
        self.stack.clear();
    }

    /// Runs `chunk` from its first byte.
    pub fn interpret_chunk(&mut self, chunk: &'a Chunk) -> InterpretResult {
        self.reset(chunk);
        Ok(self.run()?)
    }

    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    pub fn ip(&self) -> usize {
        self.ip
    }

    /// Executes from the current cursor until `OP_RETURN` or the first error.
    pub fn run(&mut self) -> Result<Value, RuntimeError> {
        debug!(
            "running chunk of {} bytes, {} constants",
            self.chunk.len(),
            self.chunk.constants.len()
        );
        let result = self.execute();
        match &result {
            Ok(value) => debug!("chunk returned {}", value),
            Err(err) => warn!("execution aborted at offset {}: {}", self.ip, err.kind),
        }
        result
    }

    /// The fetch-decode-execute loop.
    fn execute(&mut self) -> Result<Value, RuntimeError> {
        loop {
            if log_enabled!(Level::Trace) {
                self.trace_instruction();
            }

            let start = self.ip;
            let byte = self.read_byte(start)?;
            let op = OpCode::try_from(byte)
                .map_err(|unknown| self.error_at(start, RuntimeErrorKind::UnknownOpcode(unknown)))?;

            match op {
                OpCode::Constant => {
                    let index = self.read_byte(start)? as usize;
                    let constant = self.read_constant(index, start)?;
                    self.push(constant);
                }
                OpCode::ConstantLong => {
                    let bytes =
                        [self.read_byte(start)?, self.read_byte(start)?, self.read_byte(start)?];
                    let constant = self.read_constant(decode_long_index(bytes), start)?;
                    self.push(constant);
                }
                OpCode::Negate => {
                    let val = self.pop(start)?;
                    self.push(-val);
                }
                OpCode::Add | OpCode::Subtract | OpCode::Multiply | OpCode::Divide => {
                    // The right-hand operand was pushed last, so it comes off first.
                    let b = self.pop(start)?;
                    let a = self.pop(start)?;
                    let result = match op {
                        OpCode::Add => a + b,
                        OpCode::Subtract => a - b,
                        OpCode::Multiply => a * b,
                        _ => {
                            if b == 0.0 {
                                return Err(self.error_at(start, RuntimeErrorKind::DivisionByZero));
                            }
                            a / b
                        }
                    };
                    self.push(result);
                }
                OpCode::Return => return self.pop(start),
            }
        }
    }

    // Reads the byte under the cursor and advances past it. `start` is the
    // offset of the instruction being decoded, used for error reporting.
    fn read_byte(&mut self, start: usize) -> Result<u8, RuntimeError> {
        match self.chunk.code.get(self.ip) {
            Some(&byte) => {
                self.ip += 1;
                Ok(byte)
            }
            None if self.ip == start => Err(self.error_at(start, RuntimeErrorKind::MissingReturn)),
            None => {
                Err(self.error_at(start, RuntimeErrorKind::TruncatedInstruction { offset: start }))
            }
        }
    }

    fn read_constant(&self, index: usize, start: usize) -> Result<Value, RuntimeError> {
        match self.chunk.constants.get(index) {
            Some(&value) => Ok(value),
            None => {
                let len = self.chunk.constants.len();
                Err(self.error_at(start, RuntimeErrorKind::ConstantOutOfRange { index, len }))
            }
        }
    }

    fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    // Pops from the stack, returning a runtime error on underflow.
    fn pop(&mut self, start: usize) -> Result<Value, RuntimeError> {
        match self.stack.pop() {
            Some(value) => Ok(value),
            None => Err(self.error_at(start, RuntimeErrorKind::StackUnderflow)),
        }
    }

    fn error_at(&self, offset: usize, kind: RuntimeErrorKind) -> RuntimeError {
        RuntimeError { kind, line: self.chunk.get_line(offset) }
    }

    fn trace_instruction(&self) {
        for line in self.trace_lines() {
            trace!("{}", line);
        }
    }

    // The value stack, bottom first, then the instruction about to run.
    fn trace_lines(&self) -> Vec<String> {
        let mut stack = String::from("          ");
        for &value in &self.stack {
            stack.push_str("[ ");
            write_value(&mut stack, value);
            stack.push_str(" ]");
        }

        let mut lines = vec![stack];
        if self.ip < self.chunk.len() {
            let mut instruction = String::new();
            disassemble_instruction(self.chunk, self.ip, &mut instruction);
            lines.push(instruction.trim_end().to_string());
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_of(constants: &[Value], tail: &[OpCode]) -> Chunk {
        let mut chunk = Chunk::new();
        for &value in constants {
            chunk.write_constant(value, 1).unwrap();
        }
        for &op in tail {
            chunk.write_opcode(op, 1);
        }
        chunk
    }

    #[test]
    fn test_add_returns_sum() {
        let chunk = chunk_of(&[1.0, 2.0], &[OpCode::Add, OpCode::Return]);
        assert_eq!(Vm::new(&chunk).run(), Ok(3.0));
    }

    #[test]
    fn test_operand_order_for_subtract_and_divide() {
        let chunk = chunk_of(&[10.0, 4.0], &[OpCode::Subtract, OpCode::Return]);
        assert_eq!(Vm::new(&chunk).run(), Ok(6.0));

        let chunk = chunk_of(&[10.0, 4.0], &[OpCode::Divide, OpCode::Return]);
        assert_eq!(Vm::new(&chunk).run(), Ok(2.5));
    }

    #[test]
    fn test_return_on_empty_stack_underflows() {
        let chunk = chunk_of(&[], &[OpCode::Return]);
        let err = Vm::new(&chunk).run().unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::StackUnderflow);
        assert_eq!(err.line, Some(1));
    }

    #[test]
    fn test_unknown_opcode_is_a_runtime_error() {
        let mut chunk = Chunk::new();
        chunk.write(0xc8, 4);
        let err = Vm::new(&chunk).run().unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::UnknownOpcode(0xc8));
        assert_eq!(err.line, Some(4));
    }

    #[test]
    fn test_bad_bytecode_is_reported_not_executed() {
        let mut chunk = Chunk::new();
        chunk.write_opcode(OpCode::Constant, 1);
        chunk.write(3, 1);
        let err = Vm::new(&chunk).run().unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::ConstantOutOfRange { index: 3, len: 0 });

        let mut chunk = Chunk::new();
        chunk.write_opcode(OpCode::ConstantLong, 1);
        chunk.write(0, 1);
        let err = Vm::new(&chunk).run().unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::TruncatedInstruction { offset: 0 });

        let chunk = chunk_of(&[1.0], &[]);
        let err = Vm::new(&chunk).run().unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::MissingReturn);
    }

    #[test]
    fn test_division_by_zero() {
        let chunk = chunk_of(&[1.0, 0.0], &[OpCode::Divide, OpCode::Return]);
        let err = Vm::new(&chunk).run().unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::DivisionByZero);
    }

    #[test]
    fn test_vm_is_reusable_across_chunks() {
        let first = chunk_of(&[5.0], &[OpCode::Negate, OpCode::Return]);
        let second = chunk_of(&[2.0, 3.0, 4.0], &[OpCode::Multiply, OpCode::Add, OpCode::Return]);

        let mut vm = Vm::new(&first);
        assert_eq!(vm.interpret_chunk(&first), Ok(-5.0));
        assert_eq!(vm.interpret_chunk(&second), Ok(14.0));
        assert!(vm.stack().is_empty());
        assert_eq!(vm.ip(), second.len());
    }

    #[test]
    fn test_stack_grows_past_initial_capacity() {
        let mut chunk = Chunk::new();
        for _ in 0..10 {
            chunk.write_constant(1.0, 1).unwrap();
        }
        for _ in 0..9 {
            chunk.write_opcode(OpCode::Add, 1);
        }
        chunk.write_opcode(OpCode::Return, 1);

        let mut vm = Vm::with_config(&chunk, VmConfig { initial_stack_capacity: 2 });
        assert_eq!(vm.run(), Ok(10.0));
    }

    #[test]
    fn test_interpret_source() {
        assert_eq!(interpret("1 + 2"), Ok(3.0));
        assert!(interpret("1 +").unwrap_err().is_compile_error());
        assert!(interpret("1 / 0").unwrap_err().is_runtime_error());
    }

    #[test]
    fn test_trace_shows_stack_and_next_instruction() {
        let chunk = chunk_of(&[1.5, 2.0], &[OpCode::Add, OpCode::Return]);
        let mut vm = Vm::new(&chunk);
        assert_eq!(vm.trace_lines(), vec!["          ", "0000    1 OP_CONSTANT         0 1.5"]);

        vm.push(1.5);
        vm.push(2.0);
        vm.ip = 4;
        assert_eq!(vm.trace_lines(), vec!["          [ 1.5 ][ 2 ]", "0004    | OP_ADD"]);

        vm.ip = chunk.len();
        assert_eq!(vm.trace_lines().len(), 1);
    }

    #[test]
    fn test_run_with_trace_logging_enabled() {
        let _ = env_logger::builder()
            .is_test(true)
            .filter_level(log::LevelFilter::Trace)
            .try_init();

        let chunk = chunk_of(&[10.0, 4.0], &[OpCode::Subtract, OpCode::Negate, OpCode::Return]);
        assert_eq!(Vm::new(&chunk).run(), Ok(-6.0));
    }
}
