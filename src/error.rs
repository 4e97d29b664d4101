// src/error.rs

use thiserror::Error;

/// Failures while building a chunk.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkError {
    #[error("Too many constants in one chunk ({count}); the limit is 16777216.")]
    TooManyConstants { count: usize },
}

/// Failures of the front end. No bytecode is executed when one of these occurs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("[line {line}] Error: Unexpected character '{ch}'.")]
    UnexpectedChar { ch: char, line: u32 },
    #[error("[line {line}] Error: Unterminated string.")]
    UnterminatedString { line: u32 },
    #[error("[line {line}] Error at '{lexeme}': Expect expression.")]
    ExpectedExpression { lexeme: String, line: u32 },
    #[error("[line {line}] Error at '{lexeme}': {message}")]
    ExpectedToken { message: &'static str, lexeme: String, line: u32 },
    #[error("[line {line}] Error at '{lexeme}': Unsupported expression.")]
    Unsupported { lexeme: String, line: u32 },
    #[error("[line {line}] Error: Expression nests too deeply.")]
    TooDeep { line: u32 },
    #[error("[line {line}] Error: {source}")]
    Chunk { source: ChunkError, line: u32 },
}

impl CompileError {
    pub fn line(&self) -> u32 {
        match self {
            CompileError::UnexpectedChar { line, .. }
            | CompileError::UnterminatedString { line }
            | CompileError::ExpectedExpression { line, .. }
            | CompileError::ExpectedToken { line, .. }
            | CompileError::Unsupported { line, .. }
            | CompileError::TooDeep { line }
            | CompileError::Chunk { line, .. } => *line,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RuntimeErrorKind {
    #[error("Stack underflow.")]
    StackUnderflow,
    #[error("Unknown opcode {0}.")]
    UnknownOpcode(u8),
    #[error("Constant index {index} out of range for a pool of {len}.")]
    ConstantOutOfRange { index: usize, len: usize },
    #[error("Instruction at offset {offset} is missing operand bytes.")]
    TruncatedInstruction { offset: usize },
    #[error("Division by zero.")]
    DivisionByZero,
    #[error("Ran off the end of the chunk without a return.")]
    MissingReturn,
}

/// A failure inside the execute loop, tagged with the source line of the
/// offending instruction when the line table knows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub line: Option<u32>,
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}\n[line {}] in script", self.kind, line),
            None => write!(f, "{}", self.kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InterpretError {
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),
    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

impl InterpretError {
    /// Conventional sysexits code: 65 (data error) or 70 (software error).
    pub fn exit_code(&self) -> i32 {
        match self {
            InterpretError::Compile(_) => 65,
            InterpretError::Runtime(_) => 70,
        }
    }

    pub fn is_compile_error(&self) -> bool {
        matches!(self, InterpretError::Compile(_))
    }

    pub fn is_runtime_error(&self) -> bool {
        matches!(self, InterpretError::Runtime(_))
    }
}
