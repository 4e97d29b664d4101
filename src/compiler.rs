// src/compiler.rs

// Single-pass compiler: pulls tokens from the scanner and emits bytecode
// directly, using precedence climbing for the arithmetic operators.

use log::debug;

use crate::error::CompileError;
use crate::scanner::{Scanner, Token, TokenKind};
use crate::vm::chunk::Chunk;
use crate::vm::opcode::OpCode;

// Deepest chain of nested prefix operators and groupings the parser will follow.
pub const MAX_NESTING: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    None,
    Term,   // + -
    Factor, // * /
    Unary,  // -
}

impl Precedence {
    fn next(self) -> Precedence {
        match self {
            Precedence::None => Precedence::Term,
            Precedence::Term => Precedence::Factor,
            Precedence::Factor | Precedence::Unary => Precedence::Unary,
        }
    }
}

fn infix_precedence(kind: TokenKind) -> Precedence {
    match kind {
        TokenKind::Plus | TokenKind::Minus => Precedence::Term,
        TokenKind::Star | TokenKind::Slash => Precedence::Factor,
        _ => Precedence::None,
    }
}

/// The main entry point for compilation. Produces a chunk that evaluates the
/// expression in `source` and returns its value.
pub fn compile(source: &str) -> Result<Chunk, CompileError> {
    let mut compiler = Compiler::new(source)?;
    compiler.expression()?;
    compiler.consume(TokenKind::Eof, "Expect end of expression.")?;
    compiler.emit_return();
    debug!(
        "compiled {} bytes, {} constants",
        compiler.chunk.len(),
        compiler.chunk.constants.len()
    );
    Ok(compiler.chunk)
}

struct Compiler<'src> {
    scanner: Scanner<'src>,
    current: Token<'src>,
    previous: Token<'src>,
    chunk: Chunk,
    depth: usize,
}

impl<'src> Compiler<'src> {
    fn new(source: &'src str) -> Result<Self, CompileError> {
        let mut scanner = Scanner::new(source);
        let first = scanner.scan_token()?;
        Ok(Compiler { scanner, current: first, previous: first, chunk: Chunk::new(), depth: 0 })
    }

    fn advance(&mut self) -> Result<(), CompileError> {
        self.previous = self.current;
        self.current = self.scanner.scan_token()?;
        Ok(())
    }

    fn consume(&mut self, kind: TokenKind, message: &'static str) -> Result<(), CompileError> {
        if self.current.kind == kind {
            return self.advance();
        }
        Err(CompileError::ExpectedToken {
            message,
            lexeme: lexeme_of(&self.current),
            line: self.current.line,
        })
    }

    fn expression(&mut self) -> Result<(), CompileError> {
        self.parse_precedence(Precedence::Term)
    }

    fn parse_precedence(&mut self, precedence: Precedence) -> Result<(), CompileError> {
        if self.depth >= MAX_NESTING {
            return Err(CompileError::TooDeep { line: self.current.line });
        }
        self.depth += 1;

        self.advance()?;
        self.prefix()?;

        while precedence <= infix_precedence(self.current.kind) {
            self.advance()?;
            self.binary()?;
        }

        self.depth -= 1;
        Ok(())
    }

    fn prefix(&mut self) -> Result<(), CompileError> {
        let token = self.previous;
        match token.kind {
            TokenKind::Number => self.number(),
            TokenKind::LeftParen => self.grouping(),
            TokenKind::Minus => self.unary(),
            // Valid tokens of the language that this front end does not compile yet.
            TokenKind::Identifier
            | TokenKind::String
            | TokenKind::Nil
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Bang
            | TokenKind::This
            | TokenKind::Super => Err(CompileError::Unsupported {
                lexeme: token.lexeme.to_string(),
                line: token.line,
            }),
            _ => Err(CompileError::ExpectedExpression {
                lexeme: lexeme_of(&token),
                line: token.line,
            }),
        }
    }

    fn number(&mut self) -> Result<(), CompileError> {
        let token = self.previous;
        let value: f64 = token.lexeme.parse().map_err(|_| CompileError::ExpectedExpression {
            lexeme: token.lexeme.to_string(),
            line: token.line,
        })?;
        self.chunk
            .write_constant(value, token.line)
            .map_err(|source| CompileError::Chunk { source, line: token.line })?;
        Ok(())
    }

    fn grouping(&mut self) -> Result<(), CompileError> {
        self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after expression.")
    }

    fn unary(&mut self) -> Result<(), CompileError> {
        let line = self.previous.line;
        // Compile the operand first; negation applies to its value.
        self.parse_precedence(Precedence::Unary)?;
        self.chunk.write_opcode(OpCode::Negate, line);
        Ok(())
    }

    fn binary(&mut self) -> Result<(), CompileError> {
        let operator = self.previous;
        // Left associative: the right operand binds one level tighter.
        self.parse_precedence(infix_precedence(operator.kind).next())?;

        let op = match operator.kind {
            TokenKind::Plus => OpCode::Add,
            TokenKind::Minus => OpCode::Subtract,
            TokenKind::Star => OpCode::Multiply,
            _ => OpCode::Divide,
        };
        self.chunk.write_opcode(op, operator.line);
        Ok(())
    }

    fn emit_return(&mut self) {
        self.chunk.write_opcode(OpCode::Return, self.previous.line);
    }
}

fn lexeme_of(token: &Token) -> String {
    if token.kind == TokenKind::Eof {
        "end".to_string()
    } else {
        token.lexeme.to_string()
    }
}
