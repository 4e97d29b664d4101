// src/vm/debug.rs

// Read-only bytecode listing for tooling. Malformed input is reported inline;
// the walk always continues to the end of the chunk.

use std::fmt::Write;

use crate::value::write_value;
use crate::vm::chunk::Chunk;
use crate::vm::opcode::{decode_long_index, OpCode};

/// Print a full listing of `chunk` to stdout, headed by `===name===`.
pub fn disassemble_chunk(chunk: &Chunk, name: &str) {
    print!("{}", disassemble_to_string(chunk, name));
}

/// Same text as [`disassemble_chunk`], returned instead of printed.
pub fn disassemble_to_string(chunk: &Chunk, name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "==={}===", name);

    let mut offset = 0;
    while offset < chunk.len() {
        offset = disassemble_instruction(chunk, offset, &mut out);
    }
    out
}

/// Render the instruction at `offset` as one trace line and return the offset
/// of the next instruction.
pub fn disassemble_instruction(chunk: &Chunk, offset: usize, out: &mut impl Write) -> usize {
    let _ = write!(out, "{:04} ", offset);
    let line = chunk.get_line(offset);
    if offset > 0 && line == chunk.get_line(offset - 1) {
        let _ = write!(out, "   | ");
    } else {
        match line {
            Some(line) => {
                let _ = write!(out, "{:4} ", line);
            }
            None => {
                let _ = write!(out, "   ? ");
            }
        }
    }

    let Some(&byte) = chunk.code.get(offset) else {
        let _ = writeln!(out, "<end of code>");
        return offset + 1;
    };

    match OpCode::try_from(byte) {
        Ok(op @ OpCode::Constant) => constant_instruction(op, chunk, offset, out),
        Ok(op @ OpCode::ConstantLong) => constant_instruction(op, chunk, offset, out),
        Ok(
            op @ (OpCode::Add
            | OpCode::Subtract
            | OpCode::Multiply
            | OpCode::Divide
            | OpCode::Negate
            | OpCode::Return),
        ) => simple_instruction(op, offset, out),
        Err(unknown) => {
            let _ = writeln!(out, "Unknown code {}", unknown);
            offset + 1
        }
    }
}

fn simple_instruction(op: OpCode, offset: usize, out: &mut impl Write) -> usize {
    let _ = writeln!(out, "{}", op.mnemonic());
    offset + 1
}

fn constant_instruction(op: OpCode, chunk: &Chunk, offset: usize, out: &mut impl Write) -> usize {
    let operands = &chunk.code[offset + 1..chunk.len().min(offset + op.width())];
    let index = match (op, operands) {
        (OpCode::Constant, &[index]) => index as usize,
        (OpCode::ConstantLong, &[lo, mid, hi]) => decode_long_index([lo, mid, hi]),
        _ => {
            // Operand bytes run past the end of the code.
            let _ = writeln!(out, "{:<16} <truncated>", op.mnemonic());
            return chunk.len();
        }
    };

    let _ = write!(out, "{:<16} {:4} ", op.mnemonic(), index);
    match chunk.constants.get(index) {
        Some(&value) => write_value(out, value),
        None => {
            let _ = write!(out, "<out of range>");
        }
    }
    let _ = writeln!(out);
    offset + op.width()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_listing_format() {
        let mut chunk = Chunk::new();
        chunk.write_constant(1.2, 123).unwrap();
        chunk.write_opcode(OpCode::Negate, 123);
        chunk.write_opcode(OpCode::Return, 124);

        let expected = "\
===test chunk===
0000  123 OP_CONSTANT         0 1.2
0002    | OP_NEGATE
0003  124 OP_RETURN
";
        assert_eq!(disassemble_to_string(&chunk, "test chunk"), expected);
    }

    #[test]
    fn test_unknown_opcode_does_not_stop_the_walk() {
        let mut chunk = Chunk::new();
        chunk.write(0xee, 1);
        chunk.write_opcode(OpCode::Return, 1);

        let listing = disassemble_to_string(&chunk, "bad");
        assert_eq!(listing, "===bad===\n0000    1 Unknown code 238\n0001    | OP_RETURN\n");
    }

    #[test]
    fn test_truncated_and_out_of_range_operands() {
        let mut chunk = Chunk::new();
        chunk.write_opcode(OpCode::Constant, 1);
        chunk.write(9, 1);
        chunk.write_opcode(OpCode::ConstantLong, 2);
        chunk.write(0, 2);

        let listing = disassemble_to_string(&chunk, "broken");
        assert_eq!(
            listing,
            "===broken===\n\
             0000    1 OP_CONSTANT         9 <out of range>\n\
             0002    2 OP_CONSTANT_LONG <truncated>\n"
        );
    }

    #[test]
    fn test_single_instruction_returns_next_offset() {
        let mut chunk = Chunk::new();
        chunk.write_constant(5.0, 1).unwrap();
        chunk.write_opcode(OpCode::Return, 1);

        let mut line = String::new();
        assert_eq!(disassemble_instruction(&chunk, 0, &mut line), 2);
        assert_eq!(line, "0000    1 OP_CONSTANT         0 5\n");
        assert_eq!(disassemble_instruction(&chunk, 2, &mut String::new()), 3);
    }
}
