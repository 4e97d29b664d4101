// src/vm/opcode.rs

use paste::paste;

// --- Opcode Table ---
// One row per instruction: variant, mnemonic suffix, byte value, total width in bytes.
// The macro expands to the enum, the byte conversion, and the name/width lookups,
// so adding a row is the only edit a new instruction needs.
macro_rules! define_opcodes {
    ( $( $(#[$doc:meta])* ($variant:ident, $mnemonic:ident, $byte:literal, $width:literal) ),* $(,)? ) => {
        paste! {
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            #[repr(u8)]
            pub enum OpCode {
                $( $(#[$doc])* $variant = $byte, )*
            }

            impl OpCode {
                /// Every opcode, in byte order.
                pub const ALL: &'static [OpCode] = &[ $( OpCode::$variant, )* ];

                /// The trace name, e.g. `OP_CONSTANT`.
                pub fn mnemonic(self) -> &'static str {
                    match self {
                        $( OpCode::$variant => stringify!([<OP_ $mnemonic>]), )*
                    }
                }

                /// Total instruction width: the opcode byte plus its inline operands.
                pub fn width(self) -> usize {
                    match self {
                        $( OpCode::$variant => $width, )*
                    }
                }
            }

            impl TryFrom<u8> for OpCode {
                type Error = u8;

                fn try_from(byte: u8) -> Result<Self, Self::Error> {
                    match byte {
                        $( $byte => Ok(OpCode::$variant), )*
                        other => Err(other),
                    }
                }
            }
        }
    };
}

define_opcodes! {
    /// Pushes a constant. Operand: 1-byte pool index.
    (Constant, CONSTANT, 0, 2),
    /// Pushes a constant. Operand: 3-byte little-endian pool index.
    (ConstantLong, CONSTANT_LONG, 1, 4),
    (Add, ADD, 2, 1),
    (Subtract, SUBTRACT, 3, 1),
    (Multiply, MULTIPLY, 4, 1),
    (Divide, DIVIDE, 5, 1),
    /// Negates the top of the stack.
    (Negate, NEGATE, 6, 1),
    /// Ends execution; the top of the stack is the result.
    (Return, RETURN, 7, 1),
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> Self {
        op as u8
    }
}

/// Largest index a 1-byte `OP_CONSTANT` operand can address.
pub const MAX_SHORT_CONSTANT: usize = u8::MAX as usize;

/// Number of constants a 3-byte `OP_CONSTANT_LONG` operand can address (2^24).
pub const MAX_CONSTANTS: usize = 1 << 24;

/// Splits a pool index into the three little-endian operand bytes of `OP_CONSTANT_LONG`.
pub fn encode_long_index(index: usize) -> [u8; 3] {
    [(index & 0xff) as u8, ((index >> 8) & 0xff) as u8, ((index >> 16) & 0xff) as u8]
}

pub fn decode_long_index(bytes: [u8; 3]) -> usize {
    bytes[0] as usize | (bytes[1] as usize) << 8 | (bytes[2] as usize) << 16
}
