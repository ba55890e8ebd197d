//! Fixed-width instruction stream encoding.
//!
//! Every instruction is exactly [`INSTR_WIDTH`] bytes: the opcode byte followed
//! by a single operand byte. Operand prefixes (`EXTENDED_ARG`) are not
//! supported and are rejected while decoding; operands that do not fit in one
//! byte are rejected while encoding.

use std::fmt;

use anyhow::Result;

use super::opcode::{OpClass, Opcode};

pub const INSTR_WIDTH: usize = 2;

/// Largest operand the encoding can carry.
pub const MAX_OPERAND: usize = u8::MAX as usize;

/// One decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instr {
    /// Byte offset of the instruction in the stream.
    pub offset: usize,
    pub opcode: Opcode,
    pub arg: u8,
}

impl Instr {
    #[inline]
    pub fn class(&self) -> OpClass {
        self.opcode.class()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Stream length is not a multiple of the instruction width.
    Truncated { len: usize },
    UnknownOpcode { offset: usize, byte: u8 },
    /// Operand prefixes are outside the supported encoding.
    ExtendedArg { offset: usize },
    OperandOverflow { offset: usize, opcode: Opcode, value: usize },
    OffsetOutOfRange { offset: usize, len: usize },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Truncated { len } => write!(
                f,
                "instruction stream of {} bytes is not a multiple of the {}-byte instruction width",
                len, INSTR_WIDTH
            ),
            CodecError::UnknownOpcode { offset, byte } => {
                write!(f, "unknown opcode 0x{:02x} at offset {}", byte, offset)
            }
            CodecError::ExtendedArg { offset } => write!(
                f,
                "EXTENDED_ARG at offset {} is not supported (operands are limited to one byte)",
                offset
            ),
            CodecError::OperandOverflow { offset, opcode, value } => write!(
                f,
                "operand {} for {} at offset {} exceeds the one-byte limit of {}",
                value, opcode, offset, MAX_OPERAND
            ),
            CodecError::OffsetOutOfRange { offset, len } => {
                write!(f, "instruction offset {} is outside a {}-byte stream", offset, len)
            }
        }
    }
}

impl std::error::Error for CodecError {}

/// Decode a whole instruction stream.
pub fn decode(bytes: &[u8]) -> Result<Vec<Instr>> {
    if bytes.len() % INSTR_WIDTH != 0 {
        return Err(CodecError::Truncated { len: bytes.len() }.into());
    }
    let mut instrs = Vec::with_capacity(bytes.len() / INSTR_WIDTH);
    for (idx, chunk) in bytes.chunks_exact(INSTR_WIDTH).enumerate() {
        let offset = idx * INSTR_WIDTH;
        let opcode = Opcode::from_byte(chunk[0]).ok_or(CodecError::UnknownOpcode { offset, byte: chunk[0] })?;
        if opcode == Opcode::ExtendedArg {
            return Err(CodecError::ExtendedArg { offset }.into());
        }
        instrs.push(Instr {
            offset,
            opcode,
            arg: chunk[1],
        });
    }
    Ok(instrs)
}

/// Overwrite the instruction at `offset` in place.
pub fn encode_into(bytes: &mut [u8], offset: usize, opcode: Opcode, arg: usize) -> Result<()> {
    let arg = u8::try_from(arg).map_err(|_| CodecError::OperandOverflow {
        offset,
        opcode,
        value: arg,
    })?;
    let len = bytes.len();
    let slot = offset
        .checked_add(INSTR_WIDTH)
        .and_then(|end| bytes.get_mut(offset..end))
        .ok_or(CodecError::OffsetOutOfRange { offset, len })?;
    slot[0] = opcode as u8;
    slot[1] = arg;
    Ok(())
}

/// Encode a sequence of `(opcode, operand)` pairs into a fresh stream.
pub fn assemble(ops: &[(Opcode, u8)]) -> Vec<u8> {
    let mut out = Vec::with_capacity(ops.len() * INSTR_WIDTH);
    for &(op, arg) in ops {
        out.push(op as u8);
        out.push(arg);
    }
    out
}
