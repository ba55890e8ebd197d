//! Compiled-function model.
//!
//! This module contains the fixed-width instruction set, the stream codec,
//! the immutable `CodeObject`/`Function` pair and the partial-record builder
//! used to derive patched code objects.

mod codec;
mod disasm;
mod function;
mod opcode;
mod patch;

#[cfg(test)]
pub(crate) mod interp;

pub use codec::*;
pub use disasm::{COMPARE_OPS, disassemble};
pub use function::*;
pub use opcode::*;
pub use patch::*;
