//! Human-readable listing of a code object.

use std::fmt::Write as _;

use anyhow::Result;

use super::codec::{Instr, decode};
use super::function::CodeObject;
use super::opcode::{OpClass, Opcode};
use crate::val::Val;

pub const COMPARE_OPS: [&str; 6] = ["<", "<=", "==", "!=", ">", ">="];

fn const_repr(value: &Val) -> String {
    match value {
        Val::Str(s) => format!("{:?}", s.as_ref()),
        other => other.to_string(),
    }
}

/// Operand annotation shown in parentheses, resolved against the tables.
fn annotate(code: &CodeObject, instr: &Instr) -> Option<String> {
    let arg = instr.arg as usize;
    match instr.class() {
        OpClass::ConstLoad => Some(code.consts.get(arg).map_or_else(|| "<?>".to_string(), const_repr)),
        OpClass::LocalLoad | OpClass::LocalStore => code.varnames.get(arg).cloned(),
        OpClass::FreeLoad | OpClass::FreeStore | OpClass::FreeCapture => code.deref_name(arg).map(str::to_string),
        OpClass::GlobalLoad
        | OpClass::GlobalStore
        | OpClass::NameLoad
        | OpClass::NameStore
        | OpClass::AttrLoad
        | OpClass::AttrStore => code.names.get(arg).cloned(),
        OpClass::Other => match instr.opcode {
            Opcode::CompareOp => COMPARE_OPS.get(arg).map(|op| op.to_string()),
            Opcode::JumpForward | Opcode::ForIter => Some(format!("to {}", instr.offset + 2 + arg)),
            _ => None,
        },
    }
}

fn has_operand(op: Opcode) -> bool {
    !matches!(
        op,
        Opcode::Nop
            | Opcode::PopTop
            | Opcode::RotTwo
            | Opcode::DupTop
            | Opcode::ReturnValue
            | Opcode::BinaryAdd
            | Opcode::BinarySubtract
            | Opcode::BinaryMultiply
            | Opcode::BinarySubscr
            | Opcode::InplaceAdd
            | Opcode::GetIter
    )
}

/// One line per instruction: `offset MNEMONIC operand (resolved)`.
pub fn disassemble(code: &CodeObject) -> Result<String> {
    let mut out = String::new();
    for instr in decode(&code.code)? {
        let _ = write!(out, "{:>4} {:<18}", instr.offset, instr.opcode.mnemonic());
        if has_operand(instr.opcode) {
            let _ = write!(out, " {:>3}", instr.arg);
            if let Some(note) = annotate(code, &instr) {
                let _ = write!(out, " ({})", note);
            }
        }
        let trimmed = out.trim_end().len();
        out.truncate(trimmed);
        out.push('\n');
    }
    Ok(out)
}
