//! Minimal reference interpreter used by tests to compare observable results
//! of original and patched functions.

use anyhow::{Result, anyhow, bail};

use super::codec::{INSTR_WIDTH, decode};
use super::function::{ClosureCell, Function};
use super::opcode::Opcode;
use crate::val::Val;

enum Entry {
    Val(Val),
    Iter(Vec<Val>, usize),
}

fn pop(stack: &mut Vec<Entry>) -> Result<Val> {
    match stack.pop() {
        Some(Entry::Val(v)) => Ok(v),
        Some(Entry::Iter(..)) => bail!("expected value, found iterator"),
        None => bail!("stack underflow"),
    }
}

fn arith(op: Opcode, a: &Val, b: &Val) -> Result<Val> {
    Ok(match (op, a, b) {
        (Opcode::BinaryAdd | Opcode::InplaceAdd, Val::Int(x), Val::Int(y)) => Val::Int(x + y),
        (Opcode::BinaryAdd | Opcode::InplaceAdd, Val::Float(x), Val::Float(y)) => Val::Float(x + y),
        (Opcode::BinaryAdd | Opcode::InplaceAdd, Val::Str(x), Val::Str(y)) => Val::str(format!("{}{}", x, y)),
        (Opcode::BinaryAdd | Opcode::InplaceAdd, Val::Tuple(x), Val::Tuple(y)) => {
            Val::tuple(x.iter().chain(y.iter()).cloned())
        }
        (Opcode::BinarySubtract, Val::Int(x), Val::Int(y)) => Val::Int(x - y),
        (Opcode::BinaryMultiply, Val::Int(x), Val::Int(y)) => Val::Int(x * y),
        _ => bail!("unsupported operands for {}: {} and {}", op, a.type_name(), b.type_name()),
    })
}

fn compare(arg: u8, a: &Val, b: &Val) -> Result<bool> {
    if let (Val::Int(x), Val::Int(y)) = (a, b) {
        return Ok(match arg {
            0 => x < y,
            1 => x <= y,
            2 => x == y,
            3 => x != y,
            4 => x > y,
            5 => x >= y,
            _ => bail!("bad comparison {}", arg),
        });
    }
    match arg {
        2 => Ok(a == b),
        3 => Ok(a != b),
        _ => bail!("cannot order {} and {}", a.type_name(), b.type_name()),
    }
}

fn iterate(value: Val) -> Result<Vec<Val>> {
    match value {
        Val::Tuple(items) | Val::List(items) => Ok(items.to_vec()),
        Val::Range(start, end) => Ok((start..end).map(Val::Int).collect()),
        Val::Str(s) => Ok(s.chars().map(|c| Val::str(c.to_string())).collect()),
        other => bail!("{} is not iterable", other.type_name()),
    }
}

/// Run `func` with positional `args` and return its result.
pub fn call(func: &Function, args: &[Val]) -> Result<Val> {
    let code = &func.code;
    let instrs = decode(&code.code)?;
    let mut locals = vec![Val::Nil; code.varnames.len().max(code.nlocals as usize)];
    for (slot, arg) in locals.iter_mut().zip(args) {
        *slot = arg.clone();
    }
    let mut cells: Vec<ClosureCell> = code.cellvars.iter().map(|_| ClosureCell::default()).collect();
    cells.extend(func.closure.iter().cloned());

    let mut stack: Vec<Entry> = Vec::new();
    let mut pc = 0usize;
    while let Some(instr) = instrs.get(pc / INSTR_WIDTH) {
        let arg = instr.arg as usize;
        let next = pc + INSTR_WIDTH;
        pc = next;
        match instr.opcode {
            Opcode::Nop => {}
            Opcode::PopTop => {
                stack.pop();
            }
            Opcode::RotTwo => {
                let len = stack.len();
                if len < 2 {
                    bail!("stack underflow");
                }
                stack.swap(len - 1, len - 2);
            }
            Opcode::DupTop => {
                let top = pop(&mut stack)?;
                stack.push(Entry::Val(top.clone()));
                stack.push(Entry::Val(top));
            }
            Opcode::ReturnValue => return pop(&mut stack),
            Opcode::BinaryAdd | Opcode::InplaceAdd | Opcode::BinarySubtract | Opcode::BinaryMultiply => {
                let b = pop(&mut stack)?;
                let a = pop(&mut stack)?;
                stack.push(Entry::Val(arith(instr.opcode, &a, &b)?));
            }
            Opcode::BinarySubscr => {
                let index = pop(&mut stack)?;
                let base = pop(&mut stack)?;
                let item = match (&base, &index) {
                    (Val::Tuple(items) | Val::List(items), Val::Int(i)) => {
                        items.get(*i as usize).cloned().ok_or_else(|| anyhow!("index {} out of range", i))?
                    }
                    _ => bail!("cannot index {}", base.type_name()),
                };
                stack.push(Entry::Val(item));
            }
            Opcode::CompareOp => {
                let b = pop(&mut stack)?;
                let a = pop(&mut stack)?;
                stack.push(Entry::Val(Val::Bool(compare(instr.arg, &a, &b)?)));
            }
            Opcode::BuildTuple | Opcode::BuildList => {
                if stack.len() < arg {
                    bail!("stack underflow");
                }
                let mut items = Vec::with_capacity(arg);
                for _ in 0..arg {
                    items.push(pop(&mut stack)?);
                }
                items.reverse();
                stack.push(Entry::Val(if instr.opcode == Opcode::BuildTuple {
                    Val::tuple(items)
                } else {
                    Val::list(items)
                }));
            }
            Opcode::GetIter => {
                let value = pop(&mut stack)?;
                stack.push(Entry::Iter(iterate(value)?, 0));
            }
            Opcode::ForIter => {
                let item = match stack.last_mut() {
                    Some(Entry::Iter(items, pos)) => {
                        let item = items.get(*pos).cloned();
                        if item.is_some() {
                            *pos += 1;
                        }
                        item
                    }
                    _ => bail!("FOR_ITER without iterator"),
                };
                match item {
                    Some(item) => stack.push(Entry::Val(item)),
                    None => {
                        stack.pop();
                        pc = next + arg;
                    }
                }
            }
            Opcode::JumpForward => pc = next + arg,
            Opcode::JumpAbsolute => pc = arg,
            Opcode::PopJumpIfFalse | Opcode::PopJumpIfTrue => {
                let cond = pop(&mut stack)?.is_truthy();
                if cond == (instr.opcode == Opcode::PopJumpIfTrue) {
                    pc = arg;
                }
            }
            Opcode::LoadConst => {
                let value = code.consts.get(arg).cloned().ok_or_else(|| anyhow!("bad const {}", arg))?;
                stack.push(Entry::Val(value));
            }
            Opcode::LoadFast => stack.push(Entry::Val(locals[arg].clone())),
            Opcode::StoreFast => locals[arg] = pop(&mut stack)?,
            Opcode::DeleteFast => locals[arg] = Val::Nil,
            Opcode::LoadDeref | Opcode::LoadClassDeref => {
                let cell = cells.get(arg).ok_or_else(|| anyhow!("bad cell {}", arg))?;
                stack.push(Entry::Val(cell.get()));
            }
            Opcode::StoreDeref => {
                let value = pop(&mut stack)?;
                cells.get(arg).ok_or_else(|| anyhow!("bad cell {}", arg))?.set(value);
            }
            Opcode::LoadGlobal | Opcode::LoadName => {
                let name = &code.names[arg];
                let value = func
                    .globals
                    .get(name)
                    .map(|entry| entry.value().clone())
                    .ok_or_else(|| anyhow!("name '{}' is not defined", name))?;
                stack.push(Entry::Val(value));
            }
            Opcode::StoreGlobal | Opcode::StoreName => {
                let value = pop(&mut stack)?;
                func.globals.insert(code.names[arg].clone(), value);
            }
            Opcode::DeleteGlobal | Opcode::DeleteName => {
                func.globals.remove(&code.names[arg]);
            }
            other => bail!("interpreter does not support {}", other),
        }
    }
    bail!("fell off the end of the code")
}
