//! Three-pass constant inlining over a decoded instruction stream.
//!
//! 1. Discovery: every table-addressing instruction contributes its class to
//!    the touch set of the `(table, name)` it addresses. Names present in the
//!    substitution map and touched as variables become candidates.
//! 2. Elision: each candidate slot gets its value appended to the constant
//!    pool. The slot is deleted from its table unless an attribute
//!    instruction still needs it for addressing; deleted free slots also drop
//!    their closure cell. Each table then recomputes its remap.
//! 3. Rewrite: the original instruction list is walked again. Loads of
//!    promoted slots become `LOAD_CONST`, surviving slots are remapped, and
//!    any other use of a promoted slot aborts with [`UnbindableError`].

use std::collections::BTreeMap;

use anyhow::Result;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::code::{
    ClosureCell, CodeFlags, CodeObject, Function, Instr, OpClass, Opcode, TableKind, decode, encode_into,
};

use super::bindings::Substitutions;
use super::error::UnbindableError;
use super::scope::FuncScope;

/// Everything produced by one inlining call, for callers that want to
/// inspect the rewrite.
#[derive(Debug, Clone)]
pub struct InlineReport {
    /// Tables after elision, with their inlined slots and remaps.
    pub scope: FuncScope,
    /// Patched instruction stream.
    pub code: Vec<u8>,
    pub function: Function,
}

type TouchSets = FxHashMap<(TableKind, String), FxHashSet<OpClass>>;

fn collect_touches(instrs: &[Instr], scope: &FuncScope) -> TouchSets {
    let mut touches = TouchSets::default();
    for instr in instrs {
        let Some(table) = scope.table_for(instr.opcode) else {
            continue;
        };
        if let Some(name) = table.get(instr.arg as usize) {
            touches
                .entry((table.kind(), name.to_string()))
                .or_default()
                .insert(instr.class());
        }
    }
    touches
}

fn original_name(code: &CodeObject, kind: TableKind, operand: usize) -> String {
    let name = match kind {
        TableKind::Locals => code.varnames.get(operand).map(String::as_str),
        TableKind::Free => code.deref_name(operand),
        TableKind::Names => code.names.get(operand).map(String::as_str),
    };
    name.unwrap_or("<unknown>").to_string()
}

/// Inline every read-only occurrence of the names in `inlines` into a new
/// function. `func` itself is left untouched.
pub fn inline_function(func: &Function, inlines: &Substitutions) -> Result<InlineReport> {
    let code = func.code.as_ref();
    let instrs = decode(&code.code)?;
    let mut scope = FuncScope::new(code);

    // Pass 1: candidates are substitutable names used as variables; a name
    // only ever used as an attribute name is not a reference to the variable.
    let candidates: TouchSets = collect_touches(&instrs, &scope)
        .into_iter()
        .filter(|((_, name), classes)| {
            inlines.contains_key(name) && classes.iter().any(|class| !class.is_attribute())
        })
        .collect();
    debug!(
        function = %code.name,
        candidates = candidates.len(),
        "collected inline candidates"
    );

    // Pass 2
    let mut consts = code.consts.clone();
    let mut closure: BTreeMap<usize, ClosureCell> = func.closure.iter().cloned().enumerate().collect();
    let mut removed_free = 0usize;
    for table in scope.tables_mut() {
        let kind = table.kind();
        let chosen: Vec<(usize, String)> = table
            .slots()
            .filter(|(_, name)| candidates.contains_key(&(kind, name.to_string())))
            .map(|(operand, name)| (operand, name.to_string()))
            .collect();
        for (operand, name) in chosen {
            let Some(value) = inlines.get(&name) else {
                continue;
            };
            let keep_for_attributes = kind.hosts_attributes()
                && candidates
                    .get(&(kind, name.clone()))
                    .is_some_and(|classes| classes.iter().any(|class| class.is_attribute()));
            if !keep_for_attributes {
                table.delete(operand);
                if kind == TableKind::Free {
                    closure.remove(&(operand - table.offset()));
                    removed_free += 1;
                }
            }
            table.mark_inlined(operand, consts.len());
            debug!(
                symbol = %name,
                table = %kind,
                operand = operand,
                const_idx = consts.len(),
                kept = keep_for_attributes,
                "promoted slot to constant"
            );
            consts.push(value.clone());
        }
        table.recompute_remap();
    }

    // Pass 3
    let mut bytes = code.code.clone();
    for instr in &instrs {
        let Some(table) = scope.table_for(instr.opcode) else {
            continue;
        };
        let class = instr.class();
        let operand = instr.arg as usize;
        let (opcode, arg) = match table.inlined(operand) {
            Some(const_idx) if class.is_load() => (Opcode::LoadConst, const_idx),
            Some(_) => match table.remapped(operand) {
                Some(new) if class.is_attribute() => (instr.opcode, new),
                _ => {
                    return Err(UnbindableError {
                        symbol: original_name(code, table.kind(), operand),
                        table: table.kind(),
                        class,
                        opcode: instr.opcode,
                        offset: instr.offset,
                    }
                    .into());
                }
            },
            None => match table.remapped(operand) {
                Some(new) => (instr.opcode, new),
                None => continue,
            },
        };
        if opcode != instr.opcode || arg != operand {
            trace!(
                offset = instr.offset,
                from = %instr.opcode,
                from_arg = operand,
                to = %opcode,
                to_arg = arg,
                "rewrote instruction"
            );
            encode_into(&mut bytes, instr.offset, opcode, arg)?;
        }
    }

    let mut overrides = scope.table_overrides();
    overrides.code = Some(bytes.clone());
    overrides.consts = Some(consts);
    if removed_free > 0 && code.cellvars.is_empty() && scope.table(TableKind::Free).is_some_and(|t| t.is_empty()) {
        let mut flags = code.flags;
        flags.insert(CodeFlags::NOFREE);
        overrides.flags = Some(flags);
    }
    let function = func.rebind(code.patched(&overrides), closure.into_values().collect());

    Ok(InlineReport {
        scope,
        code: bytes,
        function,
    })
}
