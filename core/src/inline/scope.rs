use std::fmt;

use crate::code::{CodeObject, CodeRecord, Opcode, TableKind, table_of};

use super::table::SymbolTable;

/// Tables the engine rewrites, in processing order. Locals are left out:
/// they are assigned by the function body itself and never bindable from
/// outside.
pub const INLINE_TABLES: &[TableKind] = &[TableKind::Free, TableKind::Names];

/// The symbol tables of one code object that take part in inlining.
#[derive(Debug, Clone)]
pub struct FuncScope {
    tables: Vec<SymbolTable>,
}

impl FuncScope {
    pub fn new(code: &CodeObject) -> Self {
        Self::with_tables(code, INLINE_TABLES)
    }

    /// Scope over an explicit table list, e.g. to inspect `varnames` too.
    pub fn with_tables(code: &CodeObject, kinds: &[TableKind]) -> Self {
        let tables = kinds
            .iter()
            .map(|&kind| match kind {
                TableKind::Locals => SymbolTable::new(kind, &code.varnames, 0),
                TableKind::Free => SymbolTable::new(kind, &code.freevars, code.free_offset()),
                TableKind::Names => SymbolTable::new(kind, &code.names, 0),
            })
            .collect();
        Self { tables }
    }

    pub fn table(&self, kind: TableKind) -> Option<&SymbolTable> {
        self.tables.iter().find(|t| t.kind() == kind)
    }

    pub fn table_mut(&mut self, kind: TableKind) -> Option<&mut SymbolTable> {
        self.tables.iter_mut().find(|t| t.kind() == kind)
    }

    /// Table addressed by `op`, if it is one the engine manages.
    pub fn table_for(&self, op: Opcode) -> Option<&SymbolTable> {
        table_of(op).and_then(|kind| self.table(kind))
    }

    pub fn tables(&self) -> impl Iterator<Item = &SymbolTable> {
        self.tables.iter()
    }

    pub(crate) fn tables_mut(&mut self) -> impl Iterator<Item = &mut SymbolTable> {
        self.tables.iter_mut()
    }

    /// Overrides carrying the surviving names of every managed table.
    pub fn table_overrides(&self) -> CodeRecord {
        let mut record = CodeRecord::default();
        for table in &self.tables {
            let names = Some(table.names());
            match table.kind() {
                TableKind::Locals => record.varnames = names,
                TableKind::Free => record.freevars = names,
                TableKind::Names => record.names = names,
            }
        }
        record
    }
}

impl fmt::Display for FuncScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for table in &self.tables {
            writeln!(f, "{}", table)?;
        }
        Ok(())
    }
}
