use std::collections::BTreeMap;
use std::fmt;

use crate::code::TableKind;

/// Slot bookkeeping for one addressing table.
///
/// All methods take *operands*, i.e. the value an instruction carries. A
/// table with a non-zero `offset` shares its opcode family with another
/// logical table placed before it (cell variables before free variables), so
/// operand `offset + i` addresses entry `i`.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    kind: TableKind,
    offset: usize,
    /// Entry index (without offset) -> name. Deleted slots are removed.
    entries: BTreeMap<usize, String>,
    /// Original operand -> constant-pool index the slot was promoted to.
    inlined: BTreeMap<usize, usize>,
    /// Original operand -> compacted operand for every surviving slot.
    remap: BTreeMap<usize, usize>,
}

impl SymbolTable {
    pub fn new(kind: TableKind, names: &[String], offset: usize) -> Self {
        let mut table = Self {
            kind,
            offset,
            entries: names.iter().cloned().enumerate().collect(),
            inlined: BTreeMap::new(),
            remap: BTreeMap::new(),
        };
        table.recompute_remap();
        table
    }

    #[inline]
    pub fn kind(&self) -> TableKind {
        self.kind
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    fn index_of(&self, operand: usize) -> Option<usize> {
        operand.checked_sub(self.offset)
    }

    pub fn get(&self, operand: usize) -> Option<&str> {
        let idx = self.index_of(operand)?;
        self.entries.get(&idx).map(String::as_str)
    }

    pub fn has(&self, operand: usize) -> bool {
        self.get(operand).is_some()
    }

    /// Remove the slot addressed by `operand`. The remap is stale until
    /// [`recompute_remap`](Self::recompute_remap) runs.
    pub fn delete(&mut self, operand: usize) -> Option<String> {
        let idx = self.index_of(operand)?;
        self.entries.remove(&idx)
    }

    /// Assign `offset, offset + 1, ...` to the surviving slots in ascending
    /// original order.
    pub fn recompute_remap(&mut self) {
        self.remap = self
            .entries
            .keys()
            .enumerate()
            .map(|(new_idx, &old_idx)| (old_idx + self.offset, new_idx + self.offset))
            .collect();
    }

    pub fn mark_inlined(&mut self, operand: usize, const_idx: usize) {
        self.inlined.insert(operand, const_idx);
    }

    /// Constant index recorded for `operand`, if the slot was promoted.
    pub fn inlined(&self, operand: usize) -> Option<usize> {
        self.inlined.get(&operand).copied()
    }

    pub fn inlined_slots(&self) -> &BTreeMap<usize, usize> {
        &self.inlined
    }

    /// Compacted operand for a surviving slot.
    pub fn remapped(&self, operand: usize) -> Option<usize> {
        self.remap.get(&operand).copied()
    }

    /// Surviving `(operand, name)` pairs in ascending operand order.
    pub fn slots(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.entries
            .iter()
            .map(move |(&idx, name)| (idx + self.offset, name.as_str()))
    }

    /// Surviving names in their new order.
    pub fn names(&self) -> Vec<String> {
        self.entries.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (offset {}):", self.kind, self.offset)?;
        for (operand, name) in self.slots() {
            let new = self.remapped(operand).unwrap_or(operand);
            write!(f, " {}->{}:{}", operand, new, name)?;
        }
        if !self.inlined.is_empty() {
            f.write_str(" | inlined")?;
            for (operand, k) in &self.inlined {
                write!(f, " {}=k{}", operand, k)?;
            }
        }
        Ok(())
    }
}
