use std::fmt;

use crate::code::{OpClass, Opcode, TableKind};

/// A symbol scheduled for constant substitution is used by an instruction
/// that is not a plain load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnbindableError {
    pub symbol: String,
    pub table: TableKind,
    pub class: OpClass,
    pub opcode: Opcode,
    /// Byte offset of the offending instruction.
    pub offset: usize,
}

impl fmt::Display for UnbindableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "inlined variable `{}` (from table `{}`) was touched in a way other than load ({} / {} at offset {})",
            self.symbol, self.table, self.class, self.opcode, self.offset
        )
    }
}

impl std::error::Error for UnbindableError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbindable_display_names_symbol_table_and_class() {
        let err = UnbindableError {
            symbol: "alpha".to_string(),
            table: TableKind::Names,
            class: OpClass::GlobalStore,
            opcode: Opcode::StoreGlobal,
            offset: 6,
        };
        let text = err.to_string();
        assert!(text.contains("`alpha`"));
        assert!(text.contains("`names`"));
        assert!(text.contains("global-store"));
        assert!(text.contains("STORE_GLOBAL"));
    }
}
