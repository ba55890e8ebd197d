//! Opcode set and instruction classification.
//!
//! Raw opcode bytes only appear in this module and in the codec. Everything
//! past the decoder matches on [`OpClass`] and [`TableKind`].

use std::fmt;

use once_cell::sync::Lazy;

macro_rules! opcodes {
    ($($variant:ident = $byte:literal => $mnemonic:literal, $class:ident;)*) => {
        /// Stack-machine opcodes. Every instruction is one opcode byte followed
        /// by one operand byte.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum Opcode {
            $($variant = $byte,)*
        }

        impl Opcode {
            pub const ALL: &'static [Opcode] = &[$(Opcode::$variant,)*];

            #[inline]
            pub fn from_byte(byte: u8) -> Option<Opcode> {
                match byte {
                    $($byte => Some(Opcode::$variant),)*
                    _ => None,
                }
            }

            pub fn mnemonic(self) -> &'static str {
                match self {
                    $(Opcode::$variant => $mnemonic,)*
                }
            }

            pub fn class(self) -> OpClass {
                match self {
                    $(Opcode::$variant => OpClass::$class,)*
                }
            }
        }
    };
}

opcodes! {
    Nop = 0x00 => "NOP", Other;
    PopTop = 0x01 => "POP_TOP", Other;
    RotTwo = 0x02 => "ROT_TWO", Other;
    DupTop = 0x03 => "DUP_TOP", Other;
    ReturnValue = 0x04 => "RETURN_VALUE", Other;
    BinaryAdd = 0x10 => "BINARY_ADD", Other;
    BinarySubtract = 0x11 => "BINARY_SUBTRACT", Other;
    BinaryMultiply = 0x12 => "BINARY_MULTIPLY", Other;
    BinarySubscr = 0x13 => "BINARY_SUBSCR", Other;
    InplaceAdd = 0x14 => "INPLACE_ADD", Other;
    CompareOp = 0x15 => "COMPARE_OP", Other;
    BuildTuple = 0x20 => "BUILD_TUPLE", Other;
    BuildList = 0x21 => "BUILD_LIST", Other;
    GetIter = 0x22 => "GET_ITER", Other;
    ForIter = 0x23 => "FOR_ITER", Other;
    JumpForward = 0x24 => "JUMP_FORWARD", Other;
    JumpAbsolute = 0x25 => "JUMP_ABSOLUTE", Other;
    PopJumpIfFalse = 0x26 => "POP_JUMP_IF_FALSE", Other;
    PopJumpIfTrue = 0x27 => "POP_JUMP_IF_TRUE", Other;
    CallFunction = 0x28 => "CALL_FUNCTION", Other;
    MakeFunction = 0x29 => "MAKE_FUNCTION", Other;
    LoadConst = 0x30 => "LOAD_CONST", ConstLoad;
    LoadFast = 0x31 => "LOAD_FAST", LocalLoad;
    StoreFast = 0x32 => "STORE_FAST", LocalStore;
    DeleteFast = 0x33 => "DELETE_FAST", LocalStore;
    LoadDeref = 0x34 => "LOAD_DEREF", FreeLoad;
    StoreDeref = 0x35 => "STORE_DEREF", FreeStore;
    DeleteDeref = 0x36 => "DELETE_DEREF", FreeStore;
    LoadClosure = 0x37 => "LOAD_CLOSURE", FreeCapture;
    LoadClassDeref = 0x38 => "LOAD_CLASSDEREF", FreeLoad;
    LoadGlobal = 0x39 => "LOAD_GLOBAL", GlobalLoad;
    StoreGlobal = 0x3A => "STORE_GLOBAL", GlobalStore;
    DeleteGlobal = 0x3B => "DELETE_GLOBAL", GlobalStore;
    LoadName = 0x3C => "LOAD_NAME", NameLoad;
    StoreName = 0x3D => "STORE_NAME", NameStore;
    DeleteName = 0x3E => "DELETE_NAME", NameStore;
    LoadAttr = 0x3F => "LOAD_ATTR", AttrLoad;
    StoreAttr = 0x40 => "STORE_ATTR", AttrStore;
    DeleteAttr = 0x41 => "DELETE_ATTR", AttrStore;
    ExtendedArg = 0x90 => "EXTENDED_ARG", Other;
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// What an instruction does with the slot its operand addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OpClass {
    LocalLoad,
    LocalStore,
    FreeLoad,
    FreeStore,
    /// Pushes the closure cell itself (to build a nested closure), not its value.
    FreeCapture,
    GlobalLoad,
    GlobalStore,
    NameLoad,
    NameStore,
    AttrLoad,
    AttrStore,
    ConstLoad,
    Other,
}

impl OpClass {
    /// Classes that read a variable's value and can be replaced by a constant load.
    #[inline]
    pub fn is_load(self) -> bool {
        matches!(
            self,
            OpClass::LocalLoad | OpClass::FreeLoad | OpClass::GlobalLoad | OpClass::NameLoad
        )
    }

    /// Classes that use a `names` entry as an attribute name rather than a variable.
    #[inline]
    pub fn is_attribute(self) -> bool {
        matches!(self, OpClass::AttrLoad | OpClass::AttrStore)
    }

    /// Symbol table addressed by the operand, if any.
    pub fn table(self) -> Option<TableKind> {
        match self {
            OpClass::LocalLoad | OpClass::LocalStore => Some(TableKind::Locals),
            OpClass::FreeLoad | OpClass::FreeStore | OpClass::FreeCapture => Some(TableKind::Free),
            OpClass::GlobalLoad
            | OpClass::GlobalStore
            | OpClass::NameLoad
            | OpClass::NameStore
            | OpClass::AttrLoad
            | OpClass::AttrStore => Some(TableKind::Names),
            OpClass::ConstLoad | OpClass::Other => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OpClass::LocalLoad => "local-load",
            OpClass::LocalStore => "local-store",
            OpClass::FreeLoad => "free-load",
            OpClass::FreeStore => "free-store",
            OpClass::FreeCapture => "free-capture",
            OpClass::GlobalLoad => "global-load",
            OpClass::GlobalStore => "global-store",
            OpClass::NameLoad => "name-load",
            OpClass::NameStore => "name-store",
            OpClass::AttrLoad => "attribute-load",
            OpClass::AttrStore => "attribute-store",
            OpClass::ConstLoad => "constant-load",
            OpClass::Other => "other",
        }
    }
}

impl fmt::Display for OpClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Physical addressing tables of a compiled function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TableKind {
    /// `varnames`
    Locals,
    /// `cellvars` followed by `freevars`; only the free part is a symbol table.
    Free,
    /// `names`: globals, dynamic names and attribute names.
    Names,
}

impl TableKind {
    pub fn field_name(self) -> &'static str {
        match self {
            TableKind::Locals => "varnames",
            TableKind::Free => "freevars",
            TableKind::Names => "names",
        }
    }

    /// Whether attribute classes address this table.
    pub fn hosts_attributes(self) -> bool {
        matches!(self, TableKind::Names)
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

static TABLE_BY_OPCODE: Lazy<[Option<TableKind>; 256]> = Lazy::new(|| {
    let mut table = [None; 256];
    for &op in Opcode::ALL {
        table[op as usize] = op.class().table();
    }
    table
});

/// Table addressed by `op`, from the lookup built once on first use.
#[inline]
pub fn table_of(op: Opcode) -> Option<TableKind> {
    TABLE_BY_OPCODE[op as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_byte_round_trips_every_opcode() {
        for &op in Opcode::ALL {
            assert_eq!(Opcode::from_byte(op as u8), Some(op), "{}", op);
        }
        assert_eq!(Opcode::from_byte(0xFF), None);
    }

    #[test]
    fn test_table_lookup_matches_class() {
        assert_eq!(table_of(Opcode::LoadDeref), Some(TableKind::Free));
        assert_eq!(table_of(Opcode::LoadClosure), Some(TableKind::Free));
        assert_eq!(table_of(Opcode::LoadAttr), Some(TableKind::Names));
        assert_eq!(table_of(Opcode::StoreFast), Some(TableKind::Locals));
        assert_eq!(table_of(Opcode::LoadConst), None);
        assert_eq!(table_of(Opcode::BinaryAdd), None);
    }

    #[test]
    fn test_load_classes() {
        assert!(Opcode::LoadGlobal.class().is_load());
        assert!(Opcode::LoadName.class().is_load());
        assert!(Opcode::LoadClassDeref.class().is_load());
        assert!(!Opcode::LoadClosure.class().is_load());
        assert!(!Opcode::LoadAttr.class().is_load());
        assert!(!Opcode::DeleteGlobal.class().is_load());
        assert!(Opcode::DeleteAttr.class().is_attribute());
    }
}
