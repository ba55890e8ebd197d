use std::fmt;
use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::val::Val;

/// Flags carried by a compiled function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeFlags(u32);

impl CodeFlags {
    pub const NONE: CodeFlags = CodeFlags(0);
    pub const OPTIMIZED: CodeFlags = CodeFlags(1 << 0);
    pub const NEWLOCALS: CodeFlags = CodeFlags(1 << 1);
    pub const VARARGS: CodeFlags = CodeFlags(1 << 2);
    pub const VARKEYWORDS: CodeFlags = CodeFlags(1 << 3);
    pub const NESTED: CodeFlags = CodeFlags(1 << 4);
    /// No free or cell variables.
    pub const NOFREE: CodeFlags = CodeFlags(1 << 6);

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn from_bits(bits: u32) -> CodeFlags {
        CodeFlags(bits)
    }

    #[inline]
    pub const fn contains(self, other: CodeFlags) -> bool {
        (self.0 & other.0) == other.0
    }

    #[inline]
    pub fn insert(&mut self, other: CodeFlags) {
        self.0 |= other.0;
    }
}

/// Immutable compiled function: instruction stream, constant pool and the
/// symbol tables its operands address.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeObject {
    pub argcount: u32,
    pub posonlyargcount: u32,
    pub kwonlyargcount: u32,
    pub nlocals: u32,
    pub stacksize: u32,
    pub flags: CodeFlags,
    pub code: Vec<u8>,
    pub consts: Vec<Val>,
    pub names: Vec<String>,
    pub varnames: Vec<String>,
    pub freevars: Vec<String>,
    pub cellvars: Vec<String>,
    pub filename: String,
    pub name: String,
    pub firstlineno: u32,
    pub lnotab: Vec<u8>,
}

impl CodeObject {
    /// Free-variable operands start after the cell variables.
    #[inline]
    pub fn free_offset(&self) -> usize {
        self.cellvars.len()
    }

    /// Name addressed by a deref-family operand (cell variables first).
    pub fn deref_name(&self, arg: usize) -> Option<&str> {
        if arg < self.cellvars.len() {
            self.cellvars.get(arg).map(String::as_str)
        } else {
            self.freevars.get(arg - self.cellvars.len()).map(String::as_str)
        }
    }
}

/// Shared storage for one captured variable. Clones alias the same cell.
#[derive(Clone, Default)]
pub struct ClosureCell(Arc<RwLock<Val>>);

impl ClosureCell {
    pub fn new(value: Val) -> Self {
        Self(Arc::new(RwLock::new(value)))
    }

    pub fn get(&self) -> Val {
        match self.0.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set(&self, value: Val) {
        match self.0.write() {
            Ok(mut guard) => *guard = value,
            Err(poisoned) => *poisoned.into_inner() = value,
        }
    }

    /// Whether both handles refer to the same cell.
    pub fn same_cell(&self, other: &ClosureCell) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ClosureCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<cell: {}>", self.get())
    }
}

/// Global namespace a function is bound to. Shared by every function created
/// from the same module.
pub type Namespace = Arc<DashMap<String, Val>>;

pub fn new_namespace() -> Namespace {
    Arc::new(DashMap::new())
}

/// Invocable function: compiled code bound to a global namespace and the
/// closure cells of its free variables.
#[derive(Debug, Clone)]
pub struct Function {
    pub code: Arc<CodeObject>,
    pub globals: Namespace,
    pub name: String,
    pub defaults: Vec<Val>,
    /// One cell per entry of `code.freevars`, same order.
    pub closure: Vec<ClosureCell>,
    pub doc: Option<String>,
}

impl Function {
    pub fn new(code: CodeObject, globals: Namespace) -> Self {
        let name = code.name.clone();
        Self {
            code: Arc::new(code),
            globals,
            name,
            defaults: Vec::new(),
            closure: Vec::new(),
            doc: None,
        }
    }

    pub fn with_closure(mut self, closure: Vec<ClosureCell>) -> Self {
        self.closure = closure;
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// New function around `code` that keeps this function's namespace, name,
    /// defaults and doc.
    pub fn rebind(&self, code: CodeObject, closure: Vec<ClosureCell>) -> Function {
        Function {
            code: Arc::new(code),
            globals: Arc::clone(&self.globals),
            name: self.name.clone(),
            defaults: self.defaults.clone(),
            closure,
            doc: self.doc.clone(),
        }
    }
}
