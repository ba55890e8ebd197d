//! Compiled-function rebuilding from partial records.
//!
//! A [`CodeRecord`] is a `CodeObject` where every field may be missing. It is
//! used both for overrides ("replace only these fields") and as the lenient
//! serialized form, which may come from producers that do not emit every
//! field. [`build`] layers an override record over a base record and fills
//! whatever neither provides with a neutral default.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::function::{CodeFlags, CodeObject};
use crate::val::Val;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub argcount: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posonlyargcount: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kwonlyargcount: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nlocals: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stacksize: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<CodeFlags>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consts: Option<Vec<Val>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub names: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub varnames: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freevars: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cellvars: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firstlineno: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lnotab: Option<Vec<u8>>,
}

fn pick<T: Clone + Default>(field: &str, over: &Option<T>, base: &Option<T>) -> T {
    match over.as_ref().or(base.as_ref()) {
        Some(value) => value.clone(),
        None => {
            debug!(code_field = field, "code field missing from record; using neutral default");
            T::default()
        }
    }
}

/// Build a `CodeObject` from `base` with every field present in `overrides`
/// replaced. Neither input is modified.
pub fn build(base: &CodeRecord, overrides: &CodeRecord) -> CodeObject {
    CodeObject {
        argcount: pick("argcount", &overrides.argcount, &base.argcount),
        posonlyargcount: pick("posonlyargcount", &overrides.posonlyargcount, &base.posonlyargcount),
        kwonlyargcount: pick("kwonlyargcount", &overrides.kwonlyargcount, &base.kwonlyargcount),
        nlocals: pick("nlocals", &overrides.nlocals, &base.nlocals),
        stacksize: pick("stacksize", &overrides.stacksize, &base.stacksize),
        flags: pick("flags", &overrides.flags, &base.flags),
        code: pick("code", &overrides.code, &base.code),
        consts: pick("consts", &overrides.consts, &base.consts),
        names: pick("names", &overrides.names, &base.names),
        varnames: pick("varnames", &overrides.varnames, &base.varnames),
        freevars: pick("freevars", &overrides.freevars, &base.freevars),
        cellvars: pick("cellvars", &overrides.cellvars, &base.cellvars),
        filename: pick("filename", &overrides.filename, &base.filename),
        name: pick("name", &overrides.name, &base.name),
        firstlineno: pick("firstlineno", &overrides.firstlineno, &base.firstlineno),
        lnotab: pick("lnotab", &overrides.lnotab, &base.lnotab),
    }
}

impl CodeRecord {
    /// Materialize the record, defaulting every missing field.
    pub fn into_code(self) -> CodeObject {
        build(&self, &CodeRecord::default())
    }
}

impl CodeObject {
    pub fn to_record(&self) -> CodeRecord {
        CodeRecord {
            argcount: Some(self.argcount),
            posonlyargcount: Some(self.posonlyargcount),
            kwonlyargcount: Some(self.kwonlyargcount),
            nlocals: Some(self.nlocals),
            stacksize: Some(self.stacksize),
            flags: Some(self.flags),
            code: Some(self.code.clone()),
            consts: Some(self.consts.clone()),
            names: Some(self.names.clone()),
            varnames: Some(self.varnames.clone()),
            freevars: Some(self.freevars.clone()),
            cellvars: Some(self.cellvars.clone()),
            filename: Some(self.filename.clone()),
            name: Some(self.name.clone()),
            firstlineno: Some(self.firstlineno),
            lnotab: Some(self.lnotab.clone()),
        }
    }

    /// Copy of this code object with the fields of `overrides` replaced.
    pub fn patched(&self, overrides: &CodeRecord) -> CodeObject {
        build(&self.to_record(), overrides)
    }
}
