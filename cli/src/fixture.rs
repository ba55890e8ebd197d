//! On-disk function fixtures.
//!
//! A fixture is a JSON document holding a code record plus the runtime
//! context a function is created with:
//!
//! ```json
//! { "code": { "code": [57, 0, 4, 0], "names": ["a"] },
//!   "globals": { "a": { "type": "int", "value": 1 } } }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use symbind_core::code::{ClosureCell, CodeRecord, Function, new_namespace};
use symbind_core::val::Val;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Fixture {
    pub code: CodeRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Module namespace the function is bound to.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub globals: BTreeMap<String, Val>,
    /// Cell contents, one per free variable.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub closure: Vec<Val>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub defaults: Vec<Val>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    /// Bindings of the call site, used when names are captured instead of
    /// passed explicitly.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub locals: BTreeMap<String, Val>,
}

impl Fixture {
    pub fn load(path: &Path) -> Result<Fixture> {
        let raw = fs::read_to_string(path).with_context(|| format!("failed to read fixture {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("failed to parse fixture {}", path.display()))
    }

    pub fn to_function(&self) -> Result<Function> {
        let code = self.code.clone().into_code();
        ensure!(
            self.closure.len() == code.freevars.len(),
            "fixture has {} closure cell(s) for {} free variable(s)",
            self.closure.len(),
            code.freevars.len()
        );
        let globals = new_namespace();
        for (name, value) in &self.globals {
            globals.insert(name.clone(), value.clone());
        }
        let cells = self.closure.iter().cloned().map(ClosureCell::new).collect();
        let mut func = Function::new(code, globals).with_closure(cells);
        if let Some(name) = &self.name {
            func.name = name.clone();
        }
        if let Some(doc) = &self.doc {
            func = func.with_doc(doc.clone());
        }
        func.defaults = self.defaults.clone();
        Ok(func)
    }

    /// Snapshot of `func`, keeping the call-site `locals` of `self`.
    pub fn from_function(func: &Function, locals: BTreeMap<String, Val>) -> Fixture {
        Fixture {
            code: func.code.to_record(),
            name: Some(func.name.clone()),
            globals: func
                .globals
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().clone()))
                .collect(),
            closure: func.closure.iter().map(ClosureCell::get).collect(),
            defaults: func.defaults.clone(),
            doc: func.doc.clone(),
            locals,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
