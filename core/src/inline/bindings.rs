//! Substitution maps and their implicit acquisition.
//!
//! When no map is passed explicitly, bindings are captured from a
//! [`BindingSource`] supplied by the caller. The engine never inspects a call
//! stack on its own.

use once_cell::sync::Lazy;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::code::Namespace;
use crate::val::Val;

/// Name -> value map driving one inlining call.
pub type Substitutions = FxHashMap<String, Val>;

/// Metadata attribute names present on every function object. Captured
/// bindings with these names are dropped so they cannot shadow them.
pub static RESERVED_NAMES: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "__annotations__",
        "__call__",
        "__class__",
        "__closure__",
        "__code__",
        "__defaults__",
        "__delattr__",
        "__dict__",
        "__dir__",
        "__doc__",
        "__eq__",
        "__format__",
        "__get__",
        "__getattribute__",
        "__globals__",
        "__hash__",
        "__init__",
        "__kwdefaults__",
        "__module__",
        "__name__",
        "__ne__",
        "__new__",
        "__qualname__",
        "__repr__",
        "__setattr__",
        "__sizeof__",
        "__str__",
    ]
    .into_iter()
    .collect()
});

#[inline]
pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(name)
}

/// Which bindings an implicit capture collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureScope {
    /// Only the caller's local bindings.
    #[default]
    Locals,
    /// The caller's module bindings, overridden by its locals.
    LocalsAndModule,
}

/// Something that can report the bindings visible at a call site.
pub trait BindingSource {
    fn local_bindings(&self) -> Vec<(String, Val)>;

    fn module_bindings(&self) -> Vec<(String, Val)> {
        Vec::new()
    }
}

impl BindingSource for Namespace {
    fn local_bindings(&self) -> Vec<(String, Val)> {
        self.iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    fn module_bindings(&self) -> Vec<(String, Val)> {
        self.local_bindings()
    }
}

/// Explicit snapshot of a call site: its locals and, optionally, the module
/// namespace it runs in.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    locals: Vec<(String, Val)>,
    module: Option<Namespace>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_local(mut self, name: impl Into<String>, value: Val) -> Self {
        self.locals.push((name.into(), value));
        self
    }

    pub fn with_module(mut self, module: Namespace) -> Self {
        self.module = Some(module);
        self
    }
}

impl BindingSource for Frame {
    fn local_bindings(&self) -> Vec<(String, Val)> {
        self.locals.clone()
    }

    fn module_bindings(&self) -> Vec<(String, Val)> {
        self.module.as_ref().map(|m| m.local_bindings()).unwrap_or_default()
    }
}

/// Collect a substitution map from `source`, skipping reserved names.
pub fn capture(source: &dyn BindingSource, scope: CaptureScope) -> Substitutions {
    let mut subs = Substitutions::default();
    if scope == CaptureScope::LocalsAndModule {
        subs.extend(source.module_bindings());
    }
    subs.extend(source.local_bindings());
    subs.retain(|name, _| !is_reserved(name));
    subs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::new_namespace;

    #[test]
    fn test_capture_locals_only_by_default() {
        let module = new_namespace();
        module.insert("g".to_string(), Val::Int(1));
        let frame = Frame::new().with_local("a", Val::Int(2)).with_module(module);
        let subs = capture(&frame, CaptureScope::default());
        assert_eq!(subs.len(), 1);
        assert_eq!(subs.get("a"), Some(&Val::Int(2)));
    }

    #[test]
    fn test_locals_override_module_bindings() {
        let module = new_namespace();
        module.insert("a".to_string(), Val::Int(1));
        module.insert("b".to_string(), Val::Int(3));
        let frame = Frame::new().with_local("a", Val::Int(2)).with_module(module);
        let subs = capture(&frame, CaptureScope::LocalsAndModule);
        assert_eq!(subs.get("a"), Some(&Val::Int(2)));
        assert_eq!(subs.get("b"), Some(&Val::Int(3)));
    }

    #[test]
    fn test_reserved_names_are_dropped() {
        let frame = Frame::new()
            .with_local("__name__", Val::str("mod"))
            .with_local("__doc__", Val::Nil)
            .with_local("name", Val::Int(1));
        let subs = capture(&frame, CaptureScope::Locals);
        assert_eq!(subs.len(), 1);
        assert!(subs.contains_key("name"));
    }

    #[test]
    fn test_namespace_is_a_binding_source() {
        let ns = new_namespace();
        ns.insert("x".to_string(), Val::Int(5));
        ns.insert("__module__".to_string(), Val::str("m"));
        let subs = capture(&ns, CaptureScope::LocalsAndModule);
        assert_eq!(subs.len(), 1);
        assert_eq!(subs.get("x"), Some(&Val::Int(5)));
    }
}
