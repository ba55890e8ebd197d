use anyhow::Result;

use crate::code::Function;
use crate::val::Val;

use super::bindings::{BindingSource, CaptureScope, Substitutions, capture};
use super::engine::{InlineReport, inline_function};

/// Inline the names of `subs` into `func`.
///
/// ```
/// use symbind_core::code::{CodeRecord, Function, Opcode, assemble, new_namespace};
/// use symbind_core::inline::{bind, substitutions};
///
/// // return a
/// let code = CodeRecord {
///     code: Some(assemble(&[(Opcode::LoadGlobal, 0), (Opcode::ReturnValue, 0)])),
///     names: Some(vec!["a".to_string()]),
///     ..CodeRecord::default()
/// }
/// .into_code();
/// let f = Function::new(code, new_namespace());
///
/// let g = bind(&f, &substitutions([("a", 7i64)]))?;
/// assert!(g.code.names.is_empty());
/// assert_eq!(g.code.consts, vec![7i64.into()]);
/// assert_eq!(g.code.code, assemble(&[(Opcode::LoadConst, 0), (Opcode::ReturnValue, 0)]));
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn bind(func: &Function, subs: &Substitutions) -> Result<Function> {
    Ok(inline_function(func, subs)?.function)
}

/// Keyword-style form: substitutions given as `(name, value)` pairs.
pub fn bind_pairs<I, K, V>(func: &Function, pairs: I) -> Result<Function>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Val>,
{
    bind(func, &substitutions(pairs))
}

/// Implicit form: substitutions are captured from the caller's bindings.
pub fn bind_captured(func: &Function, source: &dyn BindingSource, scope: CaptureScope) -> Result<Function> {
    bind(func, &capture(source, scope))
}

/// Like [`bind`], but also returns the rebuilt tables and patched bytes.
pub fn bind_with_report(func: &Function, subs: &Substitutions) -> Result<InlineReport> {
    inline_function(func, subs)
}

pub fn substitutions<I, K, V>(pairs: I) -> Substitutions
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Val>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}

/// A substitution map waiting for the function(s) to apply it to.
#[derive(Debug, Clone, Default)]
pub struct Binder {
    subs: Substitutions,
}

impl Binder {
    pub fn new(subs: Substitutions) -> Self {
        Self { subs }
    }

    pub fn substitutions(&self) -> &Substitutions {
        &self.subs
    }

    pub fn apply(&self, func: &Function) -> Result<Function> {
        bind(func, &self.subs)
    }
}

/// Wrap form: `binder(subs).apply(&f)`.
pub fn binder(subs: Substitutions) -> Binder {
    Binder::new(subs)
}
