//! Bytecode-level symbol binding.
//!
//! Given a compiled [`code::Function`] and a map of names to values,
//! [`inline::bind`] produces a new function whose read-only loads of those
//! names are constant loads. Names that are also written fail with
//! [`inline::UnbindableError`].

pub mod code;
pub mod inline;
pub mod val;
