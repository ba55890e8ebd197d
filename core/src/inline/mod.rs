//! Constant inlining of read-only symbols.
//!
//! Every public entry point reduces to [`inline_function`]; see `engine` for
//! the algorithm.

mod api;
mod bindings;
mod engine;
mod error;
mod scope;
mod table;

pub use api::*;
pub use bindings::*;
pub use engine::{InlineReport, inline_function};
pub use error::UnbindableError;
pub use scope::{FuncScope, INLINE_TABLES};
pub use table::SymbolTable;

#[cfg(test)]
mod table_test;
