//! Sable IR - shared data types for the Sable style-sheet compiler.
//!
//! This crate holds the small value types every other compiler crate agrees on:
//! - `Name`: a binding identifier with `_`/`-` folded together
//! - `Value`: a script value as bound in the variable namespace
//! - `SelectorList`: a fully-resolved comma-separated selector
//! - `SourceLocation`: a line in a named style-sheet, used for error context
//!
//! Nothing here knows about scopes or imports; those live in `sable_eval`.

mod location;
mod name;
mod selector;
mod value;

pub use location::SourceLocation;
pub use name::Name;
pub use selector::SelectorList;
pub use value::{ListSeparator, Number, Value};
