//! Syntax-tree scanning of TypeScript sources.
//!
//! Locates record-creation call sites on the tree-sitter TypeScript tree
//! built by ast-grep, so call-like text inside strings, template literals,
//! comments and regex literals is never treated as code.

pub mod lang;
pub mod locator;

pub use lang::{typescript, SupportLang};
pub use locator::{locate_field_lists, CallShape, FieldKey, FieldList};
