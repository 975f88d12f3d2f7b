//! Fieldfix: idempotent field insertion for record-creation call sites
//!
//! Scans TypeScript sources for calls such as
//! `prisma.comment.create({ data: { content, ... } })` and inserts missing
//! fields (a generated id, and for some record kinds an `updatedAt`
//! timestamp) at the start of the field list.
//!
//! # Architecture
//!
//! - [`select`] chooses candidate files (a fixed list or a directory walk)
//! - [`scan`] parses each file with the TypeScript grammar and locates
//!   field-list openings
//! - [`engine`] turns matches into [`edit::TextEdit`]s, rule by rule
//! - [`run`] reads, patches and atomically writes each file, collecting a
//!   per-file outcome
//! - [`report`] prints the outcome of each file and a summary
//!
//! Inserted values are source text (`crypto.randomUUID()`, `new Date()`) that
//! the patched program evaluates when it creates a record.
//!
//! # Idempotence
//!
//! A rule matches only when the field list opens with one of its listed
//! first fields. Inserted fields are never first fields of any rule for the
//! same model (enforced when the config is validated), so a second run finds
//! nothing to do.
//!
//! # Example
//!
//! ```
//! use fieldfix::{load_builtin, PatchEngine};
//!
//! let engine = PatchEngine::new(&load_builtin().unwrap()).unwrap();
//! let out = engine
//!     .apply("await prisma.department.create({ data: { name } })")
//!     .unwrap();
//!
//! assert!(out.changed);
//! assert_eq!(
//!     out.text,
//!     "await prisma.department.create({ data: { id: crypto.randomUUID(), updatedAt: new Date(), name } })"
//! );
//! ```

pub mod config;
pub mod edit;
pub mod engine;
pub mod report;
pub mod run;
pub mod safety;
pub mod scan;
pub mod select;

// Re-exports
pub use config::{
    load_builtin, load_from_path, load_from_str, ConfigError, FieldSpec, FixConfig,
    RuleDefinition,
};
pub use edit::{apply_edits, atomic_write, EditError, TextEdit};
pub use engine::{EngineError, Insertion, PatchEngine, PatchOutcome};
pub use run::{FileOutcome, FileReport, RunReport, Runner};
pub use safety::{SafetyError, WorkspaceGuard};
pub use select::{Candidate, FileSelector};
