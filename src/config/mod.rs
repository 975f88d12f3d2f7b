pub mod loader;
pub mod schema;

pub use loader::{
    load_builtin, load_from_path, load_from_str, resolve, ConfigError, BUILTIN_CONFIG,
    WORKSPACE_CONFIG_NAME,
};
pub use schema::{
    FieldSpec, FixConfig, Metadata, RuleDefinition, Selection, ValidationError, ValidationIssue,
    WalkSelection,
};
