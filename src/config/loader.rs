use crate::config::schema::{FixConfig, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Rule set used when no config file is given or found.
pub const BUILTIN_CONFIG: &str = include_str!("../../rules/prisma-create-ids.toml");

/// Config file picked up from the workspace root when `--config` is absent.
pub const WORKSPACE_CONFIG_NAME: &str = "fieldfix.toml";

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

impl ConfigError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            ConfigError::Io { .. } => self,
            ConfigError::Toml { path: None, source } => ConfigError::Toml {
                path: Some(path),
                source,
            },
            ConfigError::Validation { path: None, source } => ConfigError::Validation {
                path: Some(path),
                source,
            },
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(
                    f,
                    "failed to read fix config from {}: {}",
                    path.display(),
                    source
                )
            }
            ConfigError::Toml { path, source } => match path {
                Some(path) => write!(
                    f,
                    "failed to parse fix config TOML ({}): {}",
                    path.display(),
                    source
                ),
                None => write!(f, "failed to parse fix config TOML: {}", source),
            },
            ConfigError::Validation { path, source } => match path {
                Some(path) => write!(f, "invalid fix config ({}): {}", path.display(), source),
                None => write!(f, "invalid fix config: {}", source),
            },
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
        }
    }
}

pub fn load_from_str(input: &str) -> Result<FixConfig, ConfigError> {
    let config: FixConfig = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Toml { path: None, source })?;
    config
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(config)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<FixConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.with_path(path))
}

/// The built-in prisma rule set.
pub fn load_builtin() -> Result<FixConfig, ConfigError> {
    load_from_str(BUILTIN_CONFIG)
}

/// Resolve the config for a run.
///
/// Priority order:
/// 1. Explicit path
/// 2. `fieldfix.toml` in the workspace root
/// 3. Built-in rule set
pub fn resolve(explicit: Option<&Path>, workspace: &Path) -> Result<FixConfig, ConfigError> {
    if let Some(path) = explicit {
        return load_from_path(path);
    }

    let workspace_config = workspace.join(WORKSPACE_CONFIG_NAME);
    if workspace_config.is_file() {
        return load_from_path(workspace_config);
    }

    load_builtin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationIssue;

    #[test]
    fn test_builtin_config_is_valid() {
        let config = load_builtin().unwrap();
        assert_eq!(config.meta.name, "prisma-create-ids");
        assert_eq!(config.meta.clients, vec!["prisma".to_string()]);
        assert_eq!(config.rules.len(), 5);
        assert_eq!(config.select.files.len(), 9);
        assert_eq!(config.select.walk.root, "src/app/api");
        assert_eq!(config.select.walk.suffix, ".ts");

        let comment = config.rules.iter().find(|r| r.id == "comment-id").unwrap();
        let names: Vec<_> = comment.insert.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "updatedAt"]);

        let status = config
            .rules
            .iter()
            .find(|r| r.id == "status-update-id")
            .unwrap();
        assert_eq!(status.insert.len(), 1);
    }

    #[test]
    fn test_defaults_apply_to_minimal_config() {
        let config = load_from_str(
            r#"
[[rules]]
id = "r"
model = "comment"
first_fields = ["content"]

[[rules.insert]]
name = "id"
value = "crypto.randomUUID()"
"#,
        )
        .unwrap();

        assert_eq!(config.meta.method, "create");
        assert_eq!(config.meta.data_key, "data");
        assert!(config.select.files.is_empty());
        assert_eq!(config.select.walk.skip_dirs.len(), 3);
    }

    #[test]
    fn test_rejects_non_idempotent_rule() {
        let err = load_from_str(
            r#"
[[rules]]
id = "activity"
model = "activity"
first_fields = ["id", "jobId"]

[[rules.insert]]
name = "id"
value = "crypto.randomUUID()"
"#,
        )
        .unwrap_err();

        match err {
            ConfigError::Validation { source, .. } => {
                assert!(source
                    .issues
                    .iter()
                    .any(|i| matches!(i, ValidationIssue::NotIdempotent { field, .. } if field == "id")));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_rules_feeding_each_other() {
        let err = load_from_str(
            r#"
[[rules]]
id = "a"
model = "comment"
first_fields = ["content"]

[[rules.insert]]
name = "x"
value = "1"

[[rules]]
id = "b"
model = "comment"
first_fields = ["x"]

[[rules.insert]]
name = "content"
value = "2"
"#,
        )
        .unwrap_err();

        let ConfigError::Validation { source, .. } = err else {
            panic!("expected validation error");
        };
        assert_eq!(source.issues.len(), 2);
        assert!(source.issues.iter().any(|i| matches!(
            i,
            ValidationIssue::FeedsRule { rule_id, field, other_rule }
                if rule_id == "a" && field == "x" && other_rule == "b"
        )));
    }

    #[test]
    fn test_same_field_for_different_models_is_fine() {
        let config = load_from_str(
            r#"
[[rules]]
id = "a"
model = "comment"
first_fields = ["content"]

[[rules.insert]]
name = "x"
value = "1"

[[rules]]
id = "b"
model = "activity"
first_fields = ["x"]

[[rules.insert]]
name = "id"
value = "2"
"#,
        )
        .unwrap();
        assert_eq!(config.rules.len(), 2);
    }

    #[test]
    fn test_collects_every_issue() {
        let err = load_from_str(
            r#"
[meta]
clients = []

[[rules]]
id = "a"
model = "not valid"
first_fields = []

[[rules]]
id = "a"
model = "comment"
first_fields = ["content"]
"#,
        )
        .unwrap_err();

        let ConfigError::Validation { source, .. } = err else {
            panic!("expected validation error");
        };
        // clients, model, first_fields, insert (x2), duplicate id
        assert_eq!(source.issues.len(), 6);
        assert!(source.to_string().contains("defined more than once"));
    }

    #[test]
    fn test_empty_config_rejected() {
        let err = load_from_str("").unwrap_err();
        assert!(err.to_string().contains("contains no rules"));
    }

    #[test]
    fn test_resolve_prefers_workspace_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(WORKSPACE_CONFIG_NAME),
            r#"
[meta]
name = "local"

[[rules]]
id = "r"
model = "comment"
first_fields = ["content"]

[[rules.insert]]
name = "id"
value = "uuid()"
"#,
        )
        .unwrap();

        let config = resolve(None, dir.path()).unwrap();
        assert_eq!(config.meta.name, "local");

        let empty = tempfile::tempdir().unwrap();
        let config = resolve(None, empty.path()).unwrap();
        assert_eq!(config.meta.name, "prisma-create-ids");
    }

    #[test]
    fn test_load_from_path_attaches_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "rules = 3").unwrap();

        let err = load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
    }
}
