use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct FixConfig {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub select: Selection,
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

impl FixConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.rules.is_empty() {
            issues.push(ValidationIssue::EmptyRuleList);
        }

        if self.meta.clients.is_empty() {
            issues.push(ValidationIssue::MissingField {
                rule_id: None,
                field: "meta.clients",
            });
        }
        for client in &self.meta.clients {
            if !is_identifier(client) {
                issues.push(ValidationIssue::InvalidIdentifier {
                    rule_id: None,
                    field: "meta.clients",
                    value: client.clone(),
                });
            }
        }
        if !is_identifier(&self.meta.method) {
            issues.push(ValidationIssue::InvalidIdentifier {
                rule_id: None,
                field: "meta.method",
                value: self.meta.method.clone(),
            });
        }
        if !is_identifier(&self.meta.data_key) {
            issues.push(ValidationIssue::InvalidIdentifier {
                rule_id: None,
                field: "meta.data_key",
                value: self.meta.data_key.clone(),
            });
        }

        if self.select.walk.suffix.trim().is_empty() {
            issues.push(ValidationIssue::MissingField {
                rule_id: None,
                field: "select.walk.suffix",
            });
        }

        let mut seen_ids = HashSet::new();
        for rule in &self.rules {
            if rule.id.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    rule_id: None,
                    field: "id",
                });
            } else if !seen_ids.insert(rule.id.as_str()) {
                issues.push(ValidationIssue::DuplicateRule {
                    rule_id: rule.id.clone(),
                });
            }

            if !is_identifier(&rule.model) {
                issues.push(ValidationIssue::InvalidIdentifier {
                    rule_id: Some(rule.id.clone()),
                    field: "model",
                    value: rule.model.clone(),
                });
            }

            if rule.first_fields.is_empty() {
                issues.push(ValidationIssue::MissingField {
                    rule_id: Some(rule.id.clone()),
                    field: "first_fields",
                });
            }
            for field in &rule.first_fields {
                if !is_identifier(field) {
                    issues.push(ValidationIssue::InvalidIdentifier {
                        rule_id: Some(rule.id.clone()),
                        field: "first_fields",
                        value: field.clone(),
                    });
                }
            }

            if rule.insert.is_empty() {
                issues.push(ValidationIssue::MissingField {
                    rule_id: Some(rule.id.clone()),
                    field: "insert",
                });
            }
            for spec in &rule.insert {
                if !is_identifier(&spec.name) {
                    issues.push(ValidationIssue::InvalidIdentifier {
                        rule_id: Some(rule.id.clone()),
                        field: "insert.name",
                        value: spec.name.clone(),
                    });
                }
                if spec.value.trim().is_empty() {
                    issues.push(ValidationIssue::MissingField {
                        rule_id: Some(rule.id.clone()),
                        field: "insert.value",
                    });
                }
                // An inserted field that is also an accepted first field would
                // re-match on the next run and be inserted again.
                if rule.first_fields.iter().any(|f| f == &spec.name) {
                    issues.push(ValidationIssue::NotIdempotent {
                        rule_id: rule.id.clone(),
                        field: spec.name.clone(),
                    });
                }
            }
        }

        // Rules for one model chain into each other when one inserts a field
        // that another accepts as first field.
        for (idx, rule) in self.rules.iter().enumerate() {
            for (other_idx, other) in self.rules.iter().enumerate() {
                if idx == other_idx || other.model != rule.model {
                    continue;
                }
                for spec in &rule.insert {
                    if other.first_fields.iter().any(|f| f == &spec.name) {
                        issues.push(ValidationIssue::FeedsRule {
                            rule_id: rule.id.clone(),
                            field: spec.name.clone(),
                            other_rule: other.id.clone(),
                        });
                    }
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Receiver identifiers of the data-access client (`prisma`, `tx`, ...)
    #[serde(default = "default_clients")]
    pub clients: Vec<String>,
    /// Name of the record-creation method
    #[serde(default = "default_method")]
    pub method: String,
    /// Property of the call argument holding the field list
    #[serde(default = "default_data_key")]
    pub data_key: String,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: None,
            clients: default_clients(),
            method: default_method(),
            data_key: default_data_key(),
        }
    }
}

fn default_clients() -> Vec<String> {
    vec!["prisma".to_string()]
}

fn default_method() -> String {
    "create".to_string()
}

fn default_data_key() -> String {
    "data".to_string()
}

/// Which files a run looks at.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Selection {
    /// Workspace-relative paths for `list` mode, processed in this order
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub walk: WalkSelection,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WalkSelection {
    #[serde(default = "default_walk_root")]
    pub root: String,
    #[serde(default = "default_suffix")]
    pub suffix: String,
    #[serde(default = "default_skip_dirs")]
    pub skip_dirs: Vec<String>,
}

impl Default for WalkSelection {
    fn default() -> Self {
        Self {
            root: default_walk_root(),
            suffix: default_suffix(),
            skip_dirs: default_skip_dirs(),
        }
    }
}

fn default_walk_root() -> String {
    "src/app/api".to_string()
}

fn default_suffix() -> String {
    ".ts".to_string()
}

fn default_skip_dirs() -> Vec<String> {
    vec![
        "node_modules".to_string(),
        ".git".to_string(),
        ".next".to_string(),
    ]
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct RuleDefinition {
    pub id: String,
    /// Record kind, the middle segment of `prisma.<model>.create`
    pub model: String,
    /// Field names that may open the original field list
    pub first_fields: Vec<String>,
    /// Fields to insert, in order, ahead of the first field
    #[serde(default)]
    pub insert: Vec<FieldSpec>,
}

/// A synthesized field. `value` is target-language source text evaluated by
/// the patched program, not by the patcher.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub value: String,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

fn is_identifier(text: &str) -> bool {
    static IDENT: OnceLock<Regex> = OnceLock::new();
    IDENT
        .get_or_init(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("static regex"))
        .is_match(text)
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    EmptyRuleList,
    MissingField {
        rule_id: Option<String>,
        field: &'static str,
    },
    InvalidIdentifier {
        rule_id: Option<String>,
        field: &'static str,
        value: String,
    },
    DuplicateRule {
        rule_id: String,
    },
    NotIdempotent {
        rule_id: String,
        field: String,
    },
    FeedsRule {
        rule_id: String,
        field: String,
        other_rule: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyRuleList => write!(f, "fix config contains no rules"),
            ValidationIssue::MissingField { rule_id, field } => match rule_id {
                Some(id) => write!(f, "rule '{id}' missing required field '{field}'"),
                None => write!(f, "missing required field '{field}'"),
            },
            ValidationIssue::InvalidIdentifier {
                rule_id,
                field,
                value,
            } => match rule_id {
                Some(id) => write!(f, "rule '{id}' has invalid identifier in '{field}': {value:?}"),
                None => write!(f, "invalid identifier in '{field}': {value:?}"),
            },
            ValidationIssue::DuplicateRule { rule_id } => {
                write!(f, "rule id '{rule_id}' is defined more than once")
            }
            ValidationIssue::NotIdempotent { rule_id, field } => write!(
                f,
                "rule '{rule_id}' inserts '{field}' which is also one of its first_fields"
            ),
            ValidationIssue::FeedsRule {
                rule_id,
                field,
                other_rule,
            } => write!(
                f,
                "rule '{rule_id}' inserts '{field}' which rule '{other_rule}' accepts as a first field for the same model"
            ),
        }
    }
}
