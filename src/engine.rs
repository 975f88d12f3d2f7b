//! Patch engine - inserts synthesized fields into record-creation calls
//!
//! The engine:
//! - Applies rules in configured order, each to the output of the previous one
//! - Skips rules whose model never appears in the text (regex pre-filter)
//! - Locates field lists on the TypeScript syntax tree
//! - Compiles insertions into edits and applies them bottom-to-top
//!
//! A rule only matches when the field list opens with one of its
//! `first_fields`. Inserted fields are never first fields, so running the
//! engine on its own output changes nothing.

use crate::config::{FieldSpec, FixConfig, Metadata, RuleDefinition};
use crate::edit::{apply_edits, EditError, TextEdit};
use crate::scan::{locate_field_lists, CallShape, FieldList};
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to build pre-filter for rule '{rule_id}': {source}")]
    Prefilter {
        rule_id: String,
        #[source]
        source: regex::Error,
    },

    #[error("rule '{rule_id}' produced an invalid edit: {source}")]
    Edit {
        rule_id: String,
        #[source]
        source: EditError,
    },
}

/// One call site that received synthesized fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Insertion {
    pub rule_id: String,
    /// 1-based line of the call in the text the rule ran on
    pub line: usize,
    /// Names of the inserted fields, in order
    pub fields: Vec<String>,
}

/// Result of running the engine over one text.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "PatchOutcome carries the patched text"]
pub struct PatchOutcome {
    pub text: String,
    pub changed: bool,
    pub insertions: Vec<Insertion>,
}

#[derive(Debug)]
struct CompiledRule {
    definition: RuleDefinition,
    prefilter: Regex,
}

#[derive(Debug)]
pub struct PatchEngine {
    clients: Vec<String>,
    method: String,
    data_key: String,
    rules: Vec<CompiledRule>,
}

impl PatchEngine {
    pub fn new(config: &FixConfig) -> Result<Self, EngineError> {
        Self::from_rules(&config.meta, config.rules.iter().cloned())
    }

    pub fn from_rules(
        meta: &Metadata,
        rules: impl IntoIterator<Item = RuleDefinition>,
    ) -> Result<Self, EngineError> {
        let rules = rules
            .into_iter()
            .map(|definition| -> Result<CompiledRule, EngineError> {
                let pattern = format!(
                    r"(?:^|[^A-Za-z0-9_$]){}(?:[^A-Za-z0-9_$]|$)",
                    regex::escape(&definition.model)
                );
                let prefilter = Regex::new(&pattern).map_err(|source| EngineError::Prefilter {
                    rule_id: definition.id.clone(),
                    source,
                })?;
                Ok(CompiledRule {
                    definition,
                    prefilter,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            clients: meta.clients.clone(),
            method: meta.method.clone(),
            data_key: meta.data_key.clone(),
            rules,
        })
    }

    /// Apply every rule in order.
    pub fn apply(&self, source: &str) -> Result<PatchOutcome, EngineError> {
        let mut text = source.to_string();
        let mut insertions = Vec::new();

        for rule in &self.rules {
            if !rule.prefilter.is_match(&text) {
                continue;
            }
            let (patched, found) = self.apply_rule(&rule.definition, &text)?;
            if !found.is_empty() {
                text = patched;
                insertions.extend(found);
            }
        }

        Ok(PatchOutcome {
            changed: text != source,
            text,
            insertions,
        })
    }

    /// Apply a single rule, returning the new text and the insertions made.
    pub fn apply_rule(
        &self,
        rule: &RuleDefinition,
        source: &str,
    ) -> Result<(String, Vec<Insertion>), EngineError> {
        let shape = CallShape {
            clients: &self.clients,
            model: &rule.model,
            method: &self.method,
            data_key: &self.data_key,
        };

        let mut edits = Vec::new();
        let mut insertions = Vec::new();

        for site in locate_field_lists(source, &shape) {
            let Some(key) = site.first_key.as_ref() else {
                continue;
            };
            if !rule.first_fields.iter().any(|f| f == &key.name) {
                continue;
            }

            edits.push(TextEdit::insert(
                key.start,
                render_fields(source, &site, key.start, &rule.insert),
            ));
            insertions.push(Insertion {
                rule_id: rule.id.clone(),
                line: line_of(source, site.call_start),
                fields: rule.insert.iter().map(|f| f.name.clone()).collect(),
            });
        }

        if edits.is_empty() {
            return Ok((source.to_string(), insertions));
        }

        let patched = apply_edits(source, edits).map_err(|source| EngineError::Edit {
            rule_id: rule.id.clone(),
            source,
        })?;
        Ok((patched, insertions))
    }
}

/// Render the synthesized fields that go right before the first key.
///
/// A key on its own line gets one line per field at the same indentation;
/// a key sharing a line with the opening brace gets the fields inline.
/// Inserted lines end the same way as the line before the key (`\n` or `\r\n`).
fn render_fields(source: &str, site: &FieldList, key_start: usize, fields: &[FieldSpec]) -> String {
    let line_start = source[..key_start].rfind('\n').map_or(0, |idx| idx + 1);
    let indent = &source[line_start..key_start];
    let own_line = line_start > site.open_brace && indent.chars().all(char::is_whitespace);
    let newline = if source[..line_start].ends_with("\r\n") {
        "\r\n"
    } else {
        "\n"
    };

    let mut out = String::new();
    for field in fields {
        out.push_str(&field.name);
        out.push_str(": ");
        out.push_str(&field.value);
        if own_line {
            out.push(',');
            out.push_str(newline);
            out.push_str(indent);
        } else {
            out.push_str(", ");
        }
    }
    out
}

fn line_of(source: &str, offset: usize) -> usize {
    source[..offset].matches('\n').count() + 1
}
