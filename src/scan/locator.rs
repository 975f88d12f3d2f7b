use crate::scan::lang::typescript;
use ast_grep_core::tree_sitter::StrDoc;
use ast_grep_core::{AstGrep, Node};
use ast_grep_language::SupportLang;

type TsNode<'r> = Node<'r, StrDoc<SupportLang>>;

/// Shape of a record-creation call: `<client>.<model>.<method>({ <data_key>: { ... } })`.
#[derive(Debug, Clone, Copy)]
pub struct CallShape<'a> {
    pub clients: &'a [String],
    pub model: &'a str,
    pub method: &'a str,
    pub data_key: &'a str,
}

/// A field-list opening found inside a matching creation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldList {
    /// Byte offset where the call expression starts
    pub call_start: usize,
    /// Byte offset of the `{` that opens the field list
    pub open_brace: usize,
    /// The first property of the field list, if it starts with a named one
    pub first_key: Option<FieldKey>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldKey {
    /// Key name with any quotes removed
    pub name: String,
    /// Byte offset where the property starts
    pub start: usize,
}

/// Find every field-list opening of `shape` in `source`.
///
/// Only `call_expression` nodes are considered, so text that merely looks
/// like a call (inside a string, template, comment or regex) never matches.
pub fn locate_field_lists(source: &str, shape: &CallShape<'_>) -> Vec<FieldList> {
    let sg = AstGrep::new(source, typescript());
    let root = sg.root();
    let mut found = Vec::new();

    for call in root.dfs() {
        if call.kind() != "call_expression" || !matches_callee(&call, shape) {
            continue;
        }
        let Some(argument) = call
            .field("arguments")
            .and_then(|args| first_named(&args))
            .filter(|arg| arg.kind() == "object")
        else {
            continue;
        };
        let Some(fields) = data_object(&argument, shape.data_key) else {
            continue;
        };

        found.push(FieldList {
            call_start: call.range().start,
            open_brace: fields.range().start,
            first_key: first_key(&fields),
        });
    }

    found
}

/// `client.model.method` with a plain identifier as client.
fn matches_callee(call: &TsNode<'_>, shape: &CallShape<'_>) -> bool {
    let Some((model_access, method)) = call.field("function").and_then(|f| member_parts(&f)) else {
        return false;
    };
    let Some((client, model)) = member_parts(&model_access) else {
        return false;
    };
    if method != shape.method || model != shape.model || client.kind() != "identifier" {
        return false;
    }
    let client = client.text();
    shape.clients.iter().any(|c| *c == *client)
}

fn member_parts<'r>(node: &TsNode<'r>) -> Option<(TsNode<'r>, String)> {
    if node.kind() != "member_expression" {
        return None;
    }
    let object = node.field("object")?;
    let property = node.field("property")?;
    Some((object, property.text().into_owned()))
}

/// The object value of the top-level `data_key` property.
fn data_object<'r>(argument: &TsNode<'r>, data_key: &str) -> Option<TsNode<'r>> {
    argument
        .children()
        .filter(|child| child.kind() == "pair")
        .find_map(|pair| {
            let key = pair.field("key")?;
            let value = pair.field("value")?;
            (key_name(&key)? == data_key && value.kind() == "object").then_some(value)
        })
}

fn first_named<'r>(node: &TsNode<'r>) -> Option<TsNode<'r>> {
    node.children()
        .find(|child| child.is_named() && child.kind() != "comment")
}

fn first_key(fields: &TsNode<'_>) -> Option<FieldKey> {
    let first = first_named(fields)?;
    let kind = first.kind();
    let name = match &*kind {
        "pair" => key_name(&first.field("key")?)?,
        "shorthand_property_identifier" => first.text().into_owned(),
        _ => return None,
    };
    Some(FieldKey {
        name,
        start: first.range().start,
    })
}

/// Property key text for identifier and quoted-string keys.
fn key_name(key: &TsNode<'_>) -> Option<String> {
    let text = key.text();
    let kind = key.kind();
    match &*kind {
        "property_identifier" => Some(text.into_owned()),
        "string" => text.get(1..text.len().checked_sub(1)?).map(str::to_string),
        _ => None,
    }
}
