use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::models::UNTITLED_TASK_TITLE;

/// Whether the task being edited has been acknowledged by the remote store.
/// A draft has no remote id yet; its id is minted locally at first save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskIdentity {
    Draft,
    Persisted(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EditorMode {
    #[default]
    Empty,
    EditingNew,
    EditingExisting {
        id: String,
    },
}

impl EditorMode {
    pub fn identity(&self) -> TaskIdentity {
        match self {
            EditorMode::EditingExisting { id } => TaskIdentity::Persisted(id.clone()),
            // An empty form that gets saved behaves like a new draft.
            EditorMode::Empty | EditorMode::EditingNew => TaskIdentity::Draft,
        }
    }
}

pub fn mint_task_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveInput {
    pub title: String,
    pub details: String,
}

/// Normalizes the editor form for saving. Returns `None` when both the
/// trimmed title and the extracted body are empty (blank tasks are never
/// persisted). An empty title alone falls back to the untitled default.
pub fn prepare_save(raw_title: &str, details_doc: &str) -> Option<SaveInput> {
    let details = extract_plain_text(details_doc);
    let title = raw_title.trim();
    if title.is_empty() && details.is_empty() {
        return None;
    }
    let title = if title.is_empty() {
        UNTITLED_TASK_TITLE.to_string()
    } else {
        title.to_string()
    };
    Some(SaveInput { title, details })
}

/// Flattens the rich-text widget's document JSON to the plain text that gets
/// persisted. Text leaves are concatenated; hard breaks and block boundaries
/// become newlines. A bare JSON string or non-JSON input is treated as
/// already-plain text.
pub fn extract_plain_text(doc: &str) -> String {
    let value: Value = match serde_json::from_str(doc.trim()) {
        Ok(value) => value,
        Err(_) => return doc.trim().to_string(),
    };
    match value {
        Value::String(text) => text.trim().to_string(),
        value => {
            let mut out = String::new();
            collect_text(&value, &mut out);
            out.trim().to_string()
        }
    }
}

fn collect_text(node: &Value, out: &mut String) {
    match node {
        Value::Array(items) => {
            for item in items {
                collect_text(item, out);
            }
        }
        Value::Object(map) => {
            let node_type = map.get("type").and_then(|v| v.as_str());
            match node_type {
                Some("text") => {
                    if let Some(text) = map.get("text").and_then(|v| v.as_str()) {
                        out.push_str(text);
                    }
                }
                Some("hardBreak") => out.push('\n'),
                _ => {
                    if let Some(content) = map.get("content") {
                        collect_text(content, out);
                    }
                    if is_block(node_type) && !out.is_empty() && !out.ends_with('\n') {
                        out.push('\n');
                    }
                }
            }
        }
        _ => {}
    }
}

fn is_block(node_type: Option<&str>) -> bool {
    matches!(
        node_type,
        Some("paragraph" | "heading" | "listItem" | "blockquote" | "codeBlock")
    )
}
