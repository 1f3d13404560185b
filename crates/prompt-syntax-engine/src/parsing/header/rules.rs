//! Per-key validation of metadata records.
//!
//! Records are processed in source order. The first occurrence of a key is
//! authoritative; later ones are reported and dropped without validation.
//! The "mode overridden by tools" warning is emitted after every record
//! diagnostic.

use std::collections::HashSet;

use prompt_syntax_lexer::Range;

use super::HeaderRecord;
use super::value::{HeaderValue, ValueKind};
use crate::models::{
    ChatMode, Diagnostic, DocumentType, InstructionsMetadata, Metadata, ModeMetadata,
    PromptMetadata,
};

#[derive(Default)]
struct Fields {
    description: Option<String>,
    tools: Option<Vec<String>>,
    mode: Option<ChatMode>,
    mode_range: Option<Range>,
    model: Option<String>,
    apply_to: Option<String>,
}

/// Result of validating a header's records.
#[derive(Debug)]
pub struct Validated {
    pub metadata: Metadata,
    /// Record diagnostics in source order.
    pub diagnostics: Vec<Diagnostic>,
    /// Warning for an explicit mode replaced because tools are present.
    pub mode_override: Option<Diagnostic>,
}

pub fn validate(document_type: DocumentType, records: &[HeaderRecord]) -> Validated {
    let mut diagnostics = Vec::new();
    let mut seen = HashSet::new();
    let mut fields = Fields::default();

    for record in records {
        let key = record.key.as_str();
        if !document_type.recognized_keys().contains(&key) {
            diagnostics.push(Diagnostic::warning(
                record.range,
                format!("Unknown metadata '{key}' will be ignored"),
            ));
            continue;
        }
        if !seen.insert(key) {
            diagnostics.push(Diagnostic::warning(
                record.range,
                format!("Duplicate metadata '{key}' will be ignored"),
            ));
            continue;
        }

        let value = &record.value;
        match key {
            "description" => fields.description = string_field(key, value, &mut diagnostics),
            "model" => fields.model = string_field(key, value, &mut diagnostics),
            "tools" => fields.tools = tools_field(value, &mut diagnostics),
            "mode" => {
                fields.mode = mode_field(value, &mut diagnostics);
                fields.mode_range = Some(value.range);
            }
            "applyTo" => fields.apply_to = apply_to_field(value, &mut diagnostics),
            _ => {}
        }
    }

    let mut mode_override = None;
    let has_tools = fields.tools.as_ref().is_some_and(|tools| !tools.is_empty());
    if document_type == DocumentType::Prompt && has_tools {
        if let (Some(mode), Some(range)) = (fields.mode, fields.mode_range)
            && mode != ChatMode::Agent
        {
            mode_override = Some(Diagnostic::warning(
                range,
                "Tools can only be used in 'agent' mode, the 'mode' metadata is overridden to 'agent'",
            ));
        }
        fields.mode = Some(ChatMode::Agent);
    }

    Validated {
        metadata: build(document_type, fields),
        diagnostics,
        mode_override,
    }
}

fn build(document_type: DocumentType, fields: Fields) -> Metadata {
    match document_type {
        DocumentType::Prompt => Metadata::Prompt(PromptMetadata {
            description: fields.description,
            tools: fields.tools,
            mode: fields.mode,
            model: fields.model,
        }),
        DocumentType::Instructions => Metadata::Instructions(InstructionsMetadata {
            description: fields.description,
            apply_to: fields.apply_to,
        }),
        DocumentType::Mode => Metadata::Mode(ModeMetadata {
            description: fields.description,
            tools: fields.tools,
            model: fields.model,
        }),
    }
}

fn type_error(key: &str, expected: &str, value: &HeaderValue) -> Diagnostic {
    let article = if expected.starts_with('a') { "an" } else { "a" };
    Diagnostic::error(
        value.range,
        format!(
            "The '{key}' metadata must be {article} '{expected}', got '{}'",
            value.type_name()
        ),
    )
}

fn string_field(key: &str, value: &HeaderValue, diagnostics: &mut Vec<Diagnostic>) -> Option<String> {
    match value.as_str() {
        Some(text) => Some(text.to_string()),
        None => {
            diagnostics.push(type_error(key, "string", value));
            None
        }
    }
}

fn tools_field(value: &HeaderValue, diagnostics: &mut Vec<Diagnostic>) -> Option<Vec<String>> {
    let ValueKind::Array(items) = &value.kind else {
        diagnostics.push(type_error("tools", "array", value));
        return None;
    };

    let mut tools: Vec<String> = Vec::new();
    for item in items {
        match &item.kind {
            ValueKind::String { text, .. } if text.trim().is_empty() => {
                diagnostics.push(Diagnostic::warning(item.range, "Tool name cannot be empty"));
            }
            ValueKind::Empty => {
                diagnostics.push(Diagnostic::warning(item.range, "Tool name cannot be empty"));
            }
            ValueKind::String { text, .. } => {
                if tools.contains(text) {
                    diagnostics.push(Diagnostic::warning(
                        item.range,
                        format!("Duplicate tool name '{text}'"),
                    ));
                } else {
                    tools.push(text.clone());
                }
            }
            ValueKind::Boolean(_) | ValueKind::Array(_) => {
                diagnostics.push(Diagnostic::warning(
                    item.range,
                    format!("Unexpected tool name '{}', expected 'string'", item.raw),
                ));
            }
        }
    }

    Some(tools)
}

fn mode_field(value: &HeaderValue, diagnostics: &mut Vec<Diagnostic>) -> Option<ChatMode> {
    let mode = value.as_str().and_then(ChatMode::from_name);
    if mode.is_none() {
        diagnostics.push(Diagnostic::warning(
            value.range,
            format!(
                "Unknown mode '{}', expected one of 'ask', 'edit', 'agent'",
                value.raw
            ),
        ));
    }
    mode
}

fn apply_to_field(value: &HeaderValue, diagnostics: &mut Vec<Diagnostic>) -> Option<String> {
    let text = match &value.kind {
        ValueKind::String { text, .. } => text.trim(),
        ValueKind::Empty => "",
        ValueKind::Boolean(_) | ValueKind::Array(_) => {
            diagnostics.push(type_error("applyTo", "string", value));
            return None;
        }
    };

    let valid = !text.is_empty()
        && text
            .split(',')
            .map(str::trim)
            .all(|pattern| !pattern.is_empty() && glob::Pattern::new(pattern).is_ok());

    if valid {
        Some(text.to_string())
    } else {
        diagnostics.push(Diagnostic::error(
            value.range,
            format!("Invalid glob pattern '{text}'"),
        ));
        None
    }
}
