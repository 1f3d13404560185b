use serde::{Deserialize, Serialize};
use std::fmt;

use super::DocumentType;

/// The closed set of chat modes a prompt can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    Ask,
    Edit,
    Agent,
}

impl ChatMode {
    pub const ALL: [ChatMode; 3] = [ChatMode::Ask, ChatMode::Edit, ChatMode::Agent];

    pub fn as_str(self) -> &'static str {
        match self {
            ChatMode::Ask => "ask",
            ChatMode::Edit => "edit",
            ChatMode::Agent => "agent",
        }
    }

    /// Exact, case-sensitive lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.as_str() == name)
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<ChatMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionsMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "applyTo", skip_serializing_if = "Option::is_none")]
    pub apply_to: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Validated front matter, discriminated by the document type.
///
/// Serializes with an explicit `type` tag, so a document without front
/// matter serializes to just `{ type: prompt }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Metadata {
    Prompt(PromptMetadata),
    Instructions(InstructionsMetadata),
    Mode(ModeMetadata),
}

impl Metadata {
    /// Metadata carrying nothing but the document type.
    pub fn empty(document_type: DocumentType) -> Self {
        match document_type {
            DocumentType::Prompt => Metadata::Prompt(PromptMetadata::default()),
            DocumentType::Instructions => Metadata::Instructions(InstructionsMetadata::default()),
            DocumentType::Mode => Metadata::Mode(ModeMetadata::default()),
        }
    }

    pub fn document_type(&self) -> DocumentType {
        match self {
            Metadata::Prompt(_) => DocumentType::Prompt,
            Metadata::Instructions(_) => DocumentType::Instructions,
            Metadata::Mode(_) => DocumentType::Mode,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Metadata::Prompt(m) => m.description.as_deref(),
            Metadata::Instructions(m) => m.description.as_deref(),
            Metadata::Mode(m) => m.description.as_deref(),
        }
    }

    pub fn tools(&self) -> Option<&[String]> {
        match self {
            Metadata::Prompt(m) => m.tools.as_deref(),
            Metadata::Mode(m) => m.tools.as_deref(),
            Metadata::Instructions(_) => None,
        }
    }

    pub fn mode(&self) -> Option<ChatMode> {
        match self {
            Metadata::Prompt(m) => m.mode,
            _ => None,
        }
    }

    pub fn model(&self) -> Option<&str> {
        match self {
            Metadata::Prompt(m) => m.model.as_deref(),
            Metadata::Mode(m) => m.model.as_deref(),
            Metadata::Instructions(_) => None,
        }
    }

    pub fn apply_to(&self) -> Option<&str> {
        match self {
            Metadata::Instructions(m) => m.apply_to.as_deref(),
            _ => None,
        }
    }

    /// True when nothing but the type tag is set.
    pub fn is_empty(&self) -> bool {
        *self == Metadata::empty(self.document_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_metadata_serializes_to_type_only() {
        insta::assert_yaml_snapshot!(Metadata::empty(DocumentType::Instructions), @"type: instructions");
    }

    #[test]
    fn chat_mode_lookup_is_exact() {
        assert_eq!(ChatMode::from_name("agent"), Some(ChatMode::Agent));
        assert_eq!(ChatMode::from_name("Agent"), None);
        assert_eq!(ChatMode::from_name(""), None);
    }

    #[test]
    fn accessors_follow_the_variant() {
        let metadata = Metadata::Prompt(PromptMetadata {
            tools: Some(vec!["search".to_string()]),
            mode: Some(ChatMode::Agent),
            ..Default::default()
        });
        assert_eq!(metadata.tools(), Some(&["search".to_string()][..]));
        assert_eq!(metadata.mode(), Some(ChatMode::Agent));
        assert_eq!(metadata.apply_to(), None);
        assert!(!metadata.is_empty());
    }
}
