use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// The kind of prompt file, which decides the metadata keys it accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Prompt,
    Instructions,
    Mode,
}

impl DocumentType {
    pub const ALL: [DocumentType; 3] = [
        DocumentType::Prompt,
        DocumentType::Instructions,
        DocumentType::Mode,
    ];

    /// File name suffix identifying this type on disk.
    pub fn file_extension(self) -> &'static str {
        match self {
            DocumentType::Prompt => ".prompt.md",
            DocumentType::Instructions => ".instructions.md",
            DocumentType::Mode => ".chatmode.md",
        }
    }

    /// Metadata keys recognized in this type's front matter.
    pub fn recognized_keys(self) -> &'static [&'static str] {
        match self {
            DocumentType::Prompt => &["description", "tools", "mode", "model"],
            DocumentType::Instructions => &["description", "applyTo"],
            DocumentType::Mode => &["description", "tools", "model"],
        }
    }

    /// Infers the type from a file name such as `review.prompt.md`.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        if name == "copilot-instructions.md" {
            return Some(DocumentType::Instructions);
        }
        Self::ALL
            .into_iter()
            .find(|ty| name.len() > ty.file_extension().len() && name.ends_with(ty.file_extension()))
    }

    pub fn from_uri(uri: &Url) -> Option<Self> {
        uri.path_segments()
            .and_then(|mut segments| segments.next_back())
            .and_then(Self::from_file_name)
    }

    /// Like [`DocumentType::from_uri`], treating unrecognized files as prompts.
    pub fn infer(uri: &Url) -> Self {
        Self::from_uri(uri).unwrap_or(DocumentType::Prompt)
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentType::Prompt => "prompt",
            DocumentType::Instructions => "instructions",
            DocumentType::Mode => "mode",
        };
        f.write_str(name)
    }
}
