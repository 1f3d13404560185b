pub mod diagnostic;
pub mod document_type;
pub mod metadata;

pub use diagnostic::{Diagnostic, Severity};
pub use document_type::DocumentType;
pub use metadata::{ChatMode, InstructionsMetadata, Metadata, ModeMetadata, PromptMetadata};
