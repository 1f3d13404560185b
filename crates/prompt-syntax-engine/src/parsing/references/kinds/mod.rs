//! # Reference Kinds
//!
//! Each construct owns its delimiters; the scanner never hardcodes `#file:`
//! or a backtick.
//!
//! ## Types
//!
//! - **`CodeFence`**: ```` ``` ```` / `~~~` lines that open and close raw blocks
//! - **`CodeSpan`**: `` ` `` raw zone that suppresses reference scanning
//! - **`FileReference`**: `#file:<path>`
//! - **`MarkdownLink`**: `[label](<path>)`

pub mod code_fence;
pub mod code_span;
pub mod file_reference;
pub mod markdown_link;

pub use code_fence::{CodeFence, FenceKind};
pub use code_span::CodeSpan;
pub use file_reference::FileReference;
pub use markdown_link::MarkdownLink;
