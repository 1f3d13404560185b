#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceKind {
    Backticks,
    Tildes,
}

pub struct CodeFence;

impl CodeFence {
    pub const BACKTICKS: &'static str = "```";
    pub const TILDES: &'static str = "~~~";

    /// Fence kind of a line, ignoring leading whitespace.
    pub fn kind(line: &str) -> Option<FenceKind> {
        let t = line.trim_start();
        if t.starts_with(Self::BACKTICKS) {
            Some(FenceKind::Backticks)
        } else if t.starts_with(Self::TILDES) {
            Some(FenceKind::Tildes)
        } else {
            None
        }
    }

    pub fn closes(open: FenceKind, line: &str) -> bool {
        Self::kind(line) == Some(open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_backtick_fence() {
        assert_eq!(CodeFence::kind("```markdown"), Some(FenceKind::Backticks));
    }

    #[test]
    fn detect_indented_tilde_fence() {
        assert_eq!(CodeFence::kind("  ~~~"), Some(FenceKind::Tildes));
    }

    #[test]
    fn two_backticks_are_not_a_fence() {
        assert_eq!(CodeFence::kind("``x``"), None);
    }

    #[test]
    fn fences_only_close_their_own_kind() {
        assert!(CodeFence::closes(FenceKind::Backticks, "```"));
        assert!(!CodeFence::closes(FenceKind::Backticks, "~~~"));
    }
}
