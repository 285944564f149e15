//! Error types for Trellis core.

use std::fmt;

/// A completion callback was dropped without being invoked.
///
/// Completion-callback APIs promise exactly one invocation. When the party
/// holding the callback discards it instead, the waiting side settles with
/// this error rather than hanging forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompletionDropped;

impl fmt::Display for CompletionDropped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Completion callback was dropped without being invoked")
    }
}

impl std::error::Error for CompletionDropped {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_dropped_display() {
        assert_eq!(
            CompletionDropped.to_string(),
            "Completion callback was dropped without being invoked"
        );
    }
}
