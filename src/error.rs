use std::fmt;

/// The reason a buffer splice or scan failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A splice range extends beyond the end of the buffer. No mutation
    /// takes place.
    OutOfRange {
        start: usize,
        len: usize,
        buffer_len: usize,
    },
    /// Two edits queued during the same callback cover overlapping ranges
    /// of the matched span.
    OverlappingEdits,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange {
                start,
                len,
                buffer_len,
            } => write!(
                f,
                "splice of {len} chars at {start} is out of range for a buffer of {buffer_len} chars"
            ),
            Self::OverlappingEdits => {
                write!(f, "edits queued in one callback overlap each other")
            }
        }
    }
}

impl std::error::Error for EngineError {}
