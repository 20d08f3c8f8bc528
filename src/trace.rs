//! Diagnostic trace events for scan observability.
//!
//! The scanner emits one event per token step to an observer injected into
//! the engine. No event is required for correctness; the stream exists so a
//! misbehaving pattern can be watched token by token.

use std::fmt;

use crate::pattern::TokenKind;

/// One human-readable record of a token search step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEvent {
    /// Caller-supplied label for the scan, may be empty.
    pub label: String,
    /// 0-based position of the token in the pattern.
    pub token_index: usize,
    /// Total number of tokens in the pattern.
    pub token_count: usize,
    pub kind: TokenKind,
    /// Token text (literal text, capture name, `*` for a gap) with control
    /// characters escaped for display.
    pub value: String,
    /// Absolute char offset the token resolved at, `None` when it did not
    /// resolve.
    pub position: Option<usize>,
}

impl TraceEvent {
    pub fn found(&self) -> bool {
        self.position.is_some()
    }
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.label.is_empty() {
            write!(f, "[{}] ", self.label)?;
        }
        write!(
            f,
            "token {}/{} {} \"{}\"",
            self.token_index + 1,
            self.token_count,
            self.kind,
            self.value
        )?;
        match self.position {
            Some(pos) => write!(f, " found at {pos}"),
            None => write!(f, " not found"),
        }
    }
}

/// An observer for [`TraceEvent`]s, owned by the engine that emits into it
/// and dropped with it.
pub trait TraceSink {
    fn event(&mut self, event: &TraceEvent);
}

impl<F: FnMut(&TraceEvent)> TraceSink for F {
    fn event(&mut self, event: &TraceEvent) {
        self(event)
    }
}

/// Escape a token value for display: `\r\n`, `\n` and `\t` become their
/// two-character spellings.
pub(crate) fn escape(value: &str) -> String {
    value
        .replace("\r\n", "\\r\\n")
        .replace('\n', "\\n")
        .replace('\t', "\\t")
}
