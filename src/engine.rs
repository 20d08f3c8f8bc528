//! The engine: owns the text buffer and the optional trace sink, and runs
//! scans over it.

use std::fmt;

use crate::buffer::TextBuffer;
use crate::error::EngineError;
use crate::handle::MatchHandle;
use crate::pattern::Pattern;
use crate::scanner::Scanner;
use crate::trace::TraceSink;

/// Per-scan options.
///
/// The default matches the original system: literal tokens are compared
/// case-insensitively (ASCII folding), and trace events carry no label.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Require exact case for literal tokens.
    pub case_sensitive: bool,
    /// Label attached to trace events, useful when several scans share a
    /// sink.
    pub label: String,
}

/// A scan-and-rewrite engine over one exclusively-owned body of text.
///
/// Fully synchronous: [`apply`](Engine::apply) runs the scanner to
/// completion, suspending only for the callback itself. Taking `&mut self`
/// rules out concurrent or reentrant scans on the same instance.
pub struct Engine {
    buffer: TextBuffer,
    sink: Option<Box<dyn TraceSink>>,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            buffer: TextBuffer::new(),
            sink: None,
        }
    }

    pub fn from_str(text: &str) -> Self {
        Self {
            buffer: TextBuffer::from_str(text),
            sink: None,
        }
    }

    /// The current text. Readable at any time; edits from earlier scans
    /// persist.
    pub fn text(&self) -> String {
        self.buffer.text()
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    /// Inject a diagnostic observer. The engine owns it and drops it with
    /// itself (or on [`clear_trace`](Engine::clear_trace)); there is no
    /// global subscription state.
    pub fn set_trace(&mut self, sink: impl TraceSink + 'static) {
        self.sink = Some(Box::new(sink));
    }

    pub fn clear_trace(&mut self) {
        self.sink = None;
    }

    /// Run `pattern` over the text, invoking `callback` once per match in
    /// left-to-right order. Zero matches is a normal outcome.
    pub fn apply<F>(
        &mut self,
        pattern: &Pattern,
        options: &ScanOptions,
        mut callback: F,
    ) -> Result<(), EngineError>
    where
        F: FnMut(&mut MatchHandle<'_>),
    {
        // unsizing does not reach through `Option`, so coerce explicitly
        let sink = self.sink.as_deref_mut().map(|sink| sink as &mut _);
        Scanner::new(&mut self.buffer, pattern, options, sink).run(&mut callback)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.buffer)
    }
}
