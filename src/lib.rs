//! A placeholder-pattern text scanner and in-place rewriter.
//!
//! Patterns are built from literal fragments, `[name]` captures and `*`
//! whitespace gaps. Applying a compiled pattern walks the text occurrence
//! by occurrence, hands each match to a callback, and splices the
//! callback's rewrite back into the text before scanning resumes.
//!
//! # Example
//!
//! ```rust
//! use stencil::{Engine, ScanOptions, compile};
//!
//! let pattern = compile(";[name]=[value]\n");
//! let mut engine = Engine::from_str("; colour=red\n; shape=square\n");
//!
//! engine
//!     .apply(&pattern, &ScanOptions::default(), |m| {
//!         m.modify_body(|caps| {
//!             format!("{}: {}\n", caps.value("name").trim(), caps.value("value").trim())
//!         });
//!     })
//!     .unwrap();
//!
//! assert_eq!(engine.text(), "colour: red\nshape: square\n");
//! ```

mod buffer;
mod engine;
mod error;
mod handle;
mod pattern;
mod scanner;
mod trace;

pub use buffer::TextBuffer;
pub use engine::{Engine, ScanOptions};
pub use error::EngineError;
pub use handle::MatchHandle;
pub use pattern::{Pattern, PatternWarning, Token, TokenKind, compile};
pub use scanner::{Capture, Captures, Match};
pub use trace::{TraceEvent, TraceSink};
