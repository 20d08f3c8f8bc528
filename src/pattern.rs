//! The placeholder pattern mini-language and its compiler.
//!
//! # Pattern syntax
//!
//! | Token    | Meaning                                              |
//! |----------|------------------------------------------------------|
//! | `text`   | Literal fragment that must occur verbatim            |
//! | `*`      | Gap: a flexible span that must be whitespace only    |
//! | `[name]` | Named capture, surfaced to the match callback        |
//!
//! A `[` inside a capture name is an ordinary name character, so names like
//! `a[b` are representable but a nested capture is not. An unterminated
//! `[...` at end of input emits no token at all; the compiler records an
//! [`UnterminatedCapture`](PatternWarning::UnterminatedCapture) warning and
//! otherwise keeps the original system's silent-drop behaviour.

use std::fmt;

/// One compiled pattern token. Immutable once compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Exact substring that must occur in the text.
    Literal(String),
    /// Named placeholder whose matched span is surfaced to the callback.
    Capture(String),
    /// Unnamed placeholder whose matched span must be whitespace only.
    Gap,
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Literal(_) => TokenKind::Literal,
            Token::Capture(_) => TokenKind::Capture,
            Token::Gap => TokenKind::Gap,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Token::Literal(_))
    }
}

/// The variant of a [`Token`], without its payload. Used by trace events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Literal,
    Capture,
    Gap,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Literal => write!(f, "literal"),
            TokenKind::Capture => write!(f, "capture"),
            TokenKind::Gap => write!(f, "gap"),
        }
    }
}

/// A non-fatal oddity noticed while compiling a pattern.
///
/// Warnings never change runtime semantics; the scanner handles the
/// corresponding patterns with the documented silent behaviours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternWarning {
    /// A `[name` with no closing `]`; the capture is dropped entirely.
    UnterminatedCapture { name: String },
    /// Two Gap/Capture tokens in a row; no literal delimiter bounds the
    /// first, so a scan can never resolve it.
    AdjacentPlaceholders { index: usize },
}

impl fmt::Display for PatternWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedCapture { name } => {
                write!(f, "unterminated capture '[{name}' dropped from pattern")
            }
            Self::AdjacentPlaceholders { index } => {
                write!(
                    f,
                    "placeholder at token {index} follows another placeholder with no literal between them"
                )
            }
        }
    }
}

/// An ordered, immutable token sequence. Compiled once, reusable across scans.
#[derive(Debug, Clone, Default)]
pub struct Pattern {
    tokens: Vec<Token>,
    warnings: Vec<PatternWarning>,
}

impl Pattern {
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn warnings(&self) -> &[PatternWarning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Accumulator state for [`compile`]: either pending literal text or a
/// capture name being collected between brackets.
enum Accum {
    Literal(String),
    Name(String),
}

/// Compile a pattern string into a [`Pattern`]. Never fails: malformed
/// input compiles to whatever tokens it does produce, plus warnings.
pub fn compile(pattern: &str) -> Pattern {
    let mut tokens = Vec::new();
    let mut warnings = Vec::new();
    let mut accum = Accum::Literal(String::new());

    for ch in pattern.chars() {
        accum = match accum {
            Accum::Literal(mut pending) => match ch {
                '*' => {
                    flush_literal(pending, &mut tokens);
                    tokens.push(Token::Gap);
                    Accum::Literal(String::new())
                }
                '[' => {
                    flush_literal(pending, &mut tokens);
                    Accum::Name(String::new())
                }
                _ => {
                    pending.push(ch);
                    Accum::Literal(pending)
                }
            },
            Accum::Name(mut name) => {
                if ch == ']' {
                    tokens.push(Token::Capture(name));
                    Accum::Literal(String::new())
                } else {
                    // '[' is an ordinary character inside a name
                    name.push(ch);
                    Accum::Name(name)
                }
            }
        };
    }

    match accum {
        Accum::Literal(pending) => flush_literal(pending, &mut tokens),
        Accum::Name(name) => warnings.push(PatternWarning::UnterminatedCapture { name }),
    }

    for (index, pair) in tokens.windows(2).enumerate() {
        if !pair[0].is_literal() && !pair[1].is_literal() {
            warnings.push(PatternWarning::AdjacentPlaceholders { index: index + 1 });
        }
    }

    Pattern { tokens, warnings }
}

fn flush_literal(pending: String, tokens: &mut Vec<Token>) {
    if !pending.is_empty() {
        tokens.push(Token::Literal(pending));
    }
}
