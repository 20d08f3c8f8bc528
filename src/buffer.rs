//! Rope-backed text buffer with an atomic splice and a scan cursor.
//!
//! All positions are **character** (not byte) indices into the text.

use std::fmt;

use ropey::Rope;

use crate::error::EngineError;

/// A mutable body of text, exclusively owned by one engine instance.
///
/// Mutation happens only through [`replace`](TextBuffer::replace). The
/// buffer also carries the scan cursor: an absolute char offset that is
/// meaningful only during an active scan and is shifted automatically when
/// a splice occurs ahead of it.
#[derive(Debug, Default, Clone)]
pub struct TextBuffer {
    rope: Rope,
    cursor: usize,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self {
            rope: Rope::new(),
            cursor: 0,
        }
    }

    pub fn from_str(s: &str) -> Self {
        Self {
            rope: Rope::from_str(s),
            cursor: 0,
        }
    }

    /// Length of the text in characters.
    pub fn len(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Copy out the characters in `[start, end)`.
    ///
    /// Panics if the range is out of bounds; callers pass ranges derived
    /// from a prior successful search, so this stays crate-internal.
    pub(crate) fn slice(&self, start: usize, end: usize) -> String {
        self.rope.slice(start..end).to_string()
    }

    pub(crate) fn cursor(&self) -> usize {
        self.cursor
    }

    pub(crate) fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor;
    }

    pub(crate) fn reset_cursor(&mut self) {
        self.cursor = 0;
    }

    /// Atomically replace `remove_len` characters at `start` with `insert`.
    ///
    /// The whole range is validated first; an out-of-range request fails
    /// with [`EngineError::OutOfRange`] and mutates nothing. A nonzero
    /// cursor strictly greater than `start` is shifted by
    /// `chars(insert) - remove_len` so it keeps pointing at the same
    /// logical position in the unedited remainder.
    pub fn replace(&mut self, start: usize, remove_len: usize, insert: &str) -> Result<(), EngineError> {
        let buffer_len = self.rope.len_chars();
        let in_range = start
            .checked_add(remove_len)
            .is_some_and(|end| end <= buffer_len);
        if !in_range {
            return Err(EngineError::OutOfRange {
                start,
                len: remove_len,
                buffer_len,
            });
        }
        self.rope.remove(start..start + remove_len);
        self.rope.insert(start, insert);
        if self.cursor != 0 && self.cursor > start {
            let inserted = insert.chars().count();
            self.cursor = (self.cursor + inserted).saturating_sub(remove_len);
        }
        Ok(())
    }

    /// Find the first occurrence of `needle` at or after `from`.
    ///
    /// Returns the absolute char offset of the occurrence. With
    /// `case_fold`, comparison ignores ASCII letter case (the same folding
    /// used for literal tokens throughout the engine). An empty needle
    /// matches at `from` itself.
    pub fn find_from(&self, needle: &str, from: usize, case_fold: bool) -> Option<usize> {
        let len = self.rope.len_chars();
        let needle: Vec<char> = needle.chars().collect();
        if needle.is_empty() {
            return (from <= len).then_some(from);
        }
        if from + needle.len() > len {
            return None;
        }
        for start in from..=len - needle.len() {
            let mut chars = self.rope.chars_at(start);
            let matched = needle.iter().all(|&pat| match chars.next() {
                Some(ch) => chars_equal(ch, pat, case_fold),
                None => false,
            });
            if matched {
                return Some(start);
            }
        }
        None
    }
}

impl fmt::Display for TextBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rope)
    }
}

fn chars_equal(a: char, b: char, case_fold: bool) -> bool {
    if case_fold {
        a.eq_ignore_ascii_case(&b)
    } else {
        a == b
    }
}
