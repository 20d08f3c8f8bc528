//! The scan/match state machine: drives token-by-token matching of a
//! compiled [`Pattern`] against a [`TextBuffer`].
//!
//! All positions are **character** indices. Matching is single-pass and
//! greedy: once a token fails, the attempt is abandoned rather than trying
//! alternative splits. An unmatched literal ends the whole scan; an
//! unresolved placeholder abandons only the current attempt.

use std::mem;

use crate::buffer::TextBuffer;
use crate::engine::ScanOptions;
use crate::error::EngineError;
use crate::handle::{Edit, MatchHandle};
use crate::pattern::{Pattern, Token};
use crate::trace::{self, TraceEvent, TraceSink};

/// Abandoned attempts that leave the cursor in place repeat
/// deterministically; after this many, the scanner forces the cursor to the
/// next anchor occurrence or stops.
const MAX_STALLED_ATTEMPTS: usize = 2;

/// One captured span, recorded at match time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub name: String,
    /// The span's text, copied out of the buffer at match time.
    pub value: String,
    /// Absolute char offset of the value in the buffer at match time.
    pub index: usize,
    /// Offset of the value relative to the start of the matched span.
    pub(crate) offset: usize,
}

/// The capture set of one match. A repeated capture name overwrites the
/// earlier record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures {
    items: Vec<Capture>,
}

impl Captures {
    pub fn get(&self, name: &str) -> Option<&Capture> {
        self.items.iter().find(|cap| cap.name == name)
    }

    /// Captured text for `name`, or `""` when absent.
    pub fn value(&self, name: &str) -> &str {
        self.get(name).map(|cap| cap.value.as_str()).unwrap_or("")
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Capture> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn record(&mut self, name: String, value: String, index: usize, offset: usize) {
        let capture = Capture {
            name,
            value,
            index,
            offset,
        };
        match self.items.iter_mut().find(|cap| cap.name == capture.name) {
            Some(existing) => *existing = capture,
            None => self.items.push(capture),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
    }
}

/// One successful pass through every token of a pattern.
///
/// `text` is an immutable snapshot of the matched span taken at match time;
/// capture offsets point into it, so edits made later in the same callback
/// cannot stale them.
#[derive(Debug, Clone)]
pub struct Match {
    start: usize,
    end: usize,
    text: String,
    captures: Captures,
}

impl Match {
    pub(crate) fn new(start: usize, end: usize, text: String, captures: Captures) -> Self {
        Self {
            start,
            end,
            text,
            captures,
        }
    }

    /// Start of the matched span (absolute char offset at match time).
    pub fn start(&self) -> usize {
        self.start
    }

    /// End of the matched span (exclusive).
    pub fn end(&self) -> usize {
        self.end
    }

    /// Snapshot of the matched span's text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn captures(&self) -> &Captures {
        &self.captures
    }
}

/// Token-by-token scan of one pattern over one buffer.
pub(crate) struct Scanner<'a> {
    buffer: &'a mut TextBuffer,
    tokens: &'a [Token],
    case_fold: bool,
    label: &'a str,
    // Object bound is `'a`, not `'static`: `&mut` is invariant, and the
    // engine lends its boxed sink only for the scan.
    sink: Option<&'a mut (dyn TraceSink + 'a)>,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(
        buffer: &'a mut TextBuffer,
        pattern: &'a Pattern,
        options: &'a ScanOptions,
        sink: Option<&'a mut (dyn TraceSink + 'a)>,
    ) -> Self {
        Self {
            buffer,
            tokens: pattern.tokens(),
            case_fold: !options.case_sensitive,
            label: &options.label,
            sink,
        }
    }

    /// Run the scan to completion, invoking `callback` once per match in
    /// left-to-right order. The cursor is reset on entry and exit; edits
    /// committed along the way persist.
    pub(crate) fn run(
        mut self,
        callback: &mut dyn FnMut(&mut MatchHandle<'_>),
    ) -> Result<(), EngineError> {
        let tokens = self.tokens;
        self.buffer.reset_cursor();
        if tokens.is_empty() {
            return Ok(());
        }

        let mut token_index = 0usize;
        let mut match_start = 0usize;
        let mut captures = Captures::default();
        let mut attempt_cursor = 0usize;
        let mut stalled = 0usize;

        loop {
            if token_index == tokens.len() {
                // A full match just completed over [match_start, cursor).
                let end = self.buffer.cursor();
                let snapshot = self.buffer.slice(match_start, end);
                let mat = Match::new(match_start, end, snapshot, mem::take(&mut captures));
                let mut handle = MatchHandle::new(&mat);
                callback(&mut handle);
                if let Err(err) = self.commit(&mat, handle.into_edits()) {
                    self.buffer.reset_cursor();
                    return Err(err);
                }

                // Resume at the next anchor occurrence when there is one.
                if let Token::Literal(anchor) = &tokens[0]
                    && let Some(pos) =
                        self.buffer
                            .find_from(anchor, self.buffer.cursor(), self.case_fold)
                {
                    self.buffer.set_cursor(pos);
                }
                if end == match_start {
                    // A zero-width match (all-placeholder pattern, empty
                    // span) would repeat at the same offset. A shrunk or
                    // deleted span is not zero-width: the cursor may land
                    // back on match_start and must rescan from there.
                    if !self.advance_past_anchor() {
                        break;
                    }
                }
                token_index = 0;
                attempt_cursor = self.buffer.cursor();
                stalled = 0;
                continue;
            }

            let token = &tokens[token_index];
            match token {
                Token::Literal(text) => {
                    let found = self
                        .buffer
                        .find_from(text, self.buffer.cursor(), self.case_fold);
                    self.trace(token_index, token, found);
                    match found {
                        Some(pos) => {
                            if token_index == 0 {
                                match_start = pos;
                            }
                            self.buffer.set_cursor(pos + char_len(text));
                            token_index += 1;
                        }
                        // An unmatched literal ends the entire scan.
                        None => break,
                    }
                }
                Token::Capture(_) | Token::Gap => {
                    let start = self.buffer.cursor();
                    if token_index == 0 {
                        match_start = start;
                    }
                    let span_end = match tokens.get(token_index + 1) {
                        // Last token: the rest of the buffer is the span.
                        None => Some(self.buffer.len()),
                        Some(Token::Literal(delim)) => {
                            self.buffer.find_from(delim, start, self.case_fold)
                        }
                        // Adjacent placeholder: nothing bounds this span.
                        Some(_) => None,
                    };
                    let resolved = span_end.and_then(|end| {
                        let span = self.buffer.slice(start, end);
                        match token {
                            Token::Gap if !whitespace_only(&span) => None,
                            _ => Some((end, span)),
                        }
                    });
                    self.trace(token_index, token, resolved.as_ref().map(|(end, _)| *end));
                    match resolved {
                        Some((end, span)) => {
                            if let Token::Capture(name) = token {
                                captures.record(name.clone(), span, start, start - match_start);
                            }
                            self.buffer.set_cursor(end);
                            token_index += 1;
                        }
                        None => {
                            // Abandon this attempt; the cursor stays put.
                            token_index = 0;
                            captures.clear();
                            if self.buffer.cursor() == attempt_cursor {
                                stalled += 1;
                            } else {
                                attempt_cursor = self.buffer.cursor();
                                stalled = 1;
                            }
                            if stalled >= MAX_STALLED_ATTEMPTS {
                                if !self.advance_past_anchor() {
                                    break;
                                }
                                attempt_cursor = self.buffer.cursor();
                                stalled = 0;
                            }
                        }
                    }
                }
            }
        }

        self.buffer.reset_cursor();
        Ok(())
    }

    /// Move the cursor to the next anchor occurrence strictly past its
    /// current position. `false` when the pattern has no literal anchor or
    /// no further occurrence exists, which ends the scan.
    fn advance_past_anchor(&mut self) -> bool {
        let Some(Token::Literal(anchor)) = self.tokens.first() else {
            return false;
        };
        match self
            .buffer
            .find_from(anchor, self.buffer.cursor() + 1, self.case_fold)
        {
            Some(pos) => {
                self.buffer.set_cursor(pos);
                true
            }
            None => false,
        }
    }

    /// Validate the callback's queued edits and splice them into the buffer
    /// as one atomic replacement of the matched span.
    fn commit(&mut self, mat: &Match, mut edits: Vec<Edit>) -> Result<(), EngineError> {
        if edits.is_empty() {
            return Ok(());
        }
        edits.sort_by_key(|edit| (edit.range.start, edit.range.end));
        let disjoint = edits
            .windows(2)
            .all(|pair| pair[0].range.end <= pair[1].range.start);
        if !disjoint {
            return Err(EngineError::OverlappingEdits);
        }
        let snapshot: Vec<char> = mat.text().chars().collect();
        let mut rebuilt = String::new();
        let mut pos = 0usize;
        for edit in &edits {
            rebuilt.extend(&snapshot[pos..edit.range.start]);
            rebuilt.push_str(&edit.text);
            pos = edit.range.end;
        }
        rebuilt.extend(&snapshot[pos..]);
        self.buffer
            .replace(mat.start(), mat.end() - mat.start(), &rebuilt)
    }

    fn trace(&mut self, token_index: usize, token: &Token, position: Option<usize>) {
        if let Some(sink) = &mut self.sink {
            let value = match token {
                Token::Literal(text) => trace::escape(text),
                Token::Capture(name) => trace::escape(name),
                Token::Gap => "*".to_string(),
            };
            sink.event(&TraceEvent {
                label: self.label.to_string(),
                token_index,
                token_count: self.tokens.len(),
                kind: token.kind(),
                value,
                position,
            });
        }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// True when every character is space, tab, newline or carriage return —
/// the only characters a gap may span.
fn whitespace_only(span: &str) -> bool {
    span.chars().all(|c| matches!(c, ' ' | '\t' | '\n' | '\r'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::compile;

    /// Run one scan over `text`, returning the edited text and the capture
    /// sets seen by the callback.
    fn scan_with<F>(text: &str, pattern: &str, mut callback: F) -> (String, usize)
    where
        F: FnMut(&mut MatchHandle<'_>),
    {
        let mut buffer = TextBuffer::from_str(text);
        let pattern = compile(pattern);
        let options = ScanOptions::default();
        let mut count = 0usize;
        let mut cb = |handle: &mut MatchHandle<'_>| {
            count += 1;
            callback(handle);
        };
        Scanner::new(&mut buffer, &pattern, &options, None)
            .run(&mut cb)
            .unwrap();
        (buffer.text(), count)
    }

    fn matches_of(text: &str, pattern: &str) -> Vec<String> {
        let mut seen = Vec::new();
        scan_with(text, pattern, |m| seen.push(m.matched_text().to_string()));
        seen
    }

    #[test]
    fn empty_pattern_is_a_no_op() {
        let (text, count) = scan_with("abc", "", |_| {});
        assert_eq!(text, "abc");
        assert_eq!(count, 0);
    }

    #[test]
    fn missing_first_literal_ends_with_zero_matches() {
        let (text, count) = scan_with("abc", "zz[v];", |_| {});
        assert_eq!(text, "abc");
        assert_eq!(count, 0);
    }

    #[test]
    fn literal_only_pattern_matches_each_occurrence() {
        assert_eq!(matches_of("x..x..x", "x"), vec!["x", "x", "x"]);
    }

    #[test]
    fn capture_spans_to_delimiter() {
        let mut seen = Vec::new();
        scan_with("k=abc;", "k=[v];", |m| {
            seen.push((m.value("v").to_string(), m.capture("v").map(|c| c.index)));
        });
        assert_eq!(seen, vec![("abc".to_string(), Some(2))]);
    }

    #[test]
    fn trailing_capture_takes_rest_of_buffer() {
        let mut seen = Vec::new();
        scan_with("k=abc", "k=[v]", |m| seen.push(m.value("v").to_string()));
        assert_eq!(seen, vec!["abc"]);
    }

    #[test]
    fn gap_tolerates_whitespace_between_anchors() {
        assert_eq!(matches_of("a \t\r\n b", "a*b"), vec!["a \t\r\n b"]);
        assert_eq!(matches_of("ab", "a*b"), vec!["ab"]);
    }

    #[test]
    fn gap_with_other_characters_abandons_the_attempt() {
        let (text, count) = scan_with("a x b", "a*b", |_| {});
        assert_eq!(text, "a x b");
        assert_eq!(count, 0);
    }

    #[test]
    fn abandoned_attempt_retries_at_later_anchor() {
        // First "a" is followed by non-whitespace before "b"; the second
        // works.
        assert_eq!(matches_of("a x b ... a  b", "a*b"), vec!["a  b"]);
    }

    #[test]
    fn unresolved_leading_placeholder_terminates() {
        // "*x" can never resolve here; the progress guard must stop the
        // scan instead of spinning on the same attempt.
        let (text, count) = scan_with("a x", "*x", |_| {});
        assert_eq!(text, "a x");
        assert_eq!(count, 0);
    }

    #[test]
    fn lone_capture_matches_whole_buffer_then_stops() {
        // The trailing empty rescan is a quirk of the original semantics:
        // one empty match at end of buffer, then the scan stops.
        let mut seen = Vec::new();
        scan_with("abc", "[v]", |m| seen.push(m.value("v").to_string()));
        assert_eq!(seen, vec!["abc".to_string(), String::new()]);
    }

    #[test]
    fn duplicate_capture_name_keeps_last_record() {
        let mut seen = Vec::new();
        scan_with("a=1,b=2;", "a=[v],b=[v];", |m| {
            assert_eq!(m.captures().len(), 1);
            seen.push(m.value("v").to_string());
        });
        assert_eq!(seen, vec!["2"]);
    }

    #[test]
    fn several_set_value_edits_commit_together() {
        let (text, count) = scan_with("k=a+b;", "k=[x]+[y];", |m| {
            assert!(m.set_value("x", "AA"));
            assert!(m.set_value("y", "BB"));
        });
        assert_eq!(count, 1);
        assert_eq!(text, "k=AA+BB;");
    }

    #[test]
    fn overlapping_edits_are_rejected() {
        let mut buffer = TextBuffer::from_str("k=a;");
        let pattern = compile("k=[x];");
        let options = ScanOptions::default();
        let mut cb = |m: &mut MatchHandle<'_>| {
            m.set_value("x", "b");
            m.replace("gone");
        };
        let err = Scanner::new(&mut buffer, &pattern, &options, None)
            .run(&mut cb)
            .unwrap_err();
        assert_eq!(err, EngineError::OverlappingEdits);
        // the failed match mutated nothing
        assert_eq!(buffer.text(), "k=a;");
    }

    #[test]
    fn edit_before_cursor_shifts_later_matches_correctly() {
        let mut seen = Vec::new();
        let (text, _) = scan_with(";a=1\n;b=22\n", ";[n]=[v]\n", |m| {
            seen.push((m.value("n").to_string(), m.value("v").to_string()));
            m.replace("#\n");
        });
        assert_eq!(
            seen,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "22".to_string())
            ]
        );
        assert_eq!(text, "#\n#\n");
    }

    #[test]
    fn deleting_a_match_does_not_skip_the_next_occurrence() {
        // Deleting the span shifts the cursor back onto the next anchor;
        // the scan must rescan from there, not jump past it.
        let (text, count) = scan_with(";a\n;b\n;c\n", ";[v]\n", |m| m.replace(""));
        assert_eq!(count, 3);
        assert_eq!(text, "");
    }

    #[test]
    fn shrinking_a_match_still_visits_every_occurrence() {
        let (text, count) = scan_with("k=aaaa;k=bbbb;", "k=[v];", |m| {
            assert!(m.set_value("v", "."));
        });
        assert_eq!(count, 2);
        assert_eq!(text, "k=.;k=.;");
    }

    #[test]
    fn read_only_callback_leaves_text_unchanged() {
        let (text, count) = scan_with("k=a; k=b;", "k=[v];", |_| {});
        assert_eq!(text, "k=a; k=b;");
        assert_eq!(count, 2);
    }

    #[test]
    fn whitespace_only_accepts_the_four_gap_characters() {
        assert!(whitespace_only(""));
        assert!(whitespace_only(" \t\r\n"));
        assert!(!whitespace_only(" x "));
        // Unicode whitespace is not gap whitespace.
        assert!(!whitespace_only("\u{a0}"));
    }
}
