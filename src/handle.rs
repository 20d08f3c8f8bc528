//! Transient per-match view handed to the scan callback.

use std::ops::Range;

use crate::scanner::{Capture, Captures, Match};

/// One queued replacement, with a char range relative to the match
/// snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Edit {
    pub range: Range<usize>,
    pub text: String,
}

/// A view bound to one [`Match`], valid only for the lifetime of one
/// callback invocation.
///
/// Reads come from the snapshot taken at match time. Writes are *queued*:
/// each mutation records a snapshot-relative `(range, replacement)` pair,
/// and the scanner validates the set (ranges must not overlap) and splices
/// it into the buffer as one atomic edit after the callback returns. That
/// keeps several edits in one callback consistent with each other.
pub struct MatchHandle<'m> {
    mat: &'m Match,
    edits: Vec<Edit>,
}

impl<'m> MatchHandle<'m> {
    pub(crate) fn new(mat: &'m Match) -> Self {
        Self {
            mat,
            edits: Vec::new(),
        }
    }

    /// Start of the matched span (absolute char offset at match time).
    pub fn start(&self) -> usize {
        self.mat.start()
    }

    /// End of the matched span (exclusive).
    pub fn end(&self) -> usize {
        self.mat.end()
    }

    /// The matched span's text, snapshotted at match time.
    pub fn matched_text(&self) -> &str {
        self.mat.text()
    }

    pub fn captures(&self) -> &Captures {
        self.mat.captures()
    }

    /// Captured text for `name`, or `""` when no capture with that name
    /// exists. Absence is not an error.
    pub fn value(&self, name: &str) -> &str {
        self.mat.captures().value(name)
    }

    /// The full capture record for `name`, or `None` when absent.
    pub fn capture(&self, name: &str) -> Option<&Capture> {
        self.mat.captures().get(name)
    }

    /// Queue a replacement of one capture's span. Returns `false` when no
    /// capture with that name exists.
    pub fn set_value(&mut self, name: &str, new_text: &str) -> bool {
        match self.mat.captures().get(name) {
            Some(cap) => {
                let len = cap.value.chars().count();
                self.edits.push(Edit {
                    range: cap.offset..cap.offset + len,
                    text: new_text.to_string(),
                });
                true
            }
            None => false,
        }
    }

    /// Queue a replacement of the entire matched span.
    pub fn replace(&mut self, text: &str) {
        let len = self.mat.end() - self.mat.start();
        self.edits.push(Edit {
            range: 0..len,
            text: text.to_string(),
        });
    }

    /// Compute a replacement for the entire matched span from the capture
    /// set and queue it. The recommended path when several captures feed
    /// one rewrite.
    pub fn modify_body(&mut self, f: impl FnOnce(&Captures) -> String) {
        let text = f(self.mat.captures());
        self.replace(&text);
    }

    pub(crate) fn into_edits(self) -> Vec<Edit> {
        self.edits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_match() -> Match {
        // Matched span "k= a =v;" at offset 10 with captures "pre" and
        // "val".
        let mut captures = Captures::default();
        captures.record("pre".to_string(), " a ".to_string(), 12, 2);
        captures.record("val".to_string(), "v".to_string(), 16, 6);
        Match::new(10, 18, "k= a =v;".to_string(), captures)
    }

    #[test]
    fn value_lookup() {
        let mat = sample_match();
        let handle = MatchHandle::new(&mat);
        assert_eq!(handle.value("pre"), " a ");
        assert_eq!(handle.value("val"), "v");
    }

    #[test]
    fn absent_value_is_empty_not_an_error() {
        let mat = sample_match();
        let handle = MatchHandle::new(&mat);
        assert_eq!(handle.value("nope"), "");
        assert!(handle.capture("nope").is_none());
    }

    #[test]
    fn capture_carries_absolute_index() {
        let mat = sample_match();
        let handle = MatchHandle::new(&mat);
        let cap = handle.capture("val").unwrap();
        assert_eq!(cap.index, 16);
        assert_eq!(cap.value, "v");
    }

    #[test]
    fn span_accessors() {
        let mat = sample_match();
        let handle = MatchHandle::new(&mat);
        assert_eq!(handle.start(), 10);
        assert_eq!(handle.end(), 18);
        assert_eq!(handle.matched_text(), "k= a =v;");
    }

    #[test]
    fn set_value_queues_snapshot_relative_range() {
        let mat = sample_match();
        let mut handle = MatchHandle::new(&mat);
        assert!(handle.set_value("pre", "x"));
        assert!(!handle.set_value("nope", "x"));
        let edits = handle.into_edits();
        assert_eq!(
            edits,
            vec![Edit {
                range: 2..5,
                text: "x".to_string()
            }]
        );
    }

    #[test]
    fn replace_queues_whole_span() {
        let mat = sample_match();
        let mut handle = MatchHandle::new(&mat);
        handle.replace("done");
        let edits = handle.into_edits();
        assert_eq!(
            edits,
            vec![Edit {
                range: 0..8,
                text: "done".to_string()
            }]
        );
    }

    #[test]
    fn modify_body_sees_all_captures() {
        let mat = sample_match();
        let mut handle = MatchHandle::new(&mat);
        handle.modify_body(|caps| format!("{}={}", caps.value("pre").trim(), caps.value("val")));
        let edits = handle.into_edits();
        assert_eq!(edits[0].text, "a=v");
        assert_eq!(edits[0].range, 0..8);
    }
}
