//! Automaton match iterator and overlap-suppression policies.

use super::{Ac, ROOT};
use crate::trie::WordId;
use crate::xstring::fold::ScanText;
use rustc_hash::FxHashSet;
use std::collections::VecDeque;

/// Options for [`Ac::matches_with`].
#[derive(Debug, Clone, Copy)]
pub struct MatchOptions<'s> {
    /// When set, a match must be bounded on both sides by a separator
    /// codepoint or a text boundary (whole-token semantics).
    pub separators: Option<&'s FxHashSet<char>>,
    /// `true` (the default) reports every qualifying match, nested
    /// spans included. `false` keeps only leftmost-longest
    /// non-overlapping matches: of the qualifying candidates, the
    /// longest one at the leftmost start wins and everything
    /// overlapping it is dropped.
    pub return_all: bool,
    /// Additionally discard any match whose span is a strict subset of
    /// another reported match's span, even across different starts.
    pub no_substring: bool,
}

impl<'s> MatchOptions<'s> {
    /// The defaults: no separators, `return_all = true`,
    /// `no_substring = false`.
    pub fn new() -> Self {
        MatchOptions {
            separators: None,
            return_all: true,
            no_substring: false,
        }
    }

    /// Require matches to be separator-bounded on both sides.
    pub fn separators(mut self, set: &'s FxHashSet<char>) -> Self {
        self.separators = Some(set);
        self
    }

    /// Keep only leftmost-longest non-overlapping matches.
    pub fn leftmost_longest(mut self) -> Self {
        self.return_all = false;
        self
    }

    /// Suppress matches strictly contained in another reported match.
    pub fn no_substring(mut self) -> Self {
        self.no_substring = true;
        self
    }
}

impl Default for MatchOptions<'_> {
    fn default() -> Self {
        MatchOptions::new()
    }
}

/// Lazy iterator over automaton matches as `(id, start, end)` char
/// spans in the original text.
///
/// Matches surface in increasing end position; several words ending at
/// the same position come longest first (the state's output set
/// follows the fail chain deepest-first). The suppression policies
/// need the whole scan before they can decide, so with
/// `return_all = false` or `no_substring = true` the iterator buffers
/// the filtered result up front; the default configuration streams.
pub struct Matches<'t, 'a> {
    inner: Inner<'t, 'a>,
}

enum Inner<'t, 'a> {
    Stream(Scan<'t, 'a>),
    Buffered(VecDeque<(WordId, usize, usize)>),
}

/// Raw automaton scan state, shared by both modes.
struct Scan<'t, 'a> {
    ac: &'t Ac<'a>,
    scan: ScanText,
    separators: Option<FxHashSet<char>>,
    state: u32,
    pos: usize,
    /// Qualifying matches at the current end position, deepest first.
    queue: VecDeque<(WordId, usize, usize)>,
}

impl<'t, 'a> Scan<'t, 'a> {
    fn new(ac: &'t Ac<'a>, text: &str, separators: Option<&FxHashSet<char>>) -> Self {
        Scan {
            ac,
            scan: ScanText::new(text, ac.ignore_case()),
            separators: separators.cloned(),
            state: ROOT,
            pos: 0,
            queue: VecDeque::new(),
        }
    }

    fn boundary_ok(&self, start: usize, end: usize) -> bool {
        match &self.separators {
            None => true,
            Some(set) => {
                (start == 0 || set.contains(&self.scan.at(start - 1)))
                    && (end == self.scan.len() || set.contains(&self.scan.at(end)))
            }
        }
    }

    /// Next qualifying match in folded coordinates.
    fn next_folded(&mut self) -> Option<(WordId, usize, usize)> {
        loop {
            if let Some(m) = self.queue.pop_front() {
                return Some(m);
            }
            if self.pos >= self.scan.len() {
                return None;
            }
            let ch = self.scan.at(self.pos);
            while self.state != ROOT && self.ac.repr.child(self.state, ch).is_none() {
                self.state = self.ac.repr.fail_of(self.state);
            }
            self.state = self.ac.repr.child(self.state, ch).unwrap_or(ROOT);
            let end = self.pos + 1;
            for id in self.ac.repr.outputs_of(self.state) {
                let char_len = match self.ac.repr.value_entry(id) {
                    Ok(entry) => entry.char_len as usize,
                    Err(_) => continue,
                };
                let start = end - char_len;
                if self.boundary_ok(start, end) {
                    self.queue.push_back((id, start, end));
                }
            }
            self.pos += 1;
        }
    }

    fn translate(&self, m: (WordId, usize, usize)) -> (WordId, usize, usize) {
        (m.0, self.scan.translate(m.1), self.scan.translate(m.2))
    }
}

impl<'t, 'a> Matches<'t, 'a> {
    pub(crate) fn new(ac: &'t Ac<'a>, text: &str, options: &MatchOptions<'_>) -> Self {
        let mut scan = Scan::new(ac, text, options.separators);
        if options.return_all && !options.no_substring {
            return Matches {
                inner: Inner::Stream(scan),
            };
        }

        // Filtering needs the whole candidate set; collect in folded
        // coordinates so fold expansion cannot blur containment.
        let mut candidates = Vec::new();
        while let Some(m) = scan.next_folded() {
            candidates.push(m);
        }
        candidates.sort_by(|a, b| a.1.cmp(&b.1).then(b.2.cmp(&a.2)));

        let kept: Vec<(WordId, usize, usize)> = if !options.return_all {
            // Leftmost-longest, non-overlapping.
            let mut kept = Vec::new();
            let mut last_end = 0usize;
            for &(id, start, end) in &candidates {
                if start >= last_end {
                    kept.push((id, start, end));
                    last_end = end;
                }
            }
            kept
        } else {
            // Drop strict-subset spans: sorted by (start asc, end
            // desc), a span is nested iff some earlier span reaches at
            // least as far.
            let mut kept = Vec::new();
            let mut max_end = 0usize;
            for &(id, start, end) in &candidates {
                if end > max_end {
                    kept.push((id, start, end));
                    max_end = end;
                }
            }
            kept
        };

        Matches {
            inner: Inner::Buffered(kept.into_iter().map(|m| scan.translate(m)).collect()),
        }
    }
}

impl Iterator for Matches<'_, '_> {
    type Item = (WordId, usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            Inner::Stream(scan) => scan.next_folded().map(|m| scan.translate(m)),
            Inner::Buffered(queue) => queue.pop_front(),
        }
    }
}
