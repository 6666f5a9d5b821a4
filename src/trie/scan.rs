//! Lazy scan iterators over a trie.
//!
//! Each iterator owns its cursor and borrows the trie, so dropping one
//! early costs nothing and cannot corrupt the structure. When the trie
//! is case-insensitive, scans walk the folded text and translate every
//! reported offset back to the original text.

use super::{Trie, WordId, ROOT};
use crate::xstring::fold::ScanText;
use rustc_hash::FxHashSet;

/// Iterator over every key that prefixes the scanned text, shortest
/// first. Yields `(id, end)` char offsets into the original text.
pub struct Prefix<'t, 'a> {
    trie: &'t Trie<'a>,
    scan: ScanText,
    node: u32,
    pos: usize,
    done: bool,
}

impl<'t, 'a> Prefix<'t, 'a> {
    pub(crate) fn new(trie: &'t Trie<'a>, text: &str) -> Self {
        Prefix {
            trie,
            scan: ScanText::new(text, trie.ignore_case()),
            node: ROOT,
            pos: 0,
            done: false,
        }
    }
}

impl Iterator for Prefix<'_, '_> {
    type Item = (WordId, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        while self.pos < self.scan.len() {
            let ch = self.scan.at(self.pos);
            match self.trie.repr.child(self.node, ch, self.trie.ordered()) {
                Some(next) => {
                    self.node = next;
                    self.pos += 1;
                    if let Some(id) = self.trie.repr.value_of(self.node) {
                        return Some((id, self.scan.translate(self.pos)));
                    }
                }
                None => break,
            }
        }
        self.done = true;
        None
    }
}

/// Iterator over the ids of every key extending a given prefix.
///
/// Pre-order traversal emitting a node's own key before its
/// descendants; with an ordered trie the children are sorted, so the
/// overall order is lexicographic.
pub struct Predict<'t, 'a> {
    trie: &'t Trie<'a>,
    stack: Vec<u32>,
}

impl<'t, 'a> Predict<'t, 'a> {
    pub(crate) fn new(trie: &'t Trie<'a>, prefix_text: &str) -> Self {
        let mut node = Some(ROOT);
        for ch in crate::xstring::fold::fold_word(prefix_text, trie.ignore_case()) {
            node = node.and_then(|n| trie.repr.child(n, ch, trie.ordered()));
        }
        Predict {
            trie,
            stack: node.into_iter().collect(),
        }
    }
}

impl Iterator for Predict<'_, '_> {
    type Item = WordId;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            let children = self.trie.repr.children_of(node);
            self.stack.extend(children.iter().rev().map(|&(_, id)| id));
            if let Some(id) = self.trie.repr.value_of(node) {
                return Some(id);
            }
        }
        None
    }
}

/// Iterator over non-overlapping longest matches, `(id, start, end)`
/// char spans in the original text.
pub struct MatchLongest<'t, 'a, 's> {
    trie: &'t Trie<'a>,
    scan: ScanText,
    separators: Option<&'s FxHashSet<char>>,
    pos: usize,
}

impl<'t, 'a, 's> MatchLongest<'t, 'a, 's> {
    pub(crate) fn new(
        trie: &'t Trie<'a>,
        text: &str,
        separators: Option<&'s FxHashSet<char>>,
    ) -> Self {
        MatchLongest {
            trie,
            scan: ScanText::new(text, trie.ignore_case()),
            separators,
            pos: 0,
        }
    }

    /// A match ending at `end` qualifies when no separator set is given,
    /// or when it is followed by a separator or end-of-text.
    fn boundary_ok(&self, end: usize) -> bool {
        match self.separators {
            None => true,
            Some(set) => end == self.scan.len() || set.contains(&self.scan.at(end)),
        }
    }
}

impl Iterator for MatchLongest<'_, '_, '_> {
    type Item = (WordId, usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let len = self.scan.len();
        while self.pos < len {
            let mut node = ROOT;
            let mut best: Option<(WordId, usize)> = None;
            let mut q = self.pos;
            while q < len {
                match self.trie.repr.child(node, self.scan.at(q), self.trie.ordered()) {
                    Some(next) => {
                        node = next;
                        q += 1;
                        if let Some(id) = self.trie.repr.value_of(node) {
                            if self.boundary_ok(q) {
                                best = Some((id, q));
                            }
                        }
                    }
                    None => break,
                }
            }
            match best {
                Some((id, end)) => {
                    let span = (
                        id,
                        self.scan.translate(self.pos),
                        self.scan.translate(end),
                    );
                    self.pos = end;
                    return Some(span);
                }
                None => self.pos += 1,
            }
        }
        None
    }
}
