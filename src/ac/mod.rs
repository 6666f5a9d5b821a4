//! Aho-Corasick automaton for single-pass multi-pattern matching.
//!
//! Built once from a word set and immutable afterwards; changing the
//! set means rebuilding. Construction inserts the (folded,
//! deduplicated) words into a goto trie, then a breadth-first pass
//! derives each state's failure link and accumulated output set, so
//! matching never rescans text after a mismatch.

mod matcher;
mod serial;

pub use matcher::{MatchOptions, Matches};
pub(crate) use serial::AcView;

use crate::arena::{Arena, INVALID_ID};
use crate::error::Error;
use crate::trie::{ValueEntry, WordId};
use crate::xstring::fold::fold_word;
use smallvec::SmallVec;
use std::collections::VecDeque;

pub(crate) const ROOT: u32 = 0;

#[derive(Debug, Clone)]
pub(crate) struct AcNode {
    pub(crate) children: SmallVec<[(char, u32); 4]>,
    pub(crate) value: Option<u32>,
    pub(crate) parent: u32,
    pub(crate) parent_ch: char,
    /// State reached on mismatch: longest proper suffix of this
    /// state's path that is also a prefix of some word.
    pub(crate) fail: u32,
    /// Word ids recognized at this state, deepest first: the state's
    /// own word followed by everything inherited along the fail chain.
    pub(crate) outputs: SmallVec<[u32; 2]>,
}

#[derive(Debug, Clone)]
pub(crate) struct AcData {
    pub(crate) nodes: Arena<AcNode>,
    pub(crate) values: Arena<ValueEntry>,
}

/// Owned arenas or a zero-copy view over a serialized buffer.
#[derive(Debug)]
pub(crate) enum AcRepr<'a> {
    Owned(AcData),
    View(AcView<'a>),
}

impl AcRepr<'_> {
    pub(crate) fn child(&self, node: u32, ch: char) -> Option<u32> {
        match self {
            AcRepr::Owned(data) => data
                .nodes
                .get(node)
                .ok()?
                .children
                .iter()
                .find(|&&(c, _)| c == ch)
                .map(|&(_, id)| id),
            AcRepr::View(view) => view.child(node, ch),
        }
    }

    pub(crate) fn fail_of(&self, node: u32) -> u32 {
        match self {
            AcRepr::Owned(data) => data.nodes.get(node).map(|n| n.fail).unwrap_or(ROOT),
            AcRepr::View(view) => view.fail_of(node),
        }
    }

    pub(crate) fn outputs_of(&self, node: u32) -> SmallVec<[u32; 4]> {
        match self {
            AcRepr::Owned(data) => data
                .nodes
                .get(node)
                .map(|n| n.outputs.iter().copied().collect())
                .unwrap_or_default(),
            AcRepr::View(view) => view.outputs_of(node),
        }
    }

    pub(crate) fn parent_of(&self, node: u32) -> Option<(u32, char)> {
        match self {
            AcRepr::Owned(data) => {
                let n = data.nodes.get(node).ok()?;
                if n.parent == INVALID_ID {
                    None
                } else {
                    Some((n.parent, n.parent_ch))
                }
            }
            AcRepr::View(view) => view.parent_of(node),
        }
    }

    pub(crate) fn value_entry(&self, id: WordId) -> Result<ValueEntry, Error> {
        match self {
            AcRepr::Owned(data) => data.values.get(id).copied(),
            AcRepr::View(view) => view.value_entry(id),
        }
    }

    pub(crate) fn value_count(&self) -> u32 {
        match self {
            AcRepr::Owned(data) => data.values.len() as u32,
            AcRepr::View(view) => view.value_count(),
        }
    }
}

/// An immutable multi-pattern matcher over a fixed word set.
///
/// The lifetime parameter is `'static` for built or copied automata;
/// automata reconstructed with [`Ac::from_buff`] and `copy = false`
/// borrow the caller's buffer (see [`Ac::into_owned`]).
///
/// # Example
///
/// ```rust,ignore
/// let ac = Ac::build(["he", "she", "his"], false);
/// for (id, start, end) in ac.matches("she sells") {
///     println!("{id} at {start}..{end}");
/// }
/// ```
#[derive(Debug)]
pub struct Ac<'a> {
    pub(crate) repr: AcRepr<'a>,
    ignore_case: bool,
}

impl Ac<'static> {
    /// Build an automaton from `words`, folding them first when
    /// `ignore_case`.
    ///
    /// Ids are assigned in first-seen order; duplicate folded words are
    /// deduplicated up front and report the first occurrence's id.
    /// Empty words are skipped.
    pub fn build<I, S>(words: I, ignore_case: bool) -> Ac<'static>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut nodes: Arena<AcNode> = Arena::new();
        nodes.allocate(AcNode {
            children: SmallVec::new(),
            value: None,
            parent: INVALID_ID,
            parent_ch: '\0',
            fail: ROOT,
            outputs: SmallVec::new(),
        });
        let mut values: Arena<ValueEntry> = Arena::new();

        // Goto trie over the deduplicated word set.
        for word in words {
            let folded = fold_word(word.as_ref(), ignore_case);
            if folded.is_empty() {
                continue;
            }
            let char_len = folded.len() as u32;
            let mut node = ROOT;
            for ch in folded {
                node = match nodes[node].children.iter().find(|&&(c, _)| c == ch) {
                    Some(&(_, next)) => next,
                    None => {
                        let next = nodes.allocate(AcNode {
                            children: SmallVec::new(),
                            value: None,
                            parent: node,
                            parent_ch: ch,
                            fail: ROOT,
                            outputs: SmallVec::new(),
                        });
                        nodes[node].children.push((ch, next));
                        next
                    }
                };
            }
            if nodes[node].value.is_none() {
                let id = values.allocate(ValueEntry { node, char_len });
                nodes[node].value = Some(id);
            }
        }

        // Breadth-first failure-link pass. A state's fail target is
        // strictly shallower, so its outputs are final by the time the
        // state is dequeued.
        let mut queue: VecDeque<u32> = VecDeque::new();
        let depth_one: Vec<u32> = nodes[ROOT].children.iter().map(|&(_, id)| id).collect();
        queue.extend(depth_one);
        while let Some(state) = queue.pop_front() {
            let fail = nodes[state].fail;
            let mut outputs: SmallVec<[u32; 2]> = SmallVec::new();
            if let Some(id) = nodes[state].value {
                outputs.push(id);
            }
            outputs.extend(nodes[fail].outputs.iter().copied());
            nodes[state].outputs = outputs;

            let children = nodes[state].children.clone();
            for (ch, child) in children {
                let mut probe = nodes[state].fail;
                let target = loop {
                    if let Some(&(_, next)) =
                        nodes[probe].children.iter().find(|&&(c, _)| c == ch)
                    {
                        if next != child {
                            break next;
                        }
                    }
                    if probe == ROOT {
                        break ROOT;
                    }
                    probe = nodes[probe].fail;
                };
                nodes[child].fail = target;
                queue.push_back(child);
            }
        }

        Ac {
            repr: AcRepr::Owned(AcData { nodes, values }),
            ignore_case,
        }
    }
}

impl<'a> Ac<'a> {
    /// Number of distinct (folded) words in the automaton.
    pub fn size(&self) -> usize {
        self.repr.value_count() as usize
    }

    /// Whether words and text are case-folded before matching.
    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    /// Reconstruct the stored word for `id` (folded form when
    /// `ignore_case`).
    pub fn word(&self, id: WordId) -> Result<String, Error> {
        let entry = self.repr.value_entry(id)?;
        let mut chars: Vec<char> = Vec::with_capacity(entry.char_len as usize);
        let mut cur = entry.node;
        while let Some((parent, ch)) = self.repr.parent_of(cur) {
            chars.push(ch);
            cur = parent;
        }
        chars.reverse();
        Ok(chars.into_iter().collect())
    }

    /// Match `text` with default options: no separators, every
    /// qualifying match reported (`return_all`), nested spans included.
    pub fn matches<'t>(&'t self, text: &str) -> Matches<'t, 'a> {
        self.matches_with(text, &MatchOptions::default())
    }

    /// Match `text` with explicit separator and suppression options.
    pub fn matches_with<'t>(&'t self, text: &str, options: &MatchOptions<'_>) -> Matches<'t, 'a> {
        Matches::new(self, text, options)
    }

    /// Detach a zero-copy automaton from its backing buffer by cloning
    /// into owned arenas.
    pub fn into_owned(self) -> Ac<'static> {
        let data = match self.repr {
            AcRepr::Owned(data) => data,
            AcRepr::View(view) => view.to_data(),
        };
        Ac {
            repr: AcRepr::Owned(data),
            ignore_case: self.ignore_case,
        }
    }

    pub(crate) fn from_parts(repr: AcRepr<'a>, ignore_case: bool) -> Self {
        Ac { repr, ignore_case }
    }
}
