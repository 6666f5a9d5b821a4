//! Prefix tree over Unicode keys.
//!
//! Keys map to dense integer word ids handed out by the arena's
//! allocator, so removed ids are recycled LIFO by later insertions.
//! With `ignore_case` every key and every queried text is case-folded
//! first and all reported offsets are translated back to the original
//! text; with `ordered` child lists stay sorted by codepoint and
//! predictive enumeration yields keys lexicographically.

pub mod scan;
mod serial;

pub use scan::{MatchLongest, Predict, Prefix};
pub(crate) use serial::TrieView;

use crate::arena::{Arena, INVALID_ID};
use crate::error::Error;
use crate::xstring::fold::fold_word;
use crate::xstring::XString;
use smallvec::SmallVec;

/// Integer handle for an inserted word.
pub type WordId = u32;

pub(crate) const ROOT: u32 = 0;

#[derive(Debug, Clone)]
pub(crate) struct TrieNode {
    pub(crate) children: SmallVec<[(char, u32); 4]>,
    pub(crate) value: Option<u32>,
    pub(crate) parent: u32,
    pub(crate) parent_ch: char,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ValueEntry {
    /// Terminal node of the word.
    pub(crate) node: u32,
    /// Folded length in codepoints.
    pub(crate) char_len: u32,
}

#[derive(Debug, Clone)]
pub(crate) struct TrieData {
    pub(crate) nodes: Arena<TrieNode>,
    pub(crate) values: Arena<ValueEntry>,
}

impl TrieData {
    fn new() -> Self {
        let mut nodes = Arena::new();
        nodes.allocate(TrieNode {
            children: SmallVec::new(),
            value: None,
            parent: INVALID_ID,
            parent_ch: '\0',
        });
        TrieData {
            nodes,
            values: Arena::new(),
        }
    }
}

/// Owned arenas or a zero-copy view over a serialized buffer.
#[derive(Debug)]
pub(crate) enum TrieRepr<'a> {
    Owned(TrieData),
    View(TrieView<'a>),
}

impl TrieRepr<'_> {
    pub(crate) fn child(&self, node: u32, ch: char, ordered: bool) -> Option<u32> {
        match self {
            TrieRepr::Owned(data) => {
                let children = &data.nodes.get(node).ok()?.children;
                if ordered {
                    children
                        .binary_search_by_key(&ch, |&(c, _)| c)
                        .ok()
                        .map(|i| children[i].1)
                } else {
                    children.iter().find(|&&(c, _)| c == ch).map(|&(_, id)| id)
                }
            }
            TrieRepr::View(view) => view.child(node, ch, ordered),
        }
    }

    pub(crate) fn value_of(&self, node: u32) -> Option<u32> {
        match self {
            TrieRepr::Owned(data) => data.nodes.get(node).ok()?.value,
            TrieRepr::View(view) => view.value_of(node),
        }
    }

    pub(crate) fn parent_of(&self, node: u32) -> Option<(u32, char)> {
        match self {
            TrieRepr::Owned(data) => {
                let n = data.nodes.get(node).ok()?;
                if n.parent == INVALID_ID {
                    None
                } else {
                    Some((n.parent, n.parent_ch))
                }
            }
            TrieRepr::View(view) => view.parent_of(node),
        }
    }

    pub(crate) fn children_of(&self, node: u32) -> SmallVec<[(char, u32); 4]> {
        match self {
            TrieRepr::Owned(data) => data
                .nodes
                .get(node)
                .map(|n| n.children.clone())
                .unwrap_or_default(),
            TrieRepr::View(view) => view.children_of(node),
        }
    }

    pub(crate) fn value_entry(&self, id: WordId) -> Result<ValueEntry, Error> {
        match self {
            TrieRepr::Owned(data) => data.values.get(id).copied(),
            TrieRepr::View(view) => view.value_entry(id),
        }
    }

    pub(crate) fn live_values(&self) -> usize {
        match self {
            TrieRepr::Owned(data) => data.values.live(),
            TrieRepr::View(view) => view.live_values(),
        }
    }

    pub(crate) fn value_count(&self) -> u32 {
        match self {
            TrieRepr::Owned(data) => data.values.len() as u32,
            TrieRepr::View(view) => view.value_count(),
        }
    }
}

/// Ordered or unordered prefix tree mapping Unicode keys to word ids.
///
/// The lifetime parameter is `'static` for owned tries; tries
/// reconstructed with [`Trie::from_buff`] and `copy = false` borrow the
/// caller's buffer instead (see [`Trie::into_owned`]).
///
/// # Example
///
/// ```rust,ignore
/// let mut trie = Trie::new();
/// let id = trie.insert("ruby").unwrap();
/// assert_eq!(trie.lookup("ruby"), Some(id));
/// for (id, start, end) in trie.match_longest("ruby on rails", None) {
///     println!("{id} at {start}..{end}");
/// }
/// ```
#[derive(Debug)]
pub struct Trie<'a> {
    pub(crate) repr: TrieRepr<'a>,
    ignore_case: bool,
    ordered: bool,
}

/// Construction-time configuration for [`Trie`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TrieBuilder {
    ignore_case: bool,
    ordered: bool,
}

impl TrieBuilder {
    /// Case-fold keys and query text before matching.
    pub fn ignore_case(mut self, yes: bool) -> Self {
        self.ignore_case = yes;
        self
    }

    /// Keep child transitions sorted by codepoint; `predict` then
    /// enumerates keys in lexicographic order.
    pub fn ordered(mut self, yes: bool) -> Self {
        self.ordered = yes;
        self
    }

    /// Build an empty trie with this configuration.
    pub fn build(self) -> Trie<'static> {
        Trie {
            repr: TrieRepr::Owned(TrieData::new()),
            ignore_case: self.ignore_case,
            ordered: self.ordered,
        }
    }
}

impl Trie<'static> {
    /// An empty exact-case, unordered trie.
    pub fn new() -> Self {
        TrieBuilder::default().build()
    }
}

impl Default for Trie<'static> {
    fn default() -> Self {
        Trie::new()
    }
}

impl<'a> Trie<'a> {
    /// Start configuring a new trie.
    pub fn builder() -> TrieBuilder {
        TrieBuilder::default()
    }

    /// Whether keys and text are case-folded before matching.
    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    /// Whether child transitions are kept sorted.
    pub fn ordered(&self) -> bool {
        self.ordered
    }

    /// Number of words currently stored.
    pub fn len(&self) -> usize {
        self.repr.live_values()
    }

    /// True when no words are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert `word`, returning its id.
    ///
    /// Returns `None` for the empty string (a zero-length key cannot be
    /// indexed). Inserting a word already present after folding returns
    /// the existing id without touching the structure. Fresh ids reuse
    /// the most recently removed id first.
    pub fn insert(&mut self, word: &str) -> Option<WordId> {
        if word.is_empty() {
            return None;
        }
        let folded = fold_word(word, self.ignore_case);
        let ordered = self.ordered;
        let data = self.data_mut();
        let char_len = folded.len() as u32;

        let mut node = ROOT;
        for ch in folded {
            node = match find_child(&data.nodes[node].children, ch, ordered) {
                Some(next) => next,
                None => {
                    let next = data.nodes.allocate(TrieNode {
                        children: SmallVec::new(),
                        value: None,
                        parent: node,
                        parent_ch: ch,
                    });
                    add_child(&mut data.nodes[node].children, ch, next, ordered);
                    next
                }
            };
        }
        if let Some(existing) = data.nodes[node].value {
            return Some(existing);
        }
        let id = data.values.allocate(ValueEntry { node, char_len });
        data.nodes[node].value = Some(id);
        Some(id)
    }

    /// Remove `word`, returning the id it held, or `None` (with no
    /// mutation) when the word is absent.
    ///
    /// Chain nodes that no longer lead to any word are released back to
    /// the arena; the freed word id becomes the next one assigned.
    pub fn remove(&mut self, word: &str) -> Option<WordId> {
        if word.is_empty() {
            return None;
        }
        let folded = fold_word(word, self.ignore_case);
        let ordered = self.ordered;
        self.ensure_owned();
        let data = match &mut self.repr {
            TrieRepr::Owned(data) => data,
            TrieRepr::View(_) => unreachable!("ensure_owned converts the view"),
        };

        let mut node = ROOT;
        for ch in folded {
            node = find_child(&data.nodes[node].children, ch, ordered)?;
        }
        let id = data.nodes[node].value.take()?;
        let _ = data.values.release(id);

        // Prune the now-dangling chain bottom-up.
        let mut cur = node;
        while cur != ROOT {
            let (parent, ch) = {
                let n = &data.nodes[cur];
                if n.value.is_some() || !n.children.is_empty() {
                    break;
                }
                (n.parent, n.parent_ch)
            };
            let _ = data.nodes.release(cur);
            data.nodes[parent].children.retain(|&mut (c, _)| c != ch);
            cur = parent;
        }
        Some(id)
    }

    /// The id of `word`, if present.
    pub fn lookup(&self, word: &str) -> Option<WordId> {
        if word.is_empty() {
            return None;
        }
        let mut node = ROOT;
        for ch in fold_word(word, self.ignore_case) {
            node = self.repr.child(node, ch, self.ordered)?;
        }
        self.repr.value_of(node)
    }

    /// Whether `word` is present.
    pub fn contains(&self, word: &str) -> bool {
        self.lookup(word).is_some()
    }

    /// Reconstruct the stored key for `id` by walking parent links from
    /// its terminal node. Returns the folded form when `ignore_case`.
    ///
    /// Fails with [`Error::OutOfRange`] for an id never assigned and
    /// [`Error::InvalidHandle`] for one that has been removed and not
    /// yet reused.
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

    /// Iterate over `(word, id)` pairs in id order (insertion order
    /// when nothing has been removed).
    pub fn iter(&self) -> impl Iterator<Item = (String, WordId)> + '_ {
        (0..self.repr.value_count()).filter_map(move |id| self.word(id).ok().map(|w| (w, id)))
    }

    /// Lazily enumerate every key that is a prefix of `text`, shortest
    /// first, as `(id, end)` with `end` a char offset into `text`.
    pub fn prefix<'t>(&'t self, text: &str) -> Prefix<'t, 'a> {
        Prefix::new(self, text)
    }

    /// Lazily enumerate the ids of every key starting with
    /// `prefix_text`. Lexicographic key order when the trie is ordered,
    /// storage order otherwise.
    pub fn predict<'t>(&'t self, prefix_text: &str) -> Predict<'t, 'a> {
        Predict::new(self, prefix_text)
    }

    /// Scan `text` left to right for non-overlapping longest matches,
    /// yielding `(id, start, end)` char spans in the original text.
    ///
    /// With a separator set, a candidate only qualifies when the
    /// codepoint after it is a separator or end-of-text; a disqualified
    /// longer match falls back to the next-longest qualifying one.
    pub fn match_longest<'t, 's>(
        &'t self,
        text: &str,
        separators: Option<&'s rustc_hash::FxHashSet<char>>,
    ) -> MatchLongest<'t, 'a, 's> {
        MatchLongest::new(self, text, separators)
    }

    /// Rebuild `text` with every longest match replaced by the output
    /// of `producer(id, start, end)`, copying unmatched spans verbatim.
    ///
    /// A producer error aborts immediately; no partial text is
    /// returned.
    pub fn replace_longest<F, E>(
        &self,
        text: &str,
        mut producer: F,
        separators: Option<&rustc_hash::FxHashSet<char>>,
    ) -> Result<String, E>
    where
        F: FnMut(WordId, usize, usize) -> Result<String, E>,
    {
        let index = XString::from(text);
        let mut out = String::with_capacity(text.len());
        let mut last_end = 0usize;
        for (id, start, end) in self.match_longest(text, separators) {
            out.push_str(&text[index.byte_at(last_end)..index.byte_at(start)]);
            out.push_str(&producer(id, start, end)?);
            last_end = end;
        }
        out.push_str(&text[index.byte_at(last_end)..]);
        Ok(out)
    }

    /// Detach a zero-copy trie from its backing buffer by cloning into
    /// owned arenas. A no-op for tries that already own their storage.
    pub fn into_owned(mut self) -> Trie<'static> {
        self.ensure_owned();
        let data = match self.repr {
            TrieRepr::Owned(data) => data,
            TrieRepr::View(_) => unreachable!("ensure_owned converts the view"),
        };
        Trie {
            repr: TrieRepr::Owned(data),
            ignore_case: self.ignore_case,
            ordered: self.ordered,
        }
    }

    pub(crate) fn from_parts(repr: TrieRepr<'a>, ignore_case: bool, ordered: bool) -> Self {
        Trie {
            repr,
            ignore_case,
            ordered,
        }
    }

    /// Mutation goes through owned arenas; a borrowed view converts on
    /// first write (copy-on-write).
    fn ensure_owned(&mut self) {
        if let TrieRepr::View(view) = &self.repr {
            self.repr = TrieRepr::Owned(view.to_data());
        }
    }

    fn data_mut(&mut self) -> &mut TrieData {
        self.ensure_owned();
        match &mut self.repr {
            TrieRepr::Owned(data) => data,
            TrieRepr::View(_) => unreachable!("ensure_owned converts the view"),
        }
    }
}

pub(crate) fn find_child(
    children: &SmallVec<[(char, u32); 4]>,
    ch: char,
    ordered: bool,
) -> Option<u32> {
    if ordered {
        children
            .binary_search_by_key(&ch, |&(c, _)| c)
            .ok()
            .map(|i| children[i].1)
    } else {
        children.iter().find(|&&(c, _)| c == ch).map(|&(_, id)| id)
    }
}

fn add_child(children: &mut SmallVec<[(char, u32); 4]>, ch: char, id: u32, ordered: bool) {
    if ordered {
        match children.binary_search_by_key(&ch, |&(c, _)| c) {
            Ok(_) => {}
            Err(pos) => children.insert(pos, (ch, id)),
        }
    } else {
        children.push((ch, id));
    }
}
