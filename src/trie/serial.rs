//! Trie half of the buffer codec: exact-size encoding, validated
//! decoding and the zero-copy view.

use super::{Trie, TrieData, TrieNode, TrieRepr, ValueEntry};
use crate::arena::{Arena, INVALID_ID};
use crate::buffer::{
    carve, decode_u32_list, read_u32, Header, RecordReader, StructureKind, FLAG_TERMINAL,
    FLAG_VACANT, HEADER_LEN,
};
use crate::error::Error;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::path::Path;

/// One node slot in serialization form.
pub(crate) struct RawNode {
    pub(crate) vacant: bool,
    pub(crate) value: u32,
    pub(crate) parent: u32,
    pub(crate) parent_ch: u32,
    pub(crate) children: SmallVec<[(u32, u32); 4]>,
}

impl RawNode {
    fn encoded_len(&self) -> usize {
        if self.vacant {
            1
        } else {
            17 + 8 * self.children.len()
        }
    }
}

impl TrieRepr<'_> {
    pub(crate) fn node_count(&self) -> u32 {
        match self {
            TrieRepr::Owned(data) => data.nodes.len() as u32,
            TrieRepr::View(view) => view.node_count,
        }
    }

    fn raw_node(&self, id: u32) -> RawNode {
        match self {
            TrieRepr::Owned(data) => match data.nodes.get(id) {
                Ok(node) => RawNode {
                    vacant: false,
                    value: node.value.unwrap_or(INVALID_ID),
                    parent: node.parent,
                    parent_ch: node.parent_ch as u32,
                    children: node
                        .children
                        .iter()
                        .map(|&(ch, child)| (ch as u32, child))
                        .collect(),
                },
                Err(_) => RawNode {
                    vacant: true,
                    value: INVALID_ID,
                    parent: INVALID_ID,
                    parent_ch: 0,
                    children: SmallVec::new(),
                },
            },
            TrieRepr::View(view) => view.raw_node(id),
        }
    }

    fn raw_value(&self, id: u32) -> (u32, u32) {
        match self {
            TrieRepr::Owned(data) => match data.values.get(id) {
                Ok(entry) => (entry.node, entry.char_len),
                Err(_) => (INVALID_ID, 0),
            },
            TrieRepr::View(view) => view.raw_value(id),
        }
    }

    fn free_node_list(&self) -> Vec<u32> {
        match self {
            TrieRepr::Owned(data) => data.nodes.free_list().to_vec(),
            TrieRepr::View(view) => decode_u32_list(view.free_nodes),
        }
    }

    fn free_value_list(&self) -> Vec<u32> {
        match self {
            TrieRepr::Owned(data) => data.values.free_list().to_vec(),
            TrieRepr::View(view) => decode_u32_list(view.free_values),
        }
    }
}

impl Trie<'_> {
    /// Exact byte length of the serialized trie. Callers allocate this
    /// many bytes before [`Trie::to_buff`].
    pub fn buff_size(&self) -> usize {
        let node_count = self.repr.node_count() as usize;
        let value_count = self.repr.value_count() as usize;
        let records: usize = (0..node_count as u32)
            .map(|id| self.repr.raw_node(id).encoded_len())
            .sum();
        HEADER_LEN
            + 4 * node_count
            + records
            + 8 * value_count
            + 4 * self.repr.free_node_list().len()
            + 4 * self.repr.free_value_list().len()
    }

    /// Serialize into `buf`, which must hold at least
    /// [`Trie::buff_size`] bytes; exactly that many are written.
    pub fn to_buff(&self, buf: &mut [u8]) -> Result<(), Error> {
        let bytes = self.to_bytes();
        if buf.len() < bytes.len() {
            return Err(Error::UndersizedBuffer {
                need: bytes.len(),
                got: buf.len(),
            });
        }
        buf[..bytes.len()].copy_from_slice(&bytes);
        Ok(())
    }

    /// Write the serialized trie to a file of exactly
    /// [`Trie::buff_size`] bytes.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        std::fs::write(path, self.to_bytes())?;
        Ok(())
    }

    fn to_bytes(&self) -> Vec<u8> {
        let node_count = self.repr.node_count();
        let value_count = self.repr.value_count();
        let free_nodes = self.repr.free_node_list();
        let free_values = self.repr.free_value_list();

        let mut offsets = Vec::with_capacity(node_count as usize * 4);
        let mut records = Vec::new();
        for id in 0..node_count {
            offsets.extend_from_slice(&(records.len() as u32).to_le_bytes());
            let node = self.repr.raw_node(id);
            if node.vacant {
                records.push(FLAG_VACANT);
                continue;
            }
            records.push(if node.value == INVALID_ID {
                0
            } else {
                FLAG_TERMINAL
            });
            records.extend_from_slice(&node.value.to_le_bytes());
            records.extend_from_slice(&node.parent.to_le_bytes());
            records.extend_from_slice(&node.parent_ch.to_le_bytes());
            records.extend_from_slice(&(node.children.len() as u32).to_le_bytes());
            for &(ch, child) in &node.children {
                records.extend_from_slice(&ch.to_le_bytes());
                records.extend_from_slice(&child.to_le_bytes());
            }
        }

        let buff_len = HEADER_LEN
            + offsets.len()
            + records.len()
            + 8 * value_count as usize
            + 4 * free_nodes.len()
            + 4 * free_values.len();
        let mut out = Vec::with_capacity(buff_len);
        Header {
            kind: StructureKind::Trie,
            ignore_case: self.ignore_case(),
            ordered: self.ordered(),
            node_count,
            value_count,
            free_node_count: free_nodes.len() as u32,
            free_value_count: free_values.len() as u32,
            buff_len: buff_len as u64,
        }
        .write(&mut out);
        out.extend_from_slice(&offsets);
        out.extend_from_slice(&records);
        for id in 0..value_count {
            let (node, char_len) = self.repr.raw_value(id);
            out.extend_from_slice(&node.to_le_bytes());
            out.extend_from_slice(&char_len.to_le_bytes());
        }
        for id in free_nodes {
            out.extend_from_slice(&id.to_le_bytes());
        }
        for id in free_values {
            out.extend_from_slice(&id.to_le_bytes());
        }
        out
    }
}

impl<'a> Trie<'a> {
    /// Reconstruct a trie from a buffer produced by [`Trie::to_buff`]
    /// or [`Trie::save`].
    ///
    /// With `copy = true` the bytes are decoded into owned arenas; with
    /// `copy = false` the trie borrows `buf` and reads it in place, so
    /// `buf` must stay alive and unmodified for the trie's lifetime.
    /// The buffer is fully validated up front either way.
    pub fn from_buff(buf: &'a [u8], copy: bool) -> Result<Trie<'a>, Error> {
        let header = Header::parse(buf)?;
        if header.kind != StructureKind::Trie {
            return Err(Error::MalformedBuffer("buffer holds an automaton, not a trie"));
        }
        let view = TrieView::new(buf, &header)?;
        let repr = if copy {
            TrieRepr::Owned(view.to_data())
        } else {
            TrieRepr::View(view)
        };
        Ok(Trie::from_parts(repr, header.ignore_case, header.ordered))
    }

    /// Read a serialized trie from a file into owned storage.
    pub fn load(path: impl AsRef<Path>) -> Result<Trie<'static>, Error> {
        let bytes = std::fs::read(path)?;
        Ok(Trie::from_buff(&bytes, true)?.into_owned())
    }
}

/// Zero-copy view over a serialized trie.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TrieView<'a> {
    offsets: &'a [u8],
    nodes: &'a [u8],
    values: &'a [u8],
    free_nodes: &'a [u8],
    free_values: &'a [u8],
    node_count: u32,
    live_values: usize,
}

impl<'a> TrieView<'a> {
    fn new(buf: &'a [u8], header: &Header) -> Result<Self, Error> {
        let regions = carve(buf, header)?;
        let live_values = regions
            .values
            .chunks_exact(8)
            .filter(|pair| read_u32(pair, 0) != Some(INVALID_ID))
            .count();
        let view = TrieView {
            offsets: regions.offsets,
            nodes: regions.nodes,
            values: regions.values,
            free_nodes: regions.free_nodes,
            free_values: regions.free_values,
            node_count: header.node_count,
            live_values,
        };
        view.validate()?;
        Ok(view)
    }

    fn record(&self, id: u32) -> Option<RecordReader<'a>> {
        if id >= self.node_count {
            return None;
        }
        let off = read_u32(self.offsets, id as usize * 4)? as usize;
        Some(RecordReader::new(self.nodes, off))
    }

    /// Cursor positioned at `child_count` for an occupied record, or
    /// `None` for a vacant slot.
    fn occupied(&self, id: u32) -> Option<RecordReader<'a>> {
        let mut rec = self.record(id)?;
        let flags = rec.u8()?;
        if flags & FLAG_VACANT != 0 {
            return None;
        }
        rec.skip(12); // value, parent, parent_ch
        Some(rec)
    }

    pub(crate) fn child(&self, node: u32, ch: char, ordered: bool) -> Option<u32> {
        let mut rec = self.occupied(node)?;
        let count = rec.u32()? as usize;
        let children = rec.slice(count * 8)?;
        let target = ch as u32;
        if ordered {
            let mut lo = 0usize;
            let mut hi = count;
            while lo < hi {
                let mid = (lo + hi) / 2;
                let cp = read_u32(children, mid * 8)?;
                match cp.cmp(&target) {
                    std::cmp::Ordering::Less => lo = mid + 1,
                    std::cmp::Ordering::Greater => hi = mid,
                    std::cmp::Ordering::Equal => return read_u32(children, mid * 8 + 4),
                }
            }
            None
        } else {
            (0..count)
                .find(|&i| read_u32(children, i * 8) == Some(target))
                .and_then(|i| read_u32(children, i * 8 + 4))
        }
    }

    pub(crate) fn value_of(&self, node: u32) -> Option<u32> {
        let mut rec = self.record(node)?;
        let flags = rec.u8()?;
        if flags & FLAG_VACANT != 0 || flags & FLAG_TERMINAL == 0 {
            return None;
        }
        rec.u32()
    }

    pub(crate) fn parent_of(&self, node: u32) -> Option<(u32, char)> {
        let mut rec = self.record(node)?;
        let flags = rec.u8()?;
        if flags & FLAG_VACANT != 0 {
            return None;
        }
        rec.skip(4); // value
        let parent = rec.u32()?;
        if parent == INVALID_ID {
            return None;
        }
        let ch = char::from_u32(rec.u32()?)?;
        Some((parent, ch))
    }

    pub(crate) fn children_of(&self, node: u32) -> SmallVec<[(char, u32); 4]> {
        let mut out = SmallVec::new();
        let Some(mut rec) = self.occupied(node) else {
            return out;
        };
        let Some(count) = rec.u32() else {
            return out;
        };
        for _ in 0..count {
            let Some(cp) = rec.u32() else { break };
            let Some(child) = rec.u32() else { break };
            if let Some(ch) = char::from_u32(cp) {
                out.push((ch, child));
            }
        }
        out
    }

    pub(crate) fn value_entry(&self, id: u32) -> Result<ValueEntry, Error> {
        let count = self.value_count();
        if id >= count {
            return Err(Error::OutOfRange {
                index: id as usize,
                len: count as usize,
            });
        }
        let (node, char_len) = self.raw_value(id);
        if node == INVALID_ID {
            return Err(Error::InvalidHandle(id));
        }
        Ok(ValueEntry { node, char_len })
    }

    pub(crate) fn live_values(&self) -> usize {
        self.live_values
    }

    pub(crate) fn value_count(&self) -> u32 {
        (self.values.len() / 8) as u32
    }

    fn raw_value(&self, id: u32) -> (u32, u32) {
        let off = id as usize * 8;
        match (read_u32(self.values, off), read_u32(self.values, off + 4)) {
            (Some(node), Some(len)) => (node, len),
            _ => (INVALID_ID, 0),
        }
    }

    fn raw_node(&self, id: u32) -> RawNode {
        let vacant = RawNode {
            vacant: true,
            value: INVALID_ID,
            parent: INVALID_ID,
            parent_ch: 0,
            children: SmallVec::new(),
        };
        let Some(mut rec) = self.record(id) else {
            return vacant;
        };
        let Some(flags) = rec.u8() else { return vacant };
        if flags & FLAG_VACANT != 0 {
            return vacant;
        }
        let (Some(value), Some(parent), Some(parent_ch), Some(count)) =
            (rec.u32(), rec.u32(), rec.u32(), rec.u32())
        else {
            return vacant;
        };
        let mut children = SmallVec::new();
        for _ in 0..count {
            match (rec.u32(), rec.u32()) {
                (Some(cp), Some(child)) => children.push((cp, child)),
                _ => break,
            }
        }
        RawNode {
            vacant: false,
            value,
            parent,
            parent_ch,
            children,
        }
    }

    /// Decode into owned arenas (used for `copy = true` and
    /// copy-on-write before mutation).
    pub(crate) fn to_data(&self) -> TrieData {
        let mut nodes: Vec<Option<TrieNode>> = Vec::with_capacity(self.node_count as usize);
        for id in 0..self.node_count {
            let raw = self.raw_node(id);
            if raw.vacant {
                nodes.push(None);
                continue;
            }
            nodes.push(Some(TrieNode {
                children: raw
                    .children
                    .iter()
                    .filter_map(|&(cp, child)| char::from_u32(cp).map(|ch| (ch, child)))
                    .collect(),
                value: (raw.value != INVALID_ID).then_some(raw.value),
                parent: raw.parent,
                parent_ch: char::from_u32(raw.parent_ch).unwrap_or('\0'),
            }));
        }
        let mut values: Vec<Option<ValueEntry>> = Vec::with_capacity(self.value_count() as usize);
        for id in 0..self.value_count() {
            let (node, char_len) = self.raw_value(id);
            values.push((node != INVALID_ID).then_some(ValueEntry { node, char_len }));
        }
        TrieData {
            nodes: Arena::from_parts(nodes, decode_u32_list(self.free_nodes)),
            values: Arena::from_parts(values, decode_u32_list(self.free_values)),
        }
    }

    /// Full structural validation so in-place reads never have to.
    fn validate(&self) -> Result<(), Error> {
        if self.node_count == 0 {
            return Err(Error::MalformedBuffer("missing root node"));
        }
        let value_count = self.value_count();
        for id in 0..self.node_count {
            let mut rec = self
                .record(id)
                .ok_or(Error::MalformedBuffer("node offset out of range"))?;
            let flags = rec
                .u8()
                .ok_or(Error::MalformedBuffer("truncated node record"))?;
            if flags & FLAG_VACANT != 0 {
                if id == 0 {
                    return Err(Error::MalformedBuffer("root node is vacant"));
                }
                continue;
            }
            let (Some(value), Some(parent), Some(parent_ch), Some(count)) =
                (rec.u32(), rec.u32(), rec.u32(), rec.u32())
            else {
                return Err(Error::MalformedBuffer("truncated node record"));
            };
            if (flags & FLAG_TERMINAL != 0) != (value != INVALID_ID) {
                return Err(Error::MalformedBuffer("terminal flag disagrees with value"));
            }
            if value != INVALID_ID && value >= value_count {
                return Err(Error::MalformedBuffer("terminal value out of range"));
            }
            if id == 0 {
                if parent != INVALID_ID {
                    return Err(Error::MalformedBuffer("root node has a parent"));
                }
            } else {
                if parent >= self.node_count {
                    return Err(Error::MalformedBuffer("parent id out of range"));
                }
                if char::from_u32(parent_ch).is_none() {
                    return Err(Error::MalformedBuffer("invalid parent codepoint"));
                }
            }
            for _ in 0..count {
                let (Some(cp), Some(child)) = (rec.u32(), rec.u32()) else {
                    return Err(Error::MalformedBuffer("truncated child list"));
                };
                if char::from_u32(cp).is_none() {
                    return Err(Error::MalformedBuffer("invalid child codepoint"));
                }
                if child >= self.node_count {
                    return Err(Error::MalformedBuffer("child id out of range"));
                }
            }
        }
        for id in 0..value_count {
            let (node, _) = self.raw_value(id);
            if node != INVALID_ID && node >= self.node_count {
                return Err(Error::MalformedBuffer("value node out of range"));
            }
        }
        let mut seen_nodes = FxHashSet::default();
        for id in decode_u32_list(self.free_nodes) {
            if id >= self.node_count {
                return Err(Error::MalformedBuffer("free node id out of range"));
            }
            let flags = self
                .record(id)
                .and_then(|mut rec| rec.u8())
                .ok_or(Error::MalformedBuffer("truncated node record"))?;
            if flags & FLAG_VACANT == 0 {
                return Err(Error::MalformedBuffer("free node id addresses a live slot"));
            }
            if !seen_nodes.insert(id) {
                return Err(Error::MalformedBuffer("duplicate free node id"));
            }
        }
        let mut seen_values = FxHashSet::default();
        for id in decode_u32_list(self.free_values) {
            if id >= value_count {
                return Err(Error::MalformedBuffer("free value id out of range"));
            }
            if self.raw_value(id).0 != INVALID_ID {
                return Err(Error::MalformedBuffer("free value id addresses a live slot"));
            }
            if !seen_values.insert(id) {
                return Err(Error::MalformedBuffer("duplicate free value id"));
            }
        }
        Ok(())
    }
}
