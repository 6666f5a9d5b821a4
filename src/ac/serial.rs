//! Automaton half of the buffer codec.
//!
//! Same regions as the trie format, with two extra fields per node
//! record (fail link, output set). The automaton never releases slots,
//! so both free lists serialize empty.

use super::{Ac, AcData, AcNode, AcRepr};
use crate::arena::{Arena, INVALID_ID};
use crate::buffer::{
    carve, read_u32, Header, RecordReader, StructureKind, FLAG_TERMINAL, FLAG_VACANT, HEADER_LEN,
};
use crate::error::Error;
use crate::trie::ValueEntry;
use smallvec::SmallVec;
use std::path::Path;

struct RawState {
    vacant: bool,
    value: u32,
    parent: u32,
    parent_ch: u32,
    fail: u32,
    children: SmallVec<[(u32, u32); 4]>,
    outputs: SmallVec<[u32; 2]>,
}

impl RawState {
    fn encoded_len(&self) -> usize {
        if self.vacant {
            1
        } else {
            25 + 8 * self.children.len() + 4 * self.outputs.len()
        }
    }
}

impl AcRepr<'_> {
    pub(crate) fn node_count(&self) -> u32 {
        match self {
            AcRepr::Owned(data) => data.nodes.len() as u32,
            AcRepr::View(view) => view.node_count,
        }
    }

    fn raw_state(&self, id: u32) -> RawState {
        match self {
            AcRepr::Owned(data) => match data.nodes.get(id) {
                Ok(node) => RawState {
                    vacant: false,
                    value: node.value.unwrap_or(INVALID_ID),
                    parent: node.parent,
                    parent_ch: node.parent_ch as u32,
                    fail: node.fail,
                    children: node
                        .children
                        .iter()
                        .map(|&(ch, child)| (ch as u32, child))
                        .collect(),
                    outputs: node.outputs.clone(),
                },
                Err(_) => RawState {
                    vacant: true,
                    value: INVALID_ID,
                    parent: INVALID_ID,
                    parent_ch: 0,
                    fail: 0,
                    children: SmallVec::new(),
                    outputs: SmallVec::new(),
                },
            },
            AcRepr::View(view) => view.raw_state(id),
        }
    }

    fn raw_value(&self, id: u32) -> (u32, u32) {
        match self {
            AcRepr::Owned(data) => match data.values.get(id) {
                Ok(entry) => (entry.node, entry.char_len),
                Err(_) => (INVALID_ID, 0),
            },
            AcRepr::View(view) => view.raw_value(id),
        }
    }
}

impl Ac<'_> {
    /// Exact byte length of the serialized automaton.
    pub fn buff_size(&self) -> usize {
        let node_count = self.repr.node_count() as usize;
        let records: usize = (0..node_count as u32)
            .map(|id| self.repr.raw_state(id).encoded_len())
            .sum();
        HEADER_LEN + 4 * node_count + records + 8 * self.repr.value_count() as usize
    }

    /// Serialize into `buf`, which must hold at least
    /// [`Ac::buff_size`] bytes; exactly that many are written.
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

    /// Write the serialized automaton to a file of exactly
    /// [`Ac::buff_size`] bytes.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        std::fs::write(path, self.to_bytes())?;
        Ok(())
    }

    fn to_bytes(&self) -> Vec<u8> {
        let node_count = self.repr.node_count();
        let value_count = self.repr.value_count();

        let mut offsets = Vec::with_capacity(node_count as usize * 4);
        let mut records = Vec::new();
        for id in 0..node_count {
            offsets.extend_from_slice(&(records.len() as u32).to_le_bytes());
            let state = self.repr.raw_state(id);
            if state.vacant {
                records.push(FLAG_VACANT);
                continue;
            }
            records.push(if state.value == INVALID_ID {
                0
            } else {
                FLAG_TERMINAL
            });
            records.extend_from_slice(&state.value.to_le_bytes());
            records.extend_from_slice(&state.parent.to_le_bytes());
            records.extend_from_slice(&state.parent_ch.to_le_bytes());
            records.extend_from_slice(&state.fail.to_le_bytes());
            records.extend_from_slice(&(state.children.len() as u32).to_le_bytes());
            for &(ch, child) in &state.children {
                records.extend_from_slice(&ch.to_le_bytes());
                records.extend_from_slice(&child.to_le_bytes());
            }
            records.extend_from_slice(&(state.outputs.len() as u32).to_le_bytes());
            for &output in &state.outputs {
                records.extend_from_slice(&output.to_le_bytes());
            }
        }

        let buff_len =
            HEADER_LEN + offsets.len() + records.len() + 8 * value_count as usize;
        let mut out = Vec::with_capacity(buff_len);
        Header {
            kind: StructureKind::Automaton,
            ignore_case: self.ignore_case(),
            ordered: false,
            node_count,
            value_count,
            free_node_count: 0,
            free_value_count: 0,
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
        out
    }
}

impl<'a> Ac<'a> {
    /// Reconstruct an automaton from a buffer produced by
    /// [`Ac::to_buff`] or [`Ac::save`].
    ///
    /// With `copy = true` the bytes are decoded into owned arenas; with
    /// `copy = false` the automaton borrows `buf` and reads it in
    /// place, so `buf` must stay alive and unmodified for the
    /// automaton's lifetime. The buffer is fully validated up front
    /// either way.
    pub fn from_buff(buf: &'a [u8], copy: bool) -> Result<Ac<'a>, Error> {
        let header = Header::parse(buf)?;
        if header.kind != StructureKind::Automaton {
            return Err(Error::MalformedBuffer("buffer holds a trie, not an automaton"));
        }
        let view = AcView::new(buf, &header)?;
        let repr = if copy {
            AcRepr::Owned(view.to_data())
        } else {
            AcRepr::View(view)
        };
        Ok(Ac::from_parts(repr, header.ignore_case))
    }

    /// Read a serialized automaton from a file into owned storage.
    pub fn load(path: impl AsRef<Path>) -> Result<Ac<'static>, Error> {
        let bytes = std::fs::read(path)?;
        Ok(Ac::from_buff(&bytes, true)?.into_owned())
    }
}

/// Zero-copy view over a serialized automaton.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AcView<'a> {
    offsets: &'a [u8],
    nodes: &'a [u8],
    values: &'a [u8],
    node_count: u32,
}

impl<'a> AcView<'a> {
    fn new(buf: &'a [u8], header: &Header) -> Result<Self, Error> {
        let regions = carve(buf, header)?;
        let view = AcView {
            offsets: regions.offsets,
            nodes: regions.nodes,
            values: regions.values,
            node_count: header.node_count,
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

    /// Cursor positioned at `child_count` for an occupied record.
    fn occupied(&self, id: u32) -> Option<RecordReader<'a>> {
        let mut rec = self.record(id)?;
        let flags = rec.u8()?;
        if flags & FLAG_VACANT != 0 {
            return None;
        }
        rec.skip(16); // value, parent, parent_ch, fail
        Some(rec)
    }

    pub(crate) fn child(&self, node: u32, ch: char) -> Option<u32> {
        let mut rec = self.occupied(node)?;
        let count = rec.u32()? as usize;
        let children = rec.slice(count * 8)?;
        let target = ch as u32;
        (0..count)
            .find(|&i| read_u32(children, i * 8) == Some(target))
            .and_then(|i| read_u32(children, i * 8 + 4))
    }

    pub(crate) fn fail_of(&self, node: u32) -> u32 {
        let fail = self.record(node).and_then(|mut rec| {
            let flags = rec.u8()?;
            if flags & FLAG_VACANT != 0 {
                return None;
            }
            rec.skip(12); // value, parent, parent_ch
            rec.u32()
        });
        fail.unwrap_or(super::ROOT)
    }

    pub(crate) fn outputs_of(&self, node: u32) -> SmallVec<[u32; 4]> {
        let mut out = SmallVec::new();
        let Some(mut rec) = self.occupied(node) else {
            return out;
        };
        let Some(child_count) = rec.u32() else {
            return out;
        };
        rec.skip(child_count as usize * 8);
        let Some(output_count) = rec.u32() else {
            return out;
        };
        for _ in 0..output_count {
            match rec.u32() {
                Some(id) => out.push(id),
                None => break,
            }
        }
        out
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

    fn raw_state(&self, id: u32) -> RawState {
        let vacant = RawState {
            vacant: true,
            value: INVALID_ID,
            parent: INVALID_ID,
            parent_ch: 0,
            fail: 0,
            children: SmallVec::new(),
            outputs: SmallVec::new(),
        };
        let Some(mut rec) = self.record(id) else {
            return vacant;
        };
        let Some(flags) = rec.u8() else { return vacant };
        if flags & FLAG_VACANT != 0 {
            return vacant;
        }
        let (Some(value), Some(parent), Some(parent_ch), Some(fail), Some(child_count)) =
            (rec.u32(), rec.u32(), rec.u32(), rec.u32(), rec.u32())
        else {
            return vacant;
        };
        let mut children = SmallVec::new();
        for _ in 0..child_count {
            match (rec.u32(), rec.u32()) {
                (Some(cp), Some(child)) => children.push((cp, child)),
                _ => break,
            }
        }
        let mut outputs = SmallVec::new();
        if let Some(output_count) = rec.u32() {
            for _ in 0..output_count {
                match rec.u32() {
                    Some(out) => outputs.push(out),
                    None => break,
                }
            }
        }
        RawState {
            vacant: false,
            value,
            parent,
            parent_ch,
            fail,
            children,
            outputs,
        }
    }

    pub(crate) fn to_data(&self) -> AcData {
        let mut nodes: Vec<Option<AcNode>> = Vec::with_capacity(self.node_count as usize);
        for id in 0..self.node_count {
            let raw = self.raw_state(id);
            if raw.vacant {
                nodes.push(None);
                continue;
            }
            nodes.push(Some(AcNode {
                children: raw
                    .children
                    .iter()
                    .filter_map(|&(cp, child)| char::from_u32(cp).map(|ch| (ch, child)))
                    .collect(),
                value: (raw.value != INVALID_ID).then_some(raw.value),
                parent: raw.parent,
                parent_ch: char::from_u32(raw.parent_ch).unwrap_or('\0'),
                fail: raw.fail,
                outputs: raw.outputs,
            }));
        }
        let mut values: Vec<Option<ValueEntry>> = Vec::with_capacity(self.value_count() as usize);
        for id in 0..self.value_count() {
            let (node, char_len) = self.raw_value(id);
            values.push((node != INVALID_ID).then_some(ValueEntry { node, char_len }));
        }
        AcData {
            nodes: Arena::from_parts(nodes, Vec::new()),
            values: Arena::from_parts(values, Vec::new()),
        }
    }

    fn validate(&self) -> Result<(), Error> {
        if self.node_count == 0 {
            return Err(Error::MalformedBuffer("missing root state"));
        }
        let value_count = self.value_count();
        for id in 0..self.node_count {
            let mut rec = self
                .record(id)
                .ok_or(Error::MalformedBuffer("state offset out of range"))?;
            let flags = rec
                .u8()
                .ok_or(Error::MalformedBuffer("truncated state record"))?;
            if flags & FLAG_VACANT != 0 {
                if id == 0 {
                    return Err(Error::MalformedBuffer("root state is vacant"));
                }
                continue;
            }
            let (Some(value), Some(parent), Some(parent_ch), Some(fail), Some(child_count)) =
                (rec.u32(), rec.u32(), rec.u32(), rec.u32(), rec.u32())
            else {
                return Err(Error::MalformedBuffer("truncated state record"));
            };
            if (flags & FLAG_TERMINAL != 0) != (value != INVALID_ID) {
                return Err(Error::MalformedBuffer("terminal flag disagrees with value"));
            }
            if value != INVALID_ID && value >= value_count {
                return Err(Error::MalformedBuffer("terminal value out of range"));
            }
            if id == 0 {
                if parent != INVALID_ID {
                    return Err(Error::MalformedBuffer("root state has a parent"));
                }
            } else {
                if parent >= self.node_count {
                    return Err(Error::MalformedBuffer("parent id out of range"));
                }
                if char::from_u32(parent_ch).is_none() {
                    return Err(Error::MalformedBuffer("invalid parent codepoint"));
                }
            }
            if fail >= self.node_count {
                return Err(Error::MalformedBuffer("fail link out of range"));
            }
            for _ in 0..child_count {
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
            let output_count = rec
                .u32()
                .ok_or(Error::MalformedBuffer("truncated output set"))?;
            for _ in 0..output_count {
                let output = rec
                    .u32()
                    .ok_or(Error::MalformedBuffer("truncated output set"))?;
                if output >= value_count {
                    return Err(Error::MalformedBuffer("output id out of range"));
                }
            }
        }
        for id in 0..value_count {
            let (node, _) = self.raw_value(id);
            if node != INVALID_ID && node >= self.node_count {
                return Err(Error::MalformedBuffer("value node out of range"));
            }
        }
        Ok(())
    }
}
