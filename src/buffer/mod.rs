//! Flat binary layout shared by the trie and the automaton.
//!
//! The format is designed to be walked in place: a structure loaded
//! with `copy = false` answers every read straight from the caller's
//! bytes. Everything is little-endian.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ HEADER (32 bytes)                                           │
//! │   magic: [u8; 4] = "ACTB"                                   │
//! │   version: u8 = 1                                           │
//! │   kind: u8 (0 = trie, 1 = automaton)                        │
//! │   ignore_case: u8                                           │
//! │   ordered: u8                                               │
//! │   node_count: u32                                           │
//! │   value_count: u32 (word-id slots, tombstones included)     │
//! │   free_node_count: u32                                      │
//! │   free_value_count: u32                                     │
//! │   buff_len: u64 (total byte length, exact)                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │ NODE OFFSET TABLE: node_count × u32                         │
//! │   byte offset of each node record within the node region    │
//! ├─────────────────────────────────────────────────────────────┤
//! │ NODE RECORDS (variable length)                              │
//! │   flags: u8 (bit0 terminal, bit1 vacant)                    │
//! │   vacant records end here; occupied records continue:       │
//! │   value: u32, parent: u32, parent_ch: u32                   │
//! │   [automaton] fail: u32                                     │
//! │   child_count: u32                                          │
//! │   children: child_count × (codepoint u32, child id u32)     │
//! │   [automaton] output_count: u32, outputs: u32 each          │
//! ├─────────────────────────────────────────────────────────────┤
//! │ VALUE TABLE: value_count × (node u32, char_len u32)         │
//! │   node == u32::MAX marks a tombstoned word id               │
//! ├─────────────────────────────────────────────────────────────┤
//! │ FREE NODE LIST, then FREE VALUE LIST: u32 each              │
//! │   free-stack order, bottom first                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use crate::error::Error;

/// Header magic bytes.
pub const MAGIC: [u8; 4] = *b"ACTB";

/// Current format version.
pub const VERSION: u8 = 1;

/// Byte length of the fixed header.
pub const HEADER_LEN: usize = 32;

/// Node record flag: a word ends at this node.
pub(crate) const FLAG_TERMINAL: u8 = 0b01;
/// Node record flag: the slot is vacant (on the free list).
pub(crate) const FLAG_VACANT: u8 = 0b10;

/// Which structure a buffer holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureKind {
    /// A mutable prefix tree.
    Trie,
    /// An Aho-Corasick automaton.
    Automaton,
}

/// Peek at the structure kind of a serialized buffer without decoding
/// it.
pub fn kind_of(buf: &[u8]) -> Result<StructureKind, Error> {
    Ok(Header::parse(buf)?.kind)
}

/// Decoded header fields, exposed for inspection tooling.
#[derive(Debug, Clone)]
pub struct Header {
    /// Structure kind.
    pub kind: StructureKind,
    /// Keys and query text are case-folded before matching.
    pub ignore_case: bool,
    /// Child lists are kept sorted by codepoint.
    pub ordered: bool,
    /// Node slots, vacant ones included.
    pub node_count: u32,
    /// Word-id slots, tombstones included.
    pub value_count: u32,
    /// Entries on the node free stack.
    pub free_node_count: u32,
    /// Entries on the word-id free stack.
    pub free_value_count: u32,
    /// Total serialized length in bytes.
    pub buff_len: u64,
}

impl Header {
    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&MAGIC);
        out.push(VERSION);
        out.push(match self.kind {
            StructureKind::Trie => 0,
            StructureKind::Automaton => 1,
        });
        out.push(self.ignore_case as u8);
        out.push(self.ordered as u8);
        out.extend_from_slice(&self.node_count.to_le_bytes());
        out.extend_from_slice(&self.value_count.to_le_bytes());
        out.extend_from_slice(&self.free_node_count.to_le_bytes());
        out.extend_from_slice(&self.free_value_count.to_le_bytes());
        out.extend_from_slice(&self.buff_len.to_le_bytes());
    }

    /// Parse and validate the fixed header.
    pub fn parse(buf: &[u8]) -> Result<Header, Error> {
        if buf.len() < HEADER_LEN {
            return Err(Error::MalformedBuffer("buffer shorter than header"));
        }
        if buf[0..4] != MAGIC {
            return Err(Error::MalformedBuffer("bad magic"));
        }
        if buf[4] != VERSION {
            return Err(Error::MalformedBuffer("unsupported format version"));
        }
        let kind = match buf[5] {
            0 => StructureKind::Trie,
            1 => StructureKind::Automaton,
            _ => return Err(Error::MalformedBuffer("unknown structure kind")),
        };
        if buf[6] > 1 || buf[7] > 1 {
            return Err(Error::MalformedBuffer("invalid flag byte"));
        }
        Ok(Header {
            kind,
            ignore_case: buf[6] == 1,
            ordered: buf[7] == 1,
            node_count: read_u32_raw(buf, 8),
            value_count: read_u32_raw(buf, 12),
            free_node_count: read_u32_raw(buf, 16),
            free_value_count: read_u32_raw(buf, 20),
            buff_len: u64::from_le_bytes([
                buf[24], buf[25], buf[26], buf[27], buf[28], buf[29], buf[30], buf[31],
            ]),
        })
    }
}

fn read_u32_raw(buf: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]])
}

/// Bounds-checked u32 read, used by the in-place views.
pub(crate) fn read_u32(buf: &[u8], off: usize) -> Option<u32> {
    let bytes = buf.get(off..off + 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// The buffer carved into its five regions.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Regions<'a> {
    pub offsets: &'a [u8],
    pub nodes: &'a [u8],
    pub values: &'a [u8],
    pub free_nodes: &'a [u8],
    pub free_values: &'a [u8],
}

/// Split `buf` into regions according to `header`, validating that the
/// declared counts fit.
pub(crate) fn carve<'a>(buf: &'a [u8], header: &Header) -> Result<Regions<'a>, Error> {
    let total = header.buff_len as usize;
    if buf.len() < total {
        return Err(Error::MalformedBuffer("buffer shorter than declared length"));
    }
    let buf = &buf[..total];

    let offsets_len = header.node_count as usize * 4;
    let values_len = header.value_count as usize * 8;
    let free_nodes_len = header.free_node_count as usize * 4;
    let free_values_len = header.free_value_count as usize * 4;

    let offsets_start = HEADER_LEN;
    let nodes_start = offsets_start
        .checked_add(offsets_len)
        .ok_or(Error::MalformedBuffer("node offset table overflows"))?;
    let tail = values_len + free_nodes_len + free_values_len;
    let values_start = total
        .checked_sub(tail)
        .ok_or(Error::MalformedBuffer("tail sections overflow buffer"))?;
    if nodes_start > values_start {
        return Err(Error::MalformedBuffer("node region overlaps value table"));
    }
    let free_nodes_start = values_start + values_len;
    let free_values_start = free_nodes_start + free_nodes_len;

    Ok(Regions {
        offsets: &buf[offsets_start..nodes_start],
        nodes: &buf[nodes_start..values_start],
        values: &buf[values_start..free_nodes_start],
        free_nodes: &buf[free_nodes_start..free_values_start],
        free_values: &buf[free_values_start..total],
    })
}

/// Forward cursor over a node record.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RecordReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> RecordReader<'a> {
    pub(crate) fn new(buf: &'a [u8], pos: usize) -> Self {
        RecordReader { buf, pos }
    }

    pub(crate) fn u8(&mut self) -> Option<u8> {
        let byte = *self.buf.get(self.pos)?;
        self.pos += 1;
        Some(byte)
    }

    pub(crate) fn u32(&mut self) -> Option<u32> {
        let value = read_u32(self.buf, self.pos)?;
        self.pos += 4;
        Some(value)
    }

    pub(crate) fn skip(&mut self, bytes: usize) {
        self.pos += bytes;
    }

    pub(crate) fn slice(&self, len: usize) -> Option<&'a [u8]> {
        self.buf.get(self.pos..self.pos + len)
    }
}

/// Decode a region of packed u32s.
pub(crate) fn decode_u32_list(region: &[u8]) -> Vec<u32> {
    region
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trip() {
        let header = Header {
            kind: StructureKind::Automaton,
            ignore_case: true,
            ordered: false,
            node_count: 7,
            value_count: 3,
            free_node_count: 0,
            free_value_count: 0,
            buff_len: 1234,
        };
        let mut bytes = Vec::new();
        header.write(&mut bytes);
        assert_eq!(bytes.len(), HEADER_LEN);

        let parsed = Header::parse(&bytes).unwrap();
        assert_eq!(parsed.kind, StructureKind::Automaton);
        assert!(parsed.ignore_case);
        assert!(!parsed.ordered);
        assert_eq!(parsed.node_count, 7);
        assert_eq!(parsed.buff_len, 1234);
    }

    #[test]
    fn parse_rejects_bad_magic() {
        let mut bytes = vec![0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(b"NOPE");
        assert!(matches!(
            Header::parse(&bytes),
            Err(Error::MalformedBuffer(_))
        ));
    }
}
