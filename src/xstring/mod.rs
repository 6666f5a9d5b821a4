//! Random-access codepoint view over UTF-8 text.
//!
//! A [`XString`] decodes a UTF-8 buffer once, building a char-index to
//! byte-offset table so that `char_at(i)` and char/byte conversions are
//! O(1) afterwards. Malformed input is rejected at construction;
//! decoding is never re-validated per access.

pub mod fold;

use crate::error::Error;
use std::borrow::Cow;

/// A UTF-8 text (borrowed or owned) with a codepoint index.
///
/// All scanning in this crate reports codepoint (char) offsets; the
/// offset table on this type converts them to byte offsets when needed.
#[derive(Debug, Clone)]
pub struct XString<'a> {
    text: Cow<'a, str>,
    /// `offsets[i]` is the byte offset of char `i`; the final entry is
    /// the total byte length. Monotonically increasing, always on
    /// codepoint boundaries.
    offsets: Vec<u32>,
}

impl<'a> XString<'a> {
    /// Index an already-validated text.
    pub fn new(text: impl Into<Cow<'a, str>>) -> Self {
        let text = text.into();
        let mut offsets = Vec::with_capacity(text.len() + 1);
        for (off, _) in text.char_indices() {
            offsets.push(off as u32);
        }
        offsets.push(text.len() as u32);
        XString { text, offsets }
    }

    /// Validate and index a raw byte buffer.
    pub fn from_bytes(bytes: &'a [u8]) -> Result<Self, Error> {
        let text = std::str::from_utf8(bytes)?;
        Ok(XString::new(text))
    }

    /// Number of codepoints.
    pub fn char_num(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Number of bytes.
    pub fn byte_num(&self) -> usize {
        self.text.len()
    }

    /// The codepoint at char index `i`.
    pub fn char_at(&self, i: usize) -> Result<char, Error> {
        if i >= self.char_num() {
            return Err(Error::OutOfRange {
                index: i,
                len: self.char_num(),
            });
        }
        let off = self.offsets[i] as usize;
        self.text[off..].chars().next().ok_or(Error::OutOfRange {
            index: i,
            len: self.char_num(),
        })
    }

    /// Byte offset of char index `i`; `i == char_num()` gives the byte
    /// length.
    pub fn byte_offset(&self, i: usize) -> Result<usize, Error> {
        self.offsets
            .get(i)
            .map(|&off| off as usize)
            .ok_or(Error::OutOfRange {
                index: i,
                len: self.char_num(),
            })
    }

    /// The underlying text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The underlying bytes.
    pub fn bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    pub(crate) fn byte_at(&self, i: usize) -> usize {
        self.offsets[i] as usize
    }
}

impl<'a> From<&'a str> for XString<'a> {
    fn from(text: &'a str) -> Self {
        XString::new(text)
    }
}

impl From<String> for XString<'static> {
    fn from(text: String) -> Self {
        XString::new(text)
    }
}
