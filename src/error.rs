//! Error types shared by every module in the crate.

/// Errors that can occur while building, querying or (de)serializing
/// tries and automata.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input byte buffer is not valid UTF-8. Raised at construction
    /// of a codepoint index, never during later access.
    #[error("invalid utf-8 in input text: {0}")]
    Decode(#[from] std::str::Utf8Error),

    /// A char index, byte offset or node/word id lies outside the valid
    /// range of the addressed structure.
    #[error("index {index} out of range (len {len})")]
    OutOfRange {
        /// The offending index.
        index: usize,
        /// The valid length at the time of access.
        len: usize,
    },

    /// The id addresses a slot that has been released and not yet
    /// reused. Distinct from [`Error::OutOfRange`]: the id was valid
    /// once, but its entry is gone.
    #[error("id {0} refers to a released slot")]
    InvalidHandle(u32),

    /// A caller-supplied serialization buffer is smaller than
    /// `buff_size()`.
    #[error("buffer too small: need {need} bytes, got {got}")]
    UndersizedBuffer {
        /// Exact number of bytes required.
        need: usize,
        /// Number of bytes supplied.
        got: usize,
    },

    /// A serialized buffer failed validation (bad magic, truncated
    /// region, dangling id, invalid codepoint, ...).
    #[error("malformed buffer: {0}")]
    MalformedBuffer(&'static str),

    /// An I/O error from `save`/`load`.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
