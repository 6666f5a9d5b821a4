//! # actrie
//!
//! High performance Unicode trie and Aho-Corasick automaton with
//! compact flat-buffer persistence.
//!
//! Two related structures over Unicode text share one engine:
//!
//! - [`Trie`]: a mutable prefix tree mapping keys to dense integer word
//!   ids, with prefix/predictive enumeration and longest-match
//!   scan-and-replace over arbitrary text.
//! - [`Ac`]: an Aho-Corasick automaton built once from a word set,
//!   matching every pattern in a single pass with configurable
//!   overlap/substring suppression.
//!
//! Both support case-insensitive matching with offsets reported against
//! the *original* (unfolded) text, and both serialize to an exact-size
//! binary buffer that can be reloaded either into owned storage or as a
//! zero-copy view over the caller's bytes.
//!
//! ## Example
//!
//! ```rust,ignore
//! use actrie::prelude::*;
//!
//! let mut trie = Trie::new();
//! trie.insert("New York");
//! trie.insert("City");
//!
//! for (id, start, end) in trie.match_longest("New York City", None) {
//!     println!("word {id} spans chars {start}..{end}");
//! }
//!
//! let ac = Ac::build(["py", "python"], false);
//! assert_eq!(ac.matches("python").count(), 2);
//! ```
//!
//! ## Offsets
//!
//! All reported positions are codepoint (char) offsets into the
//! original text; [`XString`] converts between char and byte offsets
//! when needed. Under `ignore_case`, scanning happens on the folded
//! text and [`FoldAlignment`] translates every span back, which matters
//! because Unicode folding can change the codepoint count per character.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ac;
pub mod arena;
pub mod buffer;
pub mod error;
pub mod trie;
pub mod xstring;

pub use ac::{Ac, MatchOptions};
pub use error::Error;
pub use trie::{Trie, TrieBuilder, WordId};
pub use xstring::fold::{ignore_case_alignment, FoldAlignment};
pub use xstring::XString;

/// Common imports for convenient usage
pub mod prelude {
    pub use crate::ac::{Ac, MatchOptions, Matches};
    pub use crate::arena::Arena;
    pub use crate::buffer::{kind_of, Header, StructureKind};
    pub use crate::error::Error;
    pub use crate::trie::{MatchLongest, Predict, Prefix, Trie, TrieBuilder, WordId};
    pub use crate::xstring::fold::{ignore_case_alignment, FoldAlignment};
    pub use crate::xstring::XString;
}
