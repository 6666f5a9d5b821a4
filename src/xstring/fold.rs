//! Case folding with offset alignment.
//!
//! Unicode lowercasing can change the codepoint count per character
//! (`İ` lowers to `i` + U+0307), so a span found in folded text is only
//! meaningful once its offsets are translated back to the original
//! text. [`FoldAlignment`] carries the folded text together with that
//! translation table.

use super::XString;

/// A lowercased copy of a text plus the alignment back to the source.
#[derive(Debug, Clone)]
pub struct FoldAlignment {
    lower: XString<'static>,
    /// One entry per folded codepoint: the char index of the source
    /// codepoint it was produced from. Non-decreasing.
    align: Vec<u32>,
    orig_char_num: usize,
}

/// Lowercase `source` with full per-codepoint Unicode mappings and
/// record, for every folded codepoint, which source codepoint produced
/// it.
pub fn ignore_case_alignment(source: &XString<'_>) -> FoldAlignment {
    let mut lowered = String::with_capacity(source.byte_num());
    let mut align = Vec::with_capacity(source.char_num());
    for (i, ch) in source.as_str().chars().enumerate() {
        for lc in ch.to_lowercase() {
            lowered.push(lc);
            align.push(i as u32);
        }
    }
    FoldAlignment {
        lower: XString::from(lowered),
        align,
        orig_char_num: source.char_num(),
    }
}

impl FoldAlignment {
    /// The folded text.
    pub fn lowercase(&self) -> &XString<'static> {
        &self.lower
    }

    /// The per-codepoint alignment table.
    pub fn alignment_array(&self) -> &[u32] {
        &self.align
    }

    /// Translate a char offset in the folded text to a char offset in
    /// the original text. The one-past-the-end offset maps to the
    /// original char count, so span ends translate cleanly.
    pub fn translate(&self, lower_char_idx: usize) -> usize {
        match self.align.get(lower_char_idx) {
            Some(&orig) => orig as usize,
            None => self.orig_char_num,
        }
    }
}

/// The codepoint stream a trie or automaton scan actually walks:
/// either the text itself, or its folded form with offset translation.
#[derive(Debug)]
pub(crate) struct ScanText {
    chars: Vec<char>,
    fold: Option<FoldAlignment>,
}

impl ScanText {
    pub(crate) fn new(text: &str, ignore_case: bool) -> Self {
        if ignore_case {
            let source = XString::from(text);
            let fold = ignore_case_alignment(&source);
            let chars = fold.lowercase().as_str().chars().collect();
            ScanText {
                chars,
                fold: Some(fold),
            }
        } else {
            ScanText {
                chars: text.chars().collect(),
                fold: None,
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.chars.len()
    }

    pub(crate) fn at(&self, i: usize) -> char {
        self.chars[i]
    }

    /// Map a scan offset back to an original-text char offset.
    pub(crate) fn translate(&self, i: usize) -> usize {
        match &self.fold {
            Some(fold) => fold.translate(i),
            None => i,
        }
    }
}

/// Fold a single key the same way query text is folded.
pub(crate) fn fold_word(word: &str, ignore_case: bool) -> Vec<char> {
    if ignore_case {
        word.chars().flat_map(|ch| ch.to_lowercase()).collect()
    } else {
        word.chars().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_tracks_fold_expansion() {
        // İ folds to two codepoints, both aligned to source index 2.
        let source = XString::from("aaİb");
        let fold = ignore_case_alignment(&source);
        assert_eq!(fold.lowercase().as_str(), "aai\u{307}b");
        assert_eq!(fold.alignment_array(), &[0, 1, 2, 2, 3]);
        assert_eq!(fold.translate(5), 4); // one past the end
    }

    #[test]
    fn ascii_alignment_is_identity() {
        let source = XString::from("AbC");
        let fold = ignore_case_alignment(&source);
        assert_eq!(fold.lowercase().as_str(), "abc");
        assert_eq!(fold.alignment_array(), &[0, 1, 2]);
    }
}
