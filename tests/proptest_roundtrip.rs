//! Property-based round-trip tests: whatever word set a trie or
//! automaton is built from, serializing and reloading it (owned or
//! zero-copy) must preserve observable behavior.

use actrie::{Ac, Trie};
use proptest::prelude::*;

fn word_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,8}"
}

fn word_list_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(word_strategy(), 1..=20)
}

fn build_trie(words: &[String], ordered: bool) -> Trie<'static> {
    let mut trie = Trie::builder().ordered(ordered).build();
    for word in words {
        trie.insert(word);
    }
    trie
}

proptest! {
    #[test]
    fn trie_round_trip_preserves_words(words in word_list_strategy(), ordered in any::<bool>()) {
        let trie = build_trie(&words, ordered);
        let mut buf = vec![0u8; trie.buff_size()];
        trie.to_buff(&mut buf).unwrap();

        let copied = Trie::from_buff(&buf, true).unwrap();
        let view = Trie::from_buff(&buf, false).unwrap();

        prop_assert_eq!(copied.len(), trie.len());
        prop_assert_eq!(view.len(), trie.len());
        for word in &words {
            prop_assert_eq!(copied.lookup(word), trie.lookup(word));
            prop_assert_eq!(view.lookup(word), trie.lookup(word));
        }

        let original: Vec<(String, u32)> = trie.iter().collect();
        let copied_pairs: Vec<(String, u32)> = copied.iter().collect();
        let view_pairs: Vec<(String, u32)> = view.iter().collect();
        prop_assert_eq!(&original, &copied_pairs);
        prop_assert_eq!(&original, &view_pairs);
    }

    #[test]
    fn trie_round_trip_preserves_size(words in word_list_strategy()) {
        let trie = build_trie(&words, false);
        let mut buf = vec![0u8; trie.buff_size()];
        trie.to_buff(&mut buf).unwrap();

        let copied = Trie::from_buff(&buf, true).unwrap();
        prop_assert_eq!(copied.buff_size(), buf.len());
    }

    #[test]
    fn trie_round_trip_preserves_free_lists(
        words in prop::collection::vec(word_strategy(), 3..=20),
        removals in prop::collection::vec(any::<prop::sample::Index>(), 1..=5),
    ) {
        let mut trie = build_trie(&words, false);
        for idx in &removals {
            trie.remove(idx.get(&words).as_str());
        }

        let mut buf = vec![0u8; trie.buff_size()];
        trie.to_buff(&mut buf).unwrap();
        let mut restored = Trie::from_buff(&buf, true).unwrap();

        // Fresh insertions recycle the same ids on both sides.
        prop_assert_eq!(restored.insert("zzzzz"), trie.insert("zzzzz"));
        prop_assert_eq!(restored.insert("zzzzy"), trie.insert("zzzzy"));
    }

    #[test]
    fn ac_round_trip_preserves_matches(
        words in word_list_strategy(),
        text in "[a-z ]{0,40}",
    ) {
        let ac = Ac::build(&words, false);
        let mut buf = vec![0u8; ac.buff_size()];
        ac.to_buff(&mut buf).unwrap();

        let copied = Ac::from_buff(&buf, true).unwrap();
        let view = Ac::from_buff(&buf, false).unwrap();
        prop_assert_eq!(copied.size(), ac.size());
        prop_assert_eq!(view.size(), ac.size());

        let original: Vec<(u32, usize, usize)> = ac.matches(&text).collect();
        let copied_hits: Vec<(u32, usize, usize)> = copied.matches(&text).collect();
        let view_hits: Vec<(u32, usize, usize)> = view.matches(&text).collect();
        prop_assert_eq!(&original, &copied_hits);
        prop_assert_eq!(&original, &view_hits);

        for id in 0..ac.size() as u32 {
            prop_assert_eq!(copied.word(id).unwrap(), ac.word(id).unwrap());
        }
    }

    #[test]
    fn ac_matches_lie_within_text(words in word_list_strategy(), text in "[a-z ]{0,40}") {
        let ac = Ac::build(&words, false);
        let len = text.chars().count();
        for (id, start, end) in ac.matches(&text) {
            prop_assert!(start < end);
            prop_assert!(end <= len);
            prop_assert!((id as usize) < ac.size());

            // The reported span really spells the matched word.
            let span: String = text.chars().skip(start).take(end - start).collect();
            prop_assert_eq!(span, ac.word(id).unwrap());
        }
    }

    #[test]
    fn match_longest_spans_never_overlap(words in word_list_strategy(), text in "[a-z ]{0,40}") {
        let trie = build_trie(&words, false);
        let mut last_end = 0usize;
        for (_, start, end) in trie.match_longest(&text, None) {
            prop_assert!(start >= last_end);
            prop_assert!(start < end);
            last_end = end;
        }
    }
}
