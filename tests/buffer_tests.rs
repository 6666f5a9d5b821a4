//! Serialization round trips, zero-copy views, copy-on-write and
//! malformed-buffer rejection.

use actrie::buffer::{kind_of, Header, StructureKind, MAGIC};
use actrie::{Ac, Error, Trie};
use std::path::PathBuf;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("actrie_{}_{}", std::process::id(), name))
}

fn unicode_trie() -> Trie<'static> {
    let mut trie = Trie::builder().ignore_case(true).build();
    trie.insert("a\u{130}\u{130}"); // 0
    trie.insert("aai\u{307}"); // 1
    trie.insert("aai\u{307}b\u{130}"); // 2
    trie
}

fn check_unicode_trie(trie: &Trie<'_>) {
    let out: Result<String, ()> = trie.replace_longest(
        "aa\u{130} aai\u{307}b\u{130}aa",
        |id, _, _| Ok(["a", "b", "c"][id as usize].to_string()),
        None,
    );
    assert_eq!(out.unwrap(), "b caa");
}

#[test]
fn trie_to_buff_writes_exactly_buff_size() {
    let trie = unicode_trie();
    let size = trie.buff_size();

    let mut buf = vec![0u8; size];
    trie.to_buff(&mut buf).unwrap();

    let header = Header::parse(&buf).unwrap();
    assert_eq!(header.kind, StructureKind::Trie);
    assert!(header.ignore_case);
    assert_eq!(header.buff_len as usize, size);
    assert_eq!(header.value_count, 3);
}

#[test]
fn trie_save_matches_to_buff() {
    let trie = unicode_trie();
    let path = temp_path("trie_save.bin");
    trie.save(&path).unwrap();

    let from_file = std::fs::read(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let mut from_mem = vec![0u8; trie.buff_size()];
    trie.to_buff(&mut from_mem).unwrap();
    assert_eq!(from_file, from_mem);
}

#[test]
fn trie_round_trips_in_both_copy_modes() {
    let trie = unicode_trie();
    let mut buf = vec![0u8; trie.buff_size()];
    trie.to_buff(&mut buf).unwrap();

    let copied = Trie::from_buff(&buf, true).unwrap();
    assert!(copied.ignore_case());
    assert_eq!(copied.len(), 3);
    check_unicode_trie(&copied);

    let view = Trie::from_buff(&buf, false).unwrap();
    assert_eq!(view.len(), 3);
    assert_eq!(view.lookup("aai\u{307}"), Some(1));
    check_unicode_trie(&view);
}

#[test]
fn trie_load_reads_saved_file() {
    let trie = unicode_trie();
    let path = temp_path("trie_load.bin");
    trie.save(&path).unwrap();

    let loaded = Trie::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    check_unicode_trie(&loaded);
}

#[test]
fn view_mutation_copies_on_write() {
    let trie = unicode_trie();
    let mut buf = vec![0u8; trie.buff_size()];
    trie.to_buff(&mut buf).unwrap();
    let snapshot = buf.clone();

    let mut view = Trie::from_buff(&buf, false).unwrap();
    assert_eq!(view.insert("zz"), Some(3));
    assert!(view.contains("zz"));
    assert!(view.contains("aai\u{307}"));

    // The backing buffer is untouched.
    assert_eq!(buf, snapshot);
}

#[test]
fn into_owned_outlives_the_buffer() {
    let trie = unicode_trie();
    let mut buf = vec![0u8; trie.buff_size()];
    trie.to_buff(&mut buf).unwrap();

    let owned: Trie<'static> = Trie::from_buff(&buf, false).unwrap().into_owned();
    drop(buf);
    check_unicode_trie(&owned);
}

#[test]
fn free_lists_survive_the_round_trip() {
    let mut trie = Trie::new();
    trie.insert("abc");
    trie.insert("abd");
    trie.insert("abe");
    trie.remove("abc");
    trie.remove("abe");

    let mut buf = vec![0u8; trie.buff_size()];
    trie.to_buff(&mut buf).unwrap();
    let mut restored = Trie::from_buff(&buf, true).unwrap();

    // Id recycling picks up exactly where the original left off.
    assert_eq!(restored.insert("abf"), Some(2));
    assert_eq!(restored.insert("abg"), Some(0));
    assert_eq!(restored.insert("abh"), Some(3));
}

#[test]
fn ac_round_trips_in_both_copy_modes() {
    let ac = Ac::build(["我", "我是", "是中"], false);
    let size = ac.buff_size();

    let mut buf = vec![0u8; size];
    ac.to_buff(&mut buf).unwrap();
    assert_eq!(Header::parse(&buf).unwrap().kind, StructureKind::Automaton);

    let expected = vec![(0, 0, 1), (1, 0, 2), (2, 1, 3)];
    let copied = Ac::from_buff(&buf, true).unwrap();
    assert_eq!(copied.size(), 3);
    let hits: Vec<(u32, usize, usize)> = copied.matches("我是中国人").collect();
    assert_eq!(hits, expected);

    let view = Ac::from_buff(&buf, false).unwrap();
    let hits: Vec<(u32, usize, usize)> = view.matches("我是中国人").collect();
    assert_eq!(hits, expected);
    assert_eq!(view.word(2).unwrap(), "是中");
}

#[test]
fn ac_save_and_load() {
    let ac = Ac::build(["py", "python"], true);
    let path = temp_path("ac_save.bin");
    ac.save(&path).unwrap();

    let loaded = Ac::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(loaded.size(), 2);
    assert!(loaded.ignore_case());
    let hits: Vec<(u32, usize, usize)> = loaded.matches("PYTHON").collect();
    assert_eq!(hits, vec![(0, 0, 2), (1, 0, 6)]);
}

#[test]
fn undersized_buffer_is_rejected() {
    let trie = unicode_trie();
    let mut buf = vec![0u8; trie.buff_size() - 1];
    assert!(matches!(
        trie.to_buff(&mut buf),
        Err(Error::UndersizedBuffer { .. })
    ));
}

#[test]
fn bad_magic_is_rejected() {
    let trie = unicode_trie();
    let mut buf = vec![0u8; trie.buff_size()];
    trie.to_buff(&mut buf).unwrap();
    buf[0] ^= 0xff;

    assert!(matches!(
        Trie::from_buff(&buf, true),
        Err(Error::MalformedBuffer(_))
    ));
    assert!(kind_of(&buf).is_err());
}

#[test]
fn truncated_buffer_is_rejected() {
    let trie = unicode_trie();
    let mut buf = vec![0u8; trie.buff_size()];
    trie.to_buff(&mut buf).unwrap();

    assert!(Trie::from_buff(&buf[..buf.len() - 4], false).is_err());
    assert!(Header::parse(&buf[..8]).is_err());
}

#[test]
fn kind_mismatch_is_rejected() {
    let ac = Ac::build(["a"], false);
    let mut ac_buf = vec![0u8; ac.buff_size()];
    ac.to_buff(&mut ac_buf).unwrap();
    assert_eq!(kind_of(&ac_buf).unwrap(), StructureKind::Automaton);
    assert!(matches!(
        Trie::from_buff(&ac_buf, true),
        Err(Error::MalformedBuffer(_))
    ));

    let trie = unicode_trie();
    let mut trie_buf = vec![0u8; trie.buff_size()];
    trie.to_buff(&mut trie_buf).unwrap();
    assert_eq!(kind_of(&trie_buf).unwrap(), StructureKind::Trie);
    assert!(matches!(
        Ac::from_buff(&trie_buf, true),
        Err(Error::MalformedBuffer(_))
    ));
}

#[test]
fn free_lists_must_reference_vacant_slots() {
    let mut trie = Trie::new();
    trie.insert("abc");
    trie.insert("abd");
    trie.insert("abe");
    trie.remove("abd");
    trie.remove("abe");

    let mut buf = vec![0u8; trie.buff_size()];
    trie.to_buff(&mut buf).unwrap();
    assert!(Trie::from_buff(&buf, true).is_ok());

    // Layout tail: free node list (2 entries), then free value list
    // (2 entries), 4 bytes each.
    let len = buf.len();

    // A live word id on the free value list must be rejected.
    let mut tampered = buf.clone();
    tampered[len - 4..].copy_from_slice(&0u32.to_le_bytes());
    assert!(matches!(
        Trie::from_buff(&tampered, true),
        Err(Error::MalformedBuffer(_))
    ));

    // A duplicated (vacant) free value id must be rejected too.
    let mut tampered = buf.clone();
    tampered[len - 4..].copy_from_slice(&1u32.to_le_bytes());
    assert!(matches!(
        Trie::from_buff(&tampered, false),
        Err(Error::MalformedBuffer(_))
    ));

    // Same for the node free list: the root is live.
    let mut tampered = buf;
    tampered[len - 16..len - 12].copy_from_slice(&0u32.to_le_bytes());
    assert!(matches!(
        Trie::from_buff(&tampered, true),
        Err(Error::MalformedBuffer(_))
    ));
}

#[test]
fn magic_constant_brands_every_buffer() {
    let trie = Trie::new();
    let mut buf = vec![0u8; trie.buff_size()];
    trie.to_buff(&mut buf).unwrap();
    assert_eq!(&buf[..4], &MAGIC);
}
