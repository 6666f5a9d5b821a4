//! Char/byte indexing and case-fold alignment over Unicode text.

use actrie::{ignore_case_alignment, Error, XString};

#[test]
fn char_and_byte_indexing_agree() {
    let xs = XString::new("a呵b呵");
    assert_eq!(xs.char_num(), 4);
    assert_eq!(xs.byte_num(), 8);

    assert_eq!(xs.char_at(0).unwrap(), 'a');
    assert_eq!(xs.char_at(1).unwrap(), '呵');
    assert_eq!(xs.char_at(3).unwrap(), '呵');

    assert_eq!(xs.byte_offset(0).unwrap(), 0);
    assert_eq!(xs.byte_offset(1).unwrap(), 1);
    assert_eq!(xs.byte_offset(2).unwrap(), 4);
    assert_eq!(xs.byte_offset(4).unwrap(), 8);
}

#[test]
fn out_of_range_indexing_is_an_error() {
    let xs = XString::new("ab");
    assert!(matches!(xs.char_at(2), Err(Error::OutOfRange { .. })));
    assert!(matches!(xs.byte_offset(3), Err(Error::OutOfRange { .. })));
}

#[test]
fn from_bytes_validates_utf8() {
    let xs = XString::from_bytes("呵呵".as_bytes()).unwrap();
    assert_eq!(xs.char_num(), 2);

    assert!(matches!(
        XString::from_bytes(&[0xff, 0xfe]),
        Err(Error::Decode(_))
    ));
}

#[test]
fn alignment_tracks_fold_expansion() {
    // 'İ' lowercases to "i\u{307}", so the folded text gains a char.
    let xs = XString::new("aa\u{130}b");
    let fold = ignore_case_alignment(&xs);

    assert_eq!(fold.lowercase().as_str(), "aai\u{307}b");
    assert_eq!(fold.alignment_array(), &[0, 1, 2, 2, 3]);

    assert_eq!(fold.translate(0), 0);
    assert_eq!(fold.translate(2), 2);
    assert_eq!(fold.translate(3), 2);
    assert_eq!(fold.translate(4), 3);
    // One past the folded end maps to the original char count.
    assert_eq!(fold.translate(5), 4);
}

#[test]
fn alignment_is_identity_for_ascii() {
    let xs = XString::new("Hello");
    let fold = ignore_case_alignment(&xs);

    assert_eq!(fold.lowercase().as_str(), "hello");
    assert_eq!(fold.alignment_array(), &[0, 1, 2, 3, 4]);
}
