use tessera_wire::{
    WireError, decode_cipher_pairs, decode_item_ids, decode_secret_total, encode_cipher_pairs,
    encode_item_ids, encode_secret_total,
};

#[test]
fn item_id_layout_matches_wire_format() {
    let encoded = encode_item_ids(&["ab", "c"]).unwrap();
    assert_eq!(
        encoded,
        vec![0, 0, 0, 2, 0, 0, 0, 2, b'a', b'b', 0, 0, 0, 1, b'c']
    );
    assert_eq!(decode_item_ids(&encoded).unwrap(), vec!["ab", "c"]);
}

#[test]
fn empty_id_list_is_just_a_count() {
    let encoded = encode_item_ids::<&str>(&[]).unwrap();
    assert_eq!(encoded, vec![0, 0, 0, 0]);
    assert!(decode_item_ids(&encoded).unwrap().is_empty());
}

#[test]
fn truncated_id_list_fails() {
    let mut encoded = encode_item_ids(&["2023033018280000", "2023033018280001"]).unwrap();
    encoded.truncate(encoded.len() - 3);

    assert!(matches!(
        decode_item_ids(&encoded),
        Err(WireError::Truncated { .. })
    ));
}

#[test]
fn inflated_count_fails_without_allocating() {
    let encoded = [0xff, 0xff, 0xff, 0xff, 0, 0, 0, 0];
    assert!(matches!(
        decode_item_ids(&encoded),
        Err(WireError::Truncated { .. })
    ));
}

#[test]
fn trailing_garbage_rejected() {
    let mut encoded = encode_item_ids(&["x"]).unwrap();
    encoded.push(7);
    assert_eq!(decode_item_ids(&encoded), Err(WireError::TrailingBytes(1)));
}

#[test]
fn secret_total_is_big_endian() {
    assert_eq!(encode_secret_total(25), [0, 0, 0, 0, 0, 0, 0, 25]);
    assert_eq!(decode_secret_total(&encode_secret_total(u64::MAX)).unwrap(), u64::MAX);
    assert_eq!(
        decode_secret_total(&[1, 2, 3]),
        Err(WireError::InvalidLength {
            expected: 8,
            got: 3
        })
    );
}

#[test]
fn cipher_pairs_frame_each_half() {
    let pairs = vec![(vec![1u8, 2], vec![3u8]), (vec![], vec![4u8, 5, 6])];
    let encoded = encode_cipher_pairs(&pairs).unwrap();
    assert_eq!(decode_cipher_pairs(&encoded).unwrap(), pairs);

    // a dangling alpha frame without its beta is an error
    assert!(decode_cipher_pairs(&encoded[..6]).is_err());
}
