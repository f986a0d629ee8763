//! End-to-end search and recovery scenarios.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use num_bigint::BigUint;

use wg_vanity::crypto::{add_offset, clamp, decode_public, Keypair};
use wg_vanity::curve::EdwardsPoint;
use wg_vanity::matcher::Base64Prefix;
use wg_vanity::worker::BatchEnumerator;

fn search_from(start: &EdwardsPoint, prefix: &Base64Prefix, skip: u64, batch_size: usize)
    -> (BigUint, [u8; 32])
{
    let mut enumerator = BatchEnumerator::new(start, skip, batch_size);
    loop {
        if let Some((offset, public_key)) = enumerator.step(|bytes| prefix.matches(bytes)) {
            return (BigUint::from(offset), public_key);
        }
    }
}

#[test]
fn known_public_key_yields_known_offset() {
    // Reference vector: searching from this key with skip 0 first hits
    // the prefix "AY/" at offset 92950.
    let start_b64 = "qkHBetbXfAxsmr0jH6Zs6Dx1ZEReO9WBZCoNREce0gE=";
    let expected_b64 = "AY/yq7zukqRmMUzqqPFmtqXJdAcbmh8mn4rMgtjVnGI=";

    let start = decode_public(start_b64).unwrap();
    let prefix = Base64Prefix::new("AY/").unwrap();

    let (offset, public_key) = search_from(&start, &prefix, 0, 1024);

    assert_eq!(offset, BigUint::from(92950u32));
    assert_eq!(STANDARD.encode(public_key), expected_b64);
}

#[test]
fn blind_search_offset_recovers_the_private_key() {
    // A searcher holding only the public key reports an offset; the key
    // owner applies it. The decoded starting point may be the negative
    // of the real one, which recovery resolves by trying s0 - 8n too.
    let prefix = Base64Prefix::new("AY").unwrap();

    for (skip, batch_size) in [(0u64, 512usize), (3, 1024), (1 << 63, 512)] {
        let keypair = Keypair::generate();

        let start = decode_public(&keypair.public_base64()).unwrap();
        let (offset, found_key) = search_from(&start, &prefix, skip, batch_size);

        let vanity_secret = add_offset(keypair.secret_bytes(), &offset, Some(&found_key))
            .unwrap_or_else(|e| panic!("recovery failed at skip {}: {}", skip, e));

        let mut clamped = vanity_secret;
        clamp(&mut clamped);
        let derived = EdwardsPoint::mul_base(&clamped).montgomery_bytes();

        assert_eq!(derived, found_key, "skip {}", skip);
        assert!(STANDARD.encode(derived).starts_with("AY"));
    }
}

#[test]
fn seeded_search_matches_across_batch_sizes() {
    // The same starting point must yield the same first offset for any
    // batch size when the skip is fixed.
    let keypair = Keypair::generate();
    let prefix = Base64Prefix::new("V").unwrap();

    let (reference, reference_key) = search_from(keypair.public_point(), &prefix, 0, 2);
    for batch_size in [512usize, 1024] {
        let (offset, key) = search_from(keypair.public_point(), &prefix, 0, batch_size);
        assert_eq!(offset, reference, "batch size {}", batch_size);
        assert_eq!(key, reference_key, "batch size {}", batch_size);
    }
}
