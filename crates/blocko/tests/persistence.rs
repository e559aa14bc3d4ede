//! Container export/import behavior, including partial-failure recovery.

use proptest::prelude::*;

use blocko::core::Block;
use blocko::store::{encode_container, CodecError, StoreError, CONTAINER_ID, FORMAT_VERSION};
use blocko::{Chain, ChainError, SkipReason, ValidationError};
use blocko_testkit::generators::{chain_name, payload, tamper};
use blocko_testkit::TestFixture;

fn fixture_blocks() -> Vec<Block> {
    TestFixture::with_seed([9; 32]).signed_chain("Acme", &[b"one", b"two", b"three"])
}

#[test]
fn test_out_of_order_records_are_skipped() {
    let b = fixture_blocks();
    let bytes = encode_container("Acme", &[b[0].clone(), b[2].clone(), b[1].clone()]);

    let mut chain = Chain::default();
    let report = chain.import_bytes(&bytes).unwrap();

    assert_eq!(report.accepted, 2);
    assert_eq!(
        report.skipped[0].reason,
        SkipReason::Invalid(ValidationError::PredecessorMissing { id: 2, prev_id: 1 })
    );
    assert_eq!(chain.blocks(), &b[..2]);
    assert_eq!(chain.next_id(), 2);
}

#[test]
fn test_duplicate_and_descending_ids_are_skipped() {
    let fixture = TestFixture::with_seed([9; 32]);
    let genesis = fixture.make_genesis("Acme");
    let two = fixture.make_block(&genesis, 2, &fixture.public_key(), b"two");
    let one = fixture.make_block(&genesis, 1, &fixture.public_key(), b"one");

    let bytes = encode_container("Acme", &[genesis, two.clone(), two, one]);
    let mut chain = Chain::default();
    let report = chain.import_bytes(&bytes).unwrap();

    assert_eq!(report.accepted, 2);
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(
        report.skipped[0].reason,
        SkipReason::OutOfOrder(StoreError::NonMonotonicId { last: 2, got: 2 })
    );
    assert_eq!(
        report.skipped[1].reason,
        SkipReason::OutOfOrder(StoreError::NonMonotonicId { last: 2, got: 1 })
    );
    assert_eq!(chain.next_id(), 3);
}

#[test]
fn test_next_id_follows_last_accepted_block() {
    let b = fixture_blocks();
    // Genesis for a different name: every record fails to link
    let bytes = encode_container("Other", &b);

    let mut chain = Chain::default();
    let report = chain.import_bytes(&bytes).unwrap();
    assert_eq!(report.accepted, 0);
    assert_eq!(report.declared, 4);
    assert_eq!(chain.name(), "Other");
    assert_eq!(chain.next_id(), 0);
    assert!(chain.is_empty());
}

#[test]
fn test_truncated_container_keeps_accepted_blocks() {
    let b = fixture_blocks();
    let bytes = encode_container("Acme", &b);

    let mut chain = Chain::default();
    let report = chain.import_bytes(&bytes[..bytes.len() - 5]).unwrap();

    assert_eq!(report.accepted, 3);
    assert!(matches!(report.truncated, Some(CodecError::Truncated { .. })));
    assert!(!report.is_clean());
    assert_eq!(chain.len(), 3);
    assert_eq!(chain.next_id(), 3);
}

#[test]
fn test_trailing_bytes_are_ignored() {
    let b = fixture_blocks();
    let mut bytes = encode_container("Acme", &b).to_vec();
    bytes.extend_from_slice(b"garbage");

    let mut chain = Chain::default();
    let report = chain.import_bytes(&bytes).unwrap();
    assert!(report.is_clean());
    assert_eq!(chain.len(), 4);
}

#[test]
fn test_header_errors_are_fatal() {
    let mut chain = Chain::default();
    chain.new_chain("Keep").unwrap();

    let mut newer = encode_container("Acme", &[]).to_vec();
    newer[8..16].copy_from_slice(&(FORMAT_VERSION + 1).to_le_bytes());
    assert!(matches!(
        chain.import_bytes(&newer),
        Err(ChainError::Codec(CodecError::UnsupportedVersion { .. }))
    ));

    assert!(matches!(
        chain.import_bytes(&[0u8; 4]),
        Err(ChainError::Codec(CodecError::Truncated { .. }))
    ));

    let mut bad_name = Vec::new();
    bad_name.extend_from_slice(&CONTAINER_ID.to_le_bytes());
    bad_name.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bad_name.extend_from_slice(&0u64.to_le_bytes());
    bad_name.extend_from_slice(&2u64.to_le_bytes());
    bad_name.extend_from_slice(&[0xff, 0xfe]);
    assert!(matches!(
        chain.import_bytes(&bad_name),
        Err(ChainError::Codec(CodecError::InvalidName))
    ));

    assert_eq!(chain.name(), "Keep");
    assert_eq!(chain.len(), 1);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut chain = Chain::default();
    let result = chain.import_chain(dir.path().join("absent.chain"));
    assert!(matches!(result, Err(ChainError::Io(_))));
}

#[test]
fn test_empty_chain_round_trips() {
    let chain = Chain::default();
    let bytes = chain.export_bytes();

    let mut imported = Chain::default();
    let report = imported.import_bytes(&bytes).unwrap();
    assert_eq!(report.accepted, 0);
    assert!(report.is_clean());
    assert_eq!(imported.name(), "");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_export_import_round_trip(
        name in chain_name(),
        payloads in prop::collection::vec(payload(128), 0..6),
    ) {
        let mut chain = Chain::default();
        chain.new_chain(&name).unwrap();
        for (i, data) in payloads.iter().enumerate() {
            chain.append_to(i as u32, None, data).unwrap();
        }

        let mut imported = Chain::default();
        let report = imported.import_bytes(&chain.export_bytes()).unwrap();

        prop_assert!(report.is_clean());
        prop_assert_eq!(report.accepted, chain.len());
        prop_assert_eq!(imported.blocks(), chain.blocks());
        prop_assert_eq!(imported.next_id(), chain.next_id());
        prop_assert_eq!(imported.name(), chain.name());
    }

    #[test]
    fn test_tampered_block_and_descendants_are_rejected(
        index in 0usize..4,
        t in tamper(),
    ) {
        let mut blocks = fixture_blocks();
        prop_assume!(t.apply(&mut blocks[index]));

        let mut chain = Chain::default();
        let report = chain.import_bytes(&encode_container("Acme", &blocks)).unwrap();

        prop_assert_eq!(report.accepted, index);
        prop_assert_eq!(report.skipped.len(), blocks.len() - index);
        prop_assert_eq!(
            &report.skipped[0].reason,
            &SkipReason::Invalid(ValidationError::HashMismatch { id: index as u32 })
        );
    }
}
