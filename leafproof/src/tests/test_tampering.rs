use assert_matches::assert_matches;
use proptest::prelude::*;
use serde_json::json;

use crate::{
    Error, Keccak256, MultiProof, StandardMerkleTree,
    abi::{Token, parse_types},
    bytes::{from_hex, to_hex},
};

fn tree_of(count: u64) -> StandardMerkleTree {
    let values = (0..count)
        .map(|i| vec![Token::from(i), Token::String(format!("record-{}", i))])
        .collect();
    let encoding = parse_types(&["uint64", "string"]).expect("valid types");
    StandardMerkleTree::of(values, &encoding).expect("build tree")
}

fn flip_last_nibble(hex: &str) -> String {
    let mut bytes = from_hex(hex).expect("hex");
    if let Some(last) = bytes.last_mut() {
        *last ^= 0x0f;
    }
    to_hex(&bytes)
}

// ── Corrupt documents ───────────────────────────────────────────────

#[test]
fn test_load_rejects_tampered_internal_node() {
    let mut dumped = tree_of(5).dump();
    dumped.tree[1] = flip_last_nibble(&dumped.tree[1]);
    assert_matches!(
        StandardMerkleTree::<Keccak256>::load(&dumped),
        Err(Error::CorruptTree(_))
    );
}

#[test]
fn test_load_rejects_tampered_value() {
    let mut dumped = tree_of(5).dump();
    dumped.values[2].value[1] = json!("forged");
    assert_matches!(
        StandardMerkleTree::<Keccak256>::load(&dumped),
        Err(Error::CorruptTree(_))
    );
}

#[test]
fn test_load_rejects_swapped_tree_indices() {
    let mut dumped = tree_of(5).dump();
    let first = dumped.values[0].tree_index;
    dumped.values[0].tree_index = dumped.values[1].tree_index;
    dumped.values[1].tree_index = first;
    assert_matches!(
        StandardMerkleTree::<Keccak256>::load(&dumped),
        Err(Error::CorruptTree(_))
    );
}

#[test]
fn test_load_rejects_index_of_internal_node() {
    let mut dumped = tree_of(5).dump();
    dumped.values[0].tree_index = 0;
    assert_matches!(
        StandardMerkleTree::<Keccak256>::load(&dumped),
        Err(Error::CorruptTree(_))
    );
    dumped.values[0].tree_index = 99;
    assert_matches!(
        StandardMerkleTree::<Keccak256>::load(&dumped),
        Err(Error::CorruptTree(_))
    );
}

#[test]
fn test_load_rejects_missing_or_duplicate_values() {
    let dumped = tree_of(5).dump();

    let mut missing = dumped.clone();
    missing.values.pop();
    assert_matches!(
        StandardMerkleTree::<Keccak256>::load(&missing),
        Err(Error::CorruptTree(_))
    );

    let mut duplicated = dumped.clone();
    duplicated.values[1] = duplicated.values[0].clone();
    assert_matches!(
        StandardMerkleTree::<Keccak256>::load(&duplicated),
        Err(Error::CorruptTree(_))
    );
}

#[test]
fn test_load_rejects_bad_shapes() {
    let dumped = tree_of(3).dump();

    let mut empty = dumped.clone();
    empty.tree.clear();
    empty.values.clear();
    assert_matches!(
        StandardMerkleTree::<Keccak256>::load(&empty),
        Err(Error::CorruptTree(_))
    );

    let mut truncated = dumped.clone();
    truncated.tree.pop();
    assert_matches!(
        StandardMerkleTree::<Keccak256>::load(&truncated),
        Err(Error::CorruptTree(_))
    );

    let mut bad_hex = dumped.clone();
    bad_hex.tree[0] = "0x00".to_string();
    assert_matches!(
        StandardMerkleTree::<Keccak256>::load(&bad_hex),
        Err(Error::CorruptTree(_))
    );

    let mut bad_encoding = dumped;
    bad_encoding.leaf_encoding = vec!["uint64".to_string(), "tuple".to_string()];
    assert_matches!(
        StandardMerkleTree::<Keccak256>::load(&bad_encoding),
        Err(Error::CorruptTree(_))
    );
}

#[test]
fn test_load_rejects_deeply_nested_encoding() {
    let mut nested = tree_of(3).dump();
    nested.leaf_encoding[0] = format!("uint256{}", "[]".repeat(200_000));
    assert_matches!(
        StandardMerkleTree::<Keccak256>::load(&nested),
        Err(Error::CorruptTree(_))
    );

    let mut oversized = tree_of(3).dump();
    oversized.leaf_encoding[0] = "uint256[99999999999]".to_string();
    assert_matches!(
        StandardMerkleTree::<Keccak256>::load(&oversized),
        Err(Error::CorruptTree(_))
    );
}

// ── Tampered proofs ─────────────────────────────────────────────────

#[test]
fn test_any_flipped_proof_byte_fails_verification() {
    let tree = tree_of(8);
    let proof = tree.get_proof(&3usize).unwrap();
    for i in 0..proof.len() {
        let mut tampered = proof.clone();
        tampered[i] = flip_last_nibble(&tampered[i]);
        assert!(!tree.verify(&3usize, &tampered).unwrap());
    }
    // dropping a step is a mismatch too, not an error
    assert!(!tree.verify(&3usize, &proof[1..]).unwrap());
}

#[test]
fn test_tampered_multiproof_fails_verification() {
    let tree = tree_of(8);
    let multiproof = tree.get_multi_proof(&[0usize, 3, 6]).unwrap();
    assert!(tree.verify_multi_proof(&multiproof).unwrap());

    for i in 0..multiproof.proof.len() {
        let mut tampered = multiproof.clone();
        tampered.proof[i] = flip_last_nibble(&tampered.proof[i]);
        assert!(!tree.verify_multi_proof(&tampered).unwrap());
    }

    let mut foreign = multiproof.clone();
    foreign.leaves[0] = vec![Token::from(99u64), Token::String("record-99".to_string())];
    assert!(!tree.verify_multi_proof(&foreign).unwrap());
}

#[test]
fn test_permuted_flags_fail_verification() {
    let tree = tree_of(8);
    let multiproof = tree.get_multi_proof(&[0usize, 3, 6]).unwrap();
    let flags = &multiproof.proof_flags;
    for i in 0..flags.len() {
        for j in i + 1..flags.len() {
            if flags[i] == flags[j] {
                continue;
            }
            let mut permuted = multiproof.clone();
            permuted.proof_flags.swap(i, j);
            assert!(!tree.verify_multi_proof(&permuted).unwrap());
        }
    }
}

#[test]
fn test_inconsistent_multiproof_is_an_error() {
    let tree = tree_of(8);
    let mut multiproof = tree.get_multi_proof(&[0usize, 3]).unwrap();
    multiproof.proof_flags.push(true);
    assert_matches!(
        tree.verify_multi_proof(&multiproof),
        Err(Error::InvalidMultiProof(_))
    );

    let empty: MultiProof<String, usize> = MultiProof {
        leaves: vec![],
        proof: vec![],
        proof_flags: vec![],
    };
    assert_matches!(
        tree.verify_multi_proof(&empty),
        Err(Error::InvalidMultiProof(_))
    );
}

// ── Properties ──────────────────────────────────────────────────────

fn count_and_subset() -> impl Strategy<Value = (u64, Vec<usize>)> {
    (1u64..24).prop_flat_map(|count| {
        (
            Just(count),
            proptest::sample::subsequence((0..count as usize).collect::<Vec<_>>(), 1..=count as usize),
        )
    })
}

proptest! {
    #[test]
    fn test_random_single_proofs_verify(count in 1u64..24, pick in any::<prop::sample::Index>()) {
        let tree = tree_of(count);
        let index = pick.index(count as usize);
        let proof = tree.get_proof(&index).unwrap();
        prop_assert!(tree.verify(&index, &proof).unwrap());
    }

    #[test]
    fn test_random_multiproofs_verify((count, subset) in count_and_subset()) {
        let tree = tree_of(count);
        let multiproof = tree.get_multi_proof(&subset).unwrap();
        prop_assert_eq!(multiproof.leaves.len(), subset.len());
        prop_assert!(tree.verify_multi_proof(&multiproof).unwrap());
    }

    #[test]
    fn test_random_trees_survive_dump_and_load(count in 1u64..24) {
        let tree = tree_of(count);
        let loaded = StandardMerkleTree::<Keccak256>::load(&tree.dump()).unwrap();
        prop_assert_eq!(loaded.root(), tree.root());
        prop_assert_eq!(loaded.dump(), tree.dump());
    }
}
