use assert_matches::assert_matches;
use proptest::prelude::*;

use super::*;
use crate::{
    hash::{Keccak256, MerkleHasher},
    tree::make_merkle_tree,
    verify::process_multi_proof,
};

fn tree_of(count: usize) -> Vec<Hash> {
    let leaves: Vec<Hash> = (0..count as u32)
        .map(|i| Keccak256::hash(&i.to_be_bytes()))
        .collect();
    make_merkle_tree::<Keccak256>(&leaves).expect("non-empty leaves")
}

// ── Generation ──────────────────────────────────────────────────────

#[test]
fn test_all_leaves_need_no_proof() {
    let tree = tree_of(3);
    let multiproof = get_multi_proof(&tree, &[2, 3, 4]).expect("leaf positions");
    assert_eq!(multiproof.leaves, vec![tree[4], tree[3], tree[2]]);
    assert!(multiproof.proof.is_empty());
    assert_eq!(multiproof.proof_flags, vec![true, true]);
}

#[test]
fn test_single_leaf_matches_path() {
    let tree = tree_of(3);
    let multiproof = get_multi_proof(&tree, &[4]).expect("leaf position");
    assert_eq!(multiproof.leaves, vec![tree[4]]);
    assert_eq!(multiproof.proof, vec![tree[3], tree[2]]);
    assert_eq!(multiproof.proof_flags, vec![false, false]);
}

#[test]
fn test_single_node_tree() {
    let tree = tree_of(1);
    let multiproof = get_multi_proof(&tree, &[0]).expect("only leaf");
    assert_eq!(multiproof.leaves, vec![tree[0]]);
    assert!(multiproof.proof.is_empty());
    assert!(multiproof.proof_flags.is_empty());
}

#[test]
fn test_leaves_come_back_in_descending_position_order() {
    let tree = tree_of(5);
    let multiproof = get_multi_proof(&tree, &[4, 8, 6]).expect("leaf positions");
    assert_eq!(multiproof.leaves, vec![tree[8], tree[6], tree[4]]);
    assert_eq!(process_multi_proof::<Keccak256>(&multiproof).unwrap(), tree[0]);
}

#[test]
fn test_rejects_bad_indices() {
    let tree = tree_of(4);
    assert_matches!(get_multi_proof(&tree, &[]), Err(Error::InvalidInput(_)));
    assert_matches!(get_multi_proof(&tree, &[5, 5]), Err(Error::InvalidInput(_)));
    assert_matches!(get_multi_proof(&tree, &[2]), Err(Error::IndexOutOfBounds(_)));
    assert_matches!(get_multi_proof(&tree, &[7]), Err(Error::IndexOutOfBounds(_)));
}

// ── Tampering ───────────────────────────────────────────────────────

#[test]
fn test_tampered_proof_hash_changes_root() {
    let tree = tree_of(6);
    let mut multiproof = get_multi_proof(&tree, &[10, 7]).expect("leaf positions");
    assert!(!multiproof.proof.is_empty());
    multiproof.proof[0][31] ^= 0x01;
    assert_ne!(process_multi_proof::<Keccak256>(&multiproof).unwrap(), tree[0]);
}

#[test]
fn test_tampered_leaf_changes_root() {
    let tree = tree_of(6);
    let mut multiproof = get_multi_proof(&tree, &[10, 7]).expect("leaf positions");
    multiproof.leaves[1] = Keccak256::hash(b"intruder");
    assert_ne!(process_multi_proof::<Keccak256>(&multiproof).unwrap(), tree[0]);
}

// ── Encoding ────────────────────────────────────────────────────────

#[test]
fn test_encoded_proof_decodes_to_same_proof() {
    let tree = tree_of(7);
    let multiproof = get_multi_proof(&tree, &[6, 9, 12]).expect("leaf positions");
    let bytes = multiproof.encode_to_vec().expect("encode");
    let decoded = MultiProof::decode_from_slice(&bytes).expect("decode");
    assert_eq!(decoded, multiproof);
}

#[test]
fn test_decode_rejects_trailing_bytes() {
    let tree = tree_of(2);
    let multiproof = get_multi_proof(&tree, &[1]).expect("leaf position");
    let mut bytes = multiproof.encode_to_vec().expect("encode");
    bytes.push(0);
    assert_matches!(
        MultiProof::decode_from_slice(&bytes),
        Err(Error::InvalidMultiProof(_))
    );
    assert_matches!(
        MultiProof::decode_from_slice(&[0xff]),
        Err(Error::InvalidMultiProof(_))
    );
}

#[test]
fn test_decode_enforces_size_limit() {
    // a leaf count of 2^40 claims terabytes before any hash is read
    let mut bytes = vec![253u8];
    bytes.extend_from_slice(&(1u64 << 40).to_be_bytes());
    assert_matches!(
        MultiProof::decode_from_slice(&bytes),
        Err(Error::InvalidMultiProof(_))
    );
}

#[test]
fn test_hex_proof_serializes_camel_case() {
    let multiproof: MultiProof<String> = MultiProof {
        leaves: vec!["0x01".to_string()],
        proof: vec![],
        proof_flags: vec![],
    };
    let json = serde_json::to_value(&multiproof).expect("serialize");
    assert_eq!(
        json,
        serde_json::json!({ "leaves": ["0x01"], "proof": [], "proofFlags": [] })
    );
}

// ── Properties ──────────────────────────────────────────────────────

fn tree_and_subset() -> impl Strategy<Value = (usize, Vec<usize>)> {
    (1usize..40).prop_flat_map(|count| {
        (
            Just(count),
            proptest::sample::subsequence((0..count).collect::<Vec<_>>(), 1..=count),
        )
    })
}

proptest! {
    #[test]
    fn test_random_multiproof_reaches_root((count, subset) in tree_and_subset()) {
        let tree = tree_of(count);
        let positions: Vec<usize> = subset.iter().map(|k| tree.len() - 1 - k).collect();
        let multiproof = get_multi_proof(&tree, &positions).unwrap();
        prop_assert_eq!(multiproof.leaves.len(), positions.len());
        prop_assert_eq!(
            multiproof.leaves.len() + multiproof.proof.len(),
            multiproof.proof_flags.len() + 1
        );
        prop_assert_eq!(process_multi_proof::<Keccak256>(&multiproof).unwrap(), tree[0]);
    }
}
