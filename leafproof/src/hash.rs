//! Hash primitives and the two node-hashing entry points.
//!
//! Leaves and internal nodes are hashed through different functions with
//! different preimage shapes:
//!
//! - Leaf nodes:     `H(H(encoded_value))`, a 32-byte outer preimage
//! - Internal nodes: `H(min(a, b) || max(a, b))`, a 64-byte preimage
//!
//! Because the outer preimages never have the same length, a leaf digest can
//! not be presented as an internal node (or the other way around) to forge a
//! proof.

use sha3::Digest;

use crate::bytes::compare_bytes;

/// Length in bytes of every node hash.
pub const HASH_SIZE: usize = 32;

/// A node hash.
pub type Hash = [u8; HASH_SIZE];

/// A 32-byte cryptographic hash function.
pub trait MerkleHasher {
    /// Hash an arbitrary byte string.
    fn hash(data: &[u8]) -> Hash;
}

/// Keccak-256 as used by the EVM. Trees built with it can be verified by
/// on-chain sorted-pair Merkle proof verifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Keccak256;

impl MerkleHasher for Keccak256 {
    fn hash(data: &[u8]) -> Hash {
        let digest = sha3::Keccak256::digest(data);
        let mut out = [0u8; HASH_SIZE];
        out.copy_from_slice(&digest);
        out
    }
}

/// BLAKE3 with its default 32-byte output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Blake3;

impl MerkleHasher for Blake3 {
    fn hash(data: &[u8]) -> Hash {
        *blake3::hash(data).as_bytes()
    }
}

/// Hash an encoded value into a leaf: `H(H(encoded))`.
pub fn hash_leaf<H: MerkleHasher>(encoded: &[u8]) -> Hash {
    H::hash(&H::hash(encoded))
}

/// Combine two sibling hashes: `H(min(a, b) || max(a, b))`.
///
/// The pair is ordered by byte value first, so the result does not depend on
/// which child is on the left.
pub fn hash_pair<H: MerkleHasher>(a: &Hash, b: &Hash) -> Hash {
    let (first, second) = if compare_bytes(a, b).is_le() {
        (a, b)
    } else {
        (b, a)
    };
    let mut input = [0u8; HASH_SIZE * 2];
    input[..HASH_SIZE].copy_from_slice(first);
    input[HASH_SIZE..].copy_from_slice(second);
    H::hash(&input)
}
