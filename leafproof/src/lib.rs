//! Sorted-pair Merkle trees with single and batched inclusion proofs.
//!
//! The tree over `L` leaves is stored flattened as `2L - 1` hashes in
//! level-order, leaves in the tail. Internal nodes hash their two children
//! in byte order, so a proof is a plain list of sibling hashes with no
//! left/right markers:
//!
//! `node = H(min(left, right) || max(left, right))`
//!
//! Leaves are `H(H(encoded_value))`. [`StandardMerkleTree`] builds trees over
//! typed records encoded like Solidity's `abi.encode`, which with the default
//! [`Keccak256`] hasher makes its roots and proofs checkable on chain.

#![warn(missing_docs)]

pub mod abi;
pub mod bytes;
mod error;
pub mod hash;
pub mod proof;
pub mod standard;
pub mod tree;
pub mod utils;
mod verify;

#[cfg(test)]
mod tests;

pub use error::{Error, Result};
pub use hash::{Blake3, Hash, Keccak256, MerkleHasher};
pub use proof::MultiProof;
pub use standard::{
    AsLeafRef, LeafRef, StandardMerkleTree, StandardMerkleTreeData, TreeOptions,
};
pub use verify::process_multi_proof;
