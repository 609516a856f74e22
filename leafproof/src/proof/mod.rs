//! Multiproof generation for the flattened tree.
//!
//! A [`MultiProof`] proves several leaves at once. Verification replays
//! `proof_flags` against a FIFO queue seeded with `leaves`: each step takes
//! the queue head and combines it with either the next queue entry (`true`)
//! or the next unused `proof` hash (`false`), pushing the result back onto
//! the queue.

use std::collections::VecDeque;

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    hash::Hash,
    tree::{check_leaf_node, parent_index, sibling_index},
};

#[cfg(test)]
mod tests;

/// Upper bound for [`MultiProof::decode_from_slice`] input.
const MAX_ENCODED_SIZE: usize = 16 * 1024 * 1024;

/// A batched inclusion proof.
///
/// `T` is the hash representation (raw [`Hash`] or hex `String`), `L` the
/// leaf representation (hashes, or application values at the facade level).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiProof<T, L = T> {
    /// Proved leaves, in the order verification must consume them.
    pub leaves: Vec<L>,
    /// Sibling hashes that can not be derived from `leaves`.
    pub proof: Vec<T>,
    /// One flag per combination step; `true` takes the partner from the
    /// queue, `false` from `proof`.
    pub proof_flags: Vec<bool>,
}

#[derive(Encode, Decode)]
struct EncodedMultiProof {
    leaves: Vec<Hash>,
    proof: Vec<Hash>,
    proof_flags: Vec<bool>,
}

impl MultiProof<Hash> {
    /// Encode to bytes using bincode.
    pub fn encode_to_vec(&self) -> Result<Vec<u8>> {
        let config = bincode::config::standard()
            .with_big_endian()
            .with_no_limit();
        let encoded = EncodedMultiProof {
            leaves: self.leaves.clone(),
            proof: self.proof.clone(),
            proof_flags: self.proof_flags.clone(),
        };
        bincode::encode_to_vec(&encoded, config)
            .map_err(|e| Error::InvalidMultiProof(format!("encode error: {}", e)))
    }

    /// Decode from bytes using bincode.
    ///
    /// Only the encoding is checked here; flag/length consistency is checked
    /// when the proof is processed.
    pub fn decode_from_slice(bytes: &[u8]) -> Result<Self> {
        let config = bincode::config::standard()
            .with_big_endian()
            .with_limit::<MAX_ENCODED_SIZE>();
        let (decoded, read): (EncodedMultiProof, usize) =
            bincode::decode_from_slice(bytes, config)
                .map_err(|e| Error::InvalidMultiProof(format!("decode error: {}", e)))?;
        if read != bytes.len() {
            return Err(Error::InvalidMultiProof(format!(
                "{} trailing bytes after multiproof",
                bytes.len() - read
            )));
        }
        Ok(MultiProof {
            leaves: decoded.leaves,
            proof: decoded.proof,
            proof_flags: decoded.proof_flags,
        })
    }
}

/// Build a multiproof for the leaves at tree positions `indices`.
///
/// The returned `leaves` are ordered by descending tree position, which is
/// the order the replay queue needs; callers must verify with that order.
pub fn get_multi_proof(tree: &[Hash], indices: &[usize]) -> Result<MultiProof<Hash>> {
    if indices.is_empty() {
        return Err(Error::InvalidInput(
            "cannot build a multiproof for an empty set of indices".to_string(),
        ));
    }
    for &index in indices {
        check_leaf_node(tree.len(), index)?;
    }

    let mut sorted = indices.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    if let Some(pair) = sorted.windows(2).find(|pair| pair[0] == pair[1]) {
        return Err(Error::InvalidInput(format!(
            "cannot prove duplicated index {}",
            pair[0]
        )));
    }

    let mut queue: VecDeque<usize> = sorted.iter().copied().collect();
    let mut proof = Vec::new();
    let mut proof_flags = Vec::new();

    while let Some(current) = queue.pop_front() {
        let (Some(sibling), Some(parent)) = (sibling_index(current), parent_index(current))
        else {
            // reached the root
            break;
        };
        if queue.front() == Some(&sibling) {
            proof_flags.push(true);
            queue.pop_front();
        } else {
            proof_flags.push(false);
            proof.push(tree[sibling]);
        }
        queue.push_back(parent);
    }

    Ok(MultiProof {
        leaves: sorted.iter().map(|&i| tree[i]).collect(),
        proof,
        proof_flags,
    })
}
