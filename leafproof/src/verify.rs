//! Multiproof verification.
//!
//! Pure function, no tree required. Recomputes the implied root from the
//! proved leaves, the extra proof hashes and the flags.

use std::collections::VecDeque;

use log::debug;

use crate::{
    Error, Result,
    hash::{Hash, MerkleHasher, hash_pair},
    proof::MultiProof,
};

const LOG_TARGET: &str = "leafproof::verify";

fn rejected(reason: String) -> Error {
    debug!(target: LOG_TARGET, "rejecting multiproof: {}", reason);
    Error::InvalidMultiProof(reason)
}

/// Check that the flags fit the number of leaves and proof hashes.
pub(crate) fn check_multi_proof_shape<T, L>(multiproof: &MultiProof<T, L>) -> Result<()> {
    let MultiProof {
        leaves,
        proof,
        proof_flags,
    } = multiproof;

    let proof_pulls = proof_flags.iter().filter(|flag| !**flag).count();
    if proof.len() < proof_pulls {
        return Err(rejected(format!(
            "flags require {} proof hashes but only {} were given",
            proof_pulls,
            proof.len()
        )));
    }
    if leaves.len() + proof.len() != proof_flags.len() + 1 {
        return Err(rejected(format!(
            "{} leaves and {} proof hashes do not fit {} flags",
            leaves.len(),
            proof.len(),
            proof_flags.len()
        )));
    }
    Ok(())
}

/// Replay the flags. `Err` carries the step at which the queue or the proof
/// ran dry.
pub(crate) fn replay_multi_proof<H: MerkleHasher>(
    multiproof: &MultiProof<Hash>,
) -> std::result::Result<Hash, usize> {
    let mut queue: VecDeque<Hash> = multiproof.leaves.iter().copied().collect();
    let mut proof = multiproof.proof.iter();
    for (step, &flag) in multiproof.proof_flags.iter().enumerate() {
        let a = queue.pop_front().ok_or(step)?;
        let b = if flag {
            queue.pop_front().ok_or(step)?
        } else {
            *proof.next().ok_or(step)?
        };
        queue.push_back(hash_pair::<H>(&a, &b));
    }

    // With no flags the single input is the root itself.
    match queue.pop_back() {
        Some(root) => Ok(root),
        None => proof.next().copied().ok_or(multiproof.proof_flags.len()),
    }
}

/// Replay `multiproof` and return the implied root.
///
/// Fails with [`Error::InvalidMultiProof`] when the flags do not fit the
/// number of leaves and proof hashes, or when the replay would consume more
/// hashes than were supplied.
pub fn process_multi_proof<H: MerkleHasher>(multiproof: &MultiProof<Hash>) -> Result<Hash> {
    check_multi_proof_shape(multiproof)?;
    replay_multi_proof::<H>(multiproof)
        .map_err(|step| rejected(format!("ran out of hashes at step {}", step)))
}
