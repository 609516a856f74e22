//! Flattened sorted-pair Merkle tree.
//!
//! A tree over `L` leaves is a `Vec<Hash>` of length `2L - 1` indexed
//! level-order: root=0, left child=2i+1, right child=2i+2. Leaf `k` (in the
//! order given to [`make_merkle_tree`]) is stored at `len - 1 - k`, so the
//! leaves fill the tail of the array in reverse.
//!
//! Every internal position has exactly two children in this layout for any
//! `L >= 1`; there is no odd-node case to pair or promote.

use std::io::{self, Write};

use leafproof_visualize::{Drawer, Visualize, visualize_to_vec};
use log::trace;

use crate::{
    Error, Result,
    hash::{Hash, MerkleHasher, hash_pair},
    utils::check_bounds,
};

const LOG_TARGET: &str = "leafproof::tree";

/// Position of the left child of `index`.
pub fn left_child_index(index: usize) -> usize {
    2 * index + 1
}

/// Position of the right child of `index`.
pub fn right_child_index(index: usize) -> usize {
    2 * index + 2
}

/// Position of the parent of `index`, `None` for the root.
pub fn parent_index(index: usize) -> Option<usize> {
    index.checked_sub(1).map(|i| i / 2)
}

/// Position of the sibling of `index`, `None` for the root.
pub fn sibling_index(index: usize) -> Option<usize> {
    match index {
        0 => None,
        i if i % 2 == 1 => Some(i + 1),
        i => Some(i - 1),
    }
}

/// Whether `index` is a leaf position in a tree of `tree_len` nodes.
pub fn is_leaf_node(tree_len: usize, index: usize) -> bool {
    index < tree_len && left_child_index(index) >= tree_len
}

/// Fail with [`Error::IndexOutOfBounds`] unless `index` is a leaf position.
pub(crate) fn check_leaf_node(tree_len: usize, index: usize) -> Result<()> {
    check_bounds(tree_len, index)?;
    if !is_leaf_node(tree_len, index) {
        return Err(Error::IndexOutOfBounds(format!(
            "position {} is an internal node, not a leaf",
            index
        )));
    }
    Ok(())
}

/// Tree position of the `leaf_index`-th leaf (0-based, in construction
/// order) in a tree of `tree_len` nodes.
pub fn leaf_index_to_tree_index(tree_len: usize, leaf_index: usize) -> Result<usize> {
    let leaf_count = tree_len.div_ceil(2);
    check_bounds(leaf_count, leaf_index)?;
    Ok(tree_len - 1 - leaf_index)
}

/// Build the flattened tree over `leaves`.
///
/// Leaf order is kept as given; only sibling pairs are ordered (inside
/// [`hash_pair`]).
pub fn make_merkle_tree<H: MerkleHasher>(leaves: &[Hash]) -> Result<Vec<Hash>> {
    if leaves.is_empty() {
        return Err(Error::InvalidInput(
            "expected a non-zero number of leaves".to_string(),
        ));
    }

    let tree_len = 2 * leaves.len() - 1;
    let mut tree = vec![[0u8; 32]; tree_len];
    for (i, leaf) in leaves.iter().enumerate() {
        tree[tree_len - 1 - i] = *leaf;
    }
    for i in (0..tree_len - leaves.len()).rev() {
        tree[i] = hash_pair::<H>(
            &tree[left_child_index(i)],
            &tree[right_child_index(i)],
        );
    }

    trace!(
        target: LOG_TARGET,
        "built tree of {} nodes over {} leaves",
        tree_len,
        leaves.len()
    );
    Ok(tree)
}

/// Sibling hashes from the leaf at tree position `index` up to, not
/// including, the root.
pub fn get_proof(tree: &[Hash], index: usize) -> Result<Vec<Hash>> {
    check_leaf_node(tree.len(), index)?;

    let mut proof = Vec::new();
    let mut current = index;
    while let (Some(sibling), Some(parent)) = (sibling_index(current), parent_index(current)) {
        proof.push(tree[sibling]);
        current = parent;
    }
    Ok(proof)
}

/// Fold `proof` into `leaf` with [`hash_pair`], yielding the implied root.
pub fn process_proof<H: MerkleHasher>(leaf: &Hash, proof: &[Hash]) -> Hash {
    proof
        .iter()
        .fold(*leaf, |acc, sibling| hash_pair::<H>(&acc, sibling))
}

/// Check the shape of `tree` and recompute every internal node.
///
/// Returns `false` on an empty tree, on a node with a left child but no
/// right child, or on the first internal node that does not match its
/// children.
pub fn is_valid_merkle_tree<H: MerkleHasher>(tree: &[Hash]) -> bool {
    if tree.is_empty() {
        return false;
    }
    for (i, node) in tree.iter().enumerate() {
        let left = left_child_index(i);
        let right = right_child_index(i);
        if right >= tree.len() {
            if left < tree.len() {
                trace!(target: LOG_TARGET, "node {} has a single child", i);
                return false;
            }
        } else if *node != hash_pair::<H>(&tree[left], &tree[right]) {
            trace!(target: LOG_TARGET, "node {} does not match its children", i);
            return false;
        }
    }
    true
}

/// A position in a flattened tree, drawn together with its subtree.
struct NodeView<'a> {
    tree: &'a [Hash],
    index: usize,
}

impl Visualize for NodeView<'_> {
    fn visualize<W: Write>(&self, mut drawer: Drawer<W>) -> io::Result<Drawer<W>> {
        drawer.write(format!("{}) ", self.index).as_bytes())?;
        drawer = self.tree[self.index].visualize(drawer)?;

        let right = right_child_index(self.index);
        if right < self.tree.len() {
            drawer.down();
            for child in [left_child_index(self.index), right] {
                drawer.write(b"\n")?;
                drawer = NodeView {
                    tree: self.tree,
                    index: child,
                }
                .visualize(drawer)?;
            }
            drawer.up();
        }
        Ok(drawer)
    }
}

/// Indented listing of the tree, one `"<position>) <short hex>"` line per
/// node, children one level deeper than their parent.
pub fn render_merkle_tree(tree: &[Hash]) -> Result<String> {
    if tree.is_empty() {
        return Err(Error::InvalidInput(
            "expected a non-zero number of nodes".to_string(),
        ));
    }
    let mut out = Vec::new();
    visualize_to_vec(&mut out, &NodeView { tree, index: 0 })
        .map_err(|e| Error::Format(format!("render error: {}", e)))?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}
