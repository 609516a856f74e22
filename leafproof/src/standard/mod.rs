//! Merkle tree over typed application records.
//!
//! Each record is a tuple of fields described by a leaf encoding such as
//! `["address", "uint256"]`. Its leaf hash is `H(H(abi_encode(record)))`, so
//! a tree built here with [`Keccak256`] can be checked by on-chain
//! sorted-pair proof verifiers.

mod data;

use std::{collections::HashMap, marker::PhantomData};

pub use data::{STANDARD_V1_FORMAT, StandardMerkleTreeData, ValueEntry};
use log::{debug, warn};

use crate::{
    Error, Result,
    abi::{self, ParamType, Token},
    bytes::{compare_bytes, hash_from_hex, to_hex},
    hash::{Hash, Keccak256, MerkleHasher, hash_leaf},
    proof::{self, MultiProof},
    tree::{
        get_proof, is_leaf_node, is_valid_merkle_tree, make_merkle_tree, process_proof,
        render_merkle_tree,
    },
    utils::check_bounds,
    verify::{check_multi_proof_shape, replay_multi_proof},
};

const LOG_TARGET: &str = "leafproof::standard";

/// Options for [`StandardMerkleTree::of_with_options`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeOptions {
    /// Order leaves by hash before building. With sorting, the root depends
    /// only on the set of records, not on their input order.
    pub sort_leaves: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        TreeOptions { sort_leaves: true }
    }
}

/// A way to name a leaf: by position in the input list or by its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafRef<'a> {
    /// Position of the record in the list given to
    /// [`StandardMerkleTree::of`].
    Index(usize),
    /// The record itself.
    Value(&'a [Token]),
}

impl From<usize> for LeafRef<'_> {
    fn from(index: usize) -> Self {
        LeafRef::Index(index)
    }
}

impl<'a> From<&'a [Token]> for LeafRef<'a> {
    fn from(value: &'a [Token]) -> Self {
        LeafRef::Value(value)
    }
}

/// Types that can name a leaf of a [`StandardMerkleTree`].
pub trait AsLeafRef {
    /// Borrow as a [`LeafRef`].
    fn as_leaf_ref(&self) -> LeafRef<'_>;
}

impl AsLeafRef for usize {
    fn as_leaf_ref(&self) -> LeafRef<'_> {
        LeafRef::Index(*self)
    }
}

impl AsLeafRef for [Token] {
    fn as_leaf_ref(&self) -> LeafRef<'_> {
        LeafRef::Value(self)
    }
}

impl AsLeafRef for Vec<Token> {
    fn as_leaf_ref(&self) -> LeafRef<'_> {
        LeafRef::Value(self)
    }
}

impl AsLeafRef for LeafRef<'_> {
    fn as_leaf_ref(&self) -> LeafRef<'_> {
        *self
    }
}

/// Leaf hash of `value` under `leaf_encoding`.
///
/// Fails with [`Error::InvalidInput`] if `value` does not have one token of
/// the right type per field.
pub fn standard_leaf_hash<H: MerkleHasher>(
    value: &[Token],
    leaf_encoding: &[ParamType],
) -> Result<Hash> {
    if value.len() != leaf_encoding.len() {
        return Err(Error::InvalidInput(format!(
            "expected {} fields, got {}",
            leaf_encoding.len(),
            value.len()
        )));
    }
    if let Some((token, param)) = value
        .iter()
        .zip(leaf_encoding)
        .find(|(token, param)| !token.type_check(param))
    {
        return Err(Error::InvalidInput(format!(
            "{:?} is not a valid {}",
            token, param
        )));
    }
    Ok(hash_leaf::<H>(&abi::encode(value)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct IndexedValue {
    value: Vec<Token>,
    tree_index: usize,
}

/// A Merkle tree over records, with the records kept alongside so proofs
/// can be requested by record or by input position.
#[derive(Debug, Clone)]
pub struct StandardMerkleTree<H: MerkleHasher = Keccak256> {
    tree: Vec<Hash>,
    values: Vec<IndexedValue>,
    leaf_encoding: Vec<ParamType>,
    /// leaf hash -> input position
    hash_lookup: HashMap<Hash, usize>,
    _hasher: PhantomData<H>,
}

impl<H: MerkleHasher> StandardMerkleTree<H> {
    /// Build a tree over `values`, sorting leaves by hash.
    pub fn of(values: Vec<Vec<Token>>, leaf_encoding: &[ParamType]) -> Result<Self> {
        Self::of_with_options(values, leaf_encoding, TreeOptions::default())
    }

    /// Build a tree over `values`.
    ///
    /// Fails with [`Error::InvalidInput`] if `values` is empty, if a record
    /// does not fit `leaf_encoding`, or if two records hash to the same leaf.
    pub fn of_with_options(
        values: Vec<Vec<Token>>,
        leaf_encoding: &[ParamType],
        options: TreeOptions,
    ) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::InvalidInput(
                "expected a non-zero number of values".to_string(),
            ));
        }

        let leaf_hashes = values
            .iter()
            .map(|value| standard_leaf_hash::<H>(value, leaf_encoding))
            .collect::<Result<Vec<_>>>()?;

        let mut order: Vec<usize> = (0..values.len()).collect();
        if options.sort_leaves {
            order.sort_by(|&a, &b| compare_bytes(&leaf_hashes[a], &leaf_hashes[b]));
        }
        let sorted_leaves: Vec<Hash> = order.iter().map(|&i| leaf_hashes[i]).collect();
        let tree = make_merkle_tree::<H>(&sorted_leaves)?;

        let mut tree_indices = vec![0; values.len()];
        for (leaf_index, &value_index) in order.iter().enumerate() {
            tree_indices[value_index] = tree.len() - leaf_index - 1;
        }
        let values = values
            .into_iter()
            .zip(tree_indices)
            .map(|(value, tree_index)| IndexedValue { value, tree_index })
            .collect();

        let built = Self::from_parts(tree, values, leaf_encoding.to_vec(), &leaf_hashes)?;
        debug!(
            target: LOG_TARGET,
            "built tree over {} values, root {}",
            built.len(),
            built.root()
        );
        Ok(built)
    }

    fn from_parts(
        tree: Vec<Hash>,
        values: Vec<IndexedValue>,
        leaf_encoding: Vec<ParamType>,
        leaf_hashes: &[Hash],
    ) -> Result<Self> {
        let mut hash_lookup = HashMap::with_capacity(leaf_hashes.len());
        for (value_index, hash) in leaf_hashes.iter().enumerate() {
            if let Some(previous) = hash_lookup.insert(*hash, value_index) {
                return Err(Error::InvalidInput(format!(
                    "values {} and {} have the same leaf hash",
                    previous, value_index
                )));
            }
        }
        Ok(StandardMerkleTree {
            tree,
            values,
            leaf_encoding,
            hash_lookup,
            _hasher: PhantomData,
        })
    }

    /// Rebuild a tree from a document produced by [`Self::dump`].
    ///
    /// The document is untrusted: every node and every record is checked,
    /// and any inconsistency is reported as [`Error::CorruptTree`].
    pub fn load(data: &StandardMerkleTreeData) -> Result<Self> {
        Self::load_unchecked(data)
            .and_then(|tree| {
                tree.validate()?;
                Ok(tree)
            })
            .map_err(|e| {
                warn!(target: LOG_TARGET, "rejecting tree document: {}", e);
                match e {
                    Error::CorruptTree(_) => e,
                    other => Error::CorruptTree(other.to_string()),
                }
            })
    }

    fn load_unchecked(data: &StandardMerkleTreeData) -> Result<Self> {
        if data.format != STANDARD_V1_FORMAT {
            return Err(Error::CorruptTree(format!(
                "unknown format {:?}",
                data.format
            )));
        }
        let leaf_encoding = abi::parse_types(&data.leaf_encoding)?;
        let tree = data
            .tree
            .iter()
            .map(|node| hash_from_hex(node))
            .collect::<Result<Vec<_>>>()?;
        let values = data
            .values
            .iter()
            .map(|entry| {
                Ok(IndexedValue {
                    value: abi::tokenize(&leaf_encoding, &entry.value)?,
                    tree_index: entry.tree_index,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let leaf_hashes = values
            .iter()
            .map(|entry| standard_leaf_hash::<H>(&entry.value, &leaf_encoding))
            .collect::<Result<Vec<_>>>()?;
        Self::from_parts(tree, values, leaf_encoding, &leaf_hashes)
    }

    /// Parse and [`Self::load`] a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let data: StandardMerkleTreeData = serde_json::from_str(json)?;
        Self::load(&data)
    }

    /// Serializable form of the tree. Loading it yields an equal tree.
    pub fn dump(&self) -> StandardMerkleTreeData {
        StandardMerkleTreeData {
            format: STANDARD_V1_FORMAT.to_string(),
            tree: self.tree.iter().map(|node| to_hex(node)).collect(),
            values: self
                .values
                .iter()
                .map(|entry| ValueEntry {
                    value: entry.value.iter().map(Token::to_json).collect(),
                    tree_index: entry.tree_index,
                })
                .collect(),
            leaf_encoding: self
                .leaf_encoding
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }

    /// [`Self::dump`] as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.dump())?)
    }

    /// Root hash as `0x` hex.
    pub fn root(&self) -> String {
        to_hex(&self.root_hash())
    }

    /// Root hash.
    pub fn root_hash(&self) -> Hash {
        // a built or loaded tree always has at least one node
        self.tree[0]
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always `false` for a built or loaded tree.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Field types of every record.
    pub fn leaf_encoding(&self) -> &[ParamType] {
        &self.leaf_encoding
    }

    /// Records with their input positions, in input order.
    pub fn entries(&self) -> impl Iterator<Item = (usize, &[Token])> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(index, entry)| (index, entry.value.as_slice()))
    }

    /// Tree position of the leaf for the record at input position `index`.
    pub fn tree_index(&self, index: usize) -> Result<usize> {
        check_bounds(self.values.len(), index)?;
        Ok(self.values[index].tree_index)
    }

    /// Check the whole tree and every record against its leaf.
    pub fn validate(&self) -> Result<()> {
        let leaf_count = self.tree.len().div_ceil(2);
        if self.values.len() != leaf_count {
            return Err(Error::CorruptTree(format!(
                "{} values for {} leaves",
                self.values.len(),
                leaf_count
            )));
        }
        for index in 0..self.values.len() {
            self.validate_value(index)?;
        }
        if !is_valid_merkle_tree::<H>(&self.tree) {
            return Err(Error::CorruptTree(
                "merkle tree is invalid".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_value(&self, index: usize) -> Result<Hash> {
        check_bounds(self.values.len(), index)?;
        let IndexedValue { value, tree_index } = &self.values[index];
        if !is_leaf_node(self.tree.len(), *tree_index) {
            return Err(Error::CorruptTree(format!(
                "value {} points at position {}, which is not a leaf",
                index, tree_index
            )));
        }
        let leaf = standard_leaf_hash::<H>(value, &self.leaf_encoding)?;
        if leaf != self.tree[*tree_index] {
            return Err(Error::CorruptTree(format!(
                "stored hash at position {} does not match value {}",
                tree_index, index
            )));
        }
        Ok(leaf)
    }

    /// Leaf hash of a record, whether or not it is in the tree.
    pub fn leaf_hash(&self, value: &[Token]) -> Result<Hash> {
        standard_leaf_hash::<H>(value, &self.leaf_encoding)
    }

    /// Input position of `value`.
    ///
    /// Fails with [`Error::NotFound`] when the record is not in the tree.
    pub fn leaf_lookup(&self, value: &[Token]) -> Result<usize> {
        let hash = self.leaf_hash(value)?;
        self.hash_lookup
            .get(&hash)
            .copied()
            .ok_or_else(|| Error::NotFound(format!("leaf is not in tree: {:?}", value)))
    }

    fn resolve_index(&self, leaf: LeafRef<'_>) -> Result<usize> {
        match leaf {
            LeafRef::Index(index) => Ok(index),
            LeafRef::Value(value) => self.leaf_lookup(value),
        }
    }

    /// Hash of the named leaf. A record is hashed even if it is absent, so
    /// verification of a foreign record fails instead of erroring.
    fn resolve_hash(&self, leaf: LeafRef<'_>) -> Result<Hash> {
        match leaf {
            LeafRef::Index(index) => self.validate_value(index),
            LeafRef::Value(value) => self.leaf_hash(value),
        }
    }

    /// Inclusion proof for one leaf, as `0x` hex sibling hashes from the leaf
    /// level up.
    pub fn get_proof<L: AsLeafRef + ?Sized>(&self, leaf: &L) -> Result<Vec<String>> {
        let index = self.resolve_index(leaf.as_leaf_ref())?;
        let leaf_hash = self.validate_value(index)?;
        let tree_index = self.values[index].tree_index;

        let proof = get_proof(&self.tree, tree_index)?;
        if process_proof::<H>(&leaf_hash, &proof) != self.root_hash() {
            return Err(Error::CorruptTree(format!(
                "unable to prove value {}",
                index
            )));
        }
        Ok(proof.iter().map(|hash| to_hex(hash)).collect())
    }

    /// Inclusion proof for several leaves at once.
    ///
    /// The returned leaves are records, ordered by descending tree position.
    pub fn get_multi_proof<L: AsLeafRef>(
        &self,
        leaves: &[L],
    ) -> Result<MultiProof<String, Vec<Token>>> {
        let mut tree_indices = Vec::with_capacity(leaves.len());
        for leaf in leaves {
            let index = self.resolve_index(leaf.as_leaf_ref())?;
            self.validate_value(index)?;
            tree_indices.push(self.values[index].tree_index);
        }

        let multiproof = proof::get_multi_proof(&self.tree, &tree_indices)?;
        if replay_multi_proof::<H>(&multiproof) != Ok(self.root_hash()) {
            return Err(Error::CorruptTree(
                "unable to prove values".to_string(),
            ));
        }

        let leaves = multiproof
            .leaves
            .iter()
            .map(|hash| {
                let index = self.hash_lookup.get(hash).copied().ok_or_else(|| {
                    Error::CorruptTree(format!("no value for leaf {}", to_hex(hash)))
                })?;
                Ok(self.values[index].value.clone())
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(MultiProof {
            leaves,
            proof: multiproof.proof.iter().map(|hash| to_hex(hash)).collect(),
            proof_flags: multiproof.proof_flags,
        })
    }

    /// Whether `proof` proves `leaf` against this tree's root.
    ///
    /// A well-formed proof that does not match gives `Ok(false)`. Errors are
    /// reserved for malformed input: bad hex, a record of the wrong shape or
    /// an out-of-range index.
    pub fn verify<L: AsLeafRef + ?Sized, S: AsRef<str>>(
        &self,
        leaf: &L,
        proof: &[S],
    ) -> Result<bool> {
        let leaf_hash = self.resolve_hash(leaf.as_leaf_ref())?;
        let proof = decode_hashes(proof)?;
        Ok(process_proof::<H>(&leaf_hash, &proof) == self.root_hash())
    }

    /// Whether `multiproof` proves its leaves against this tree's root.
    ///
    /// Fails with [`Error::InvalidMultiProof`] when the flags do not fit the
    /// leaf and proof counts. A replay that runs dry gives `Ok(false)`.
    pub fn verify_multi_proof<S: AsRef<str>, L: AsLeafRef>(
        &self,
        multiproof: &MultiProof<S, L>,
    ) -> Result<bool> {
        check_multi_proof_shape(multiproof)?;
        let hashes = MultiProof {
            leaves: multiproof
                .leaves
                .iter()
                .map(|leaf| self.resolve_hash(leaf.as_leaf_ref()))
                .collect::<Result<Vec<_>>>()?,
            proof: decode_hashes(&multiproof.proof)?,
            proof_flags: multiproof.proof_flags.clone(),
        };
        Ok(replay_multi_proof::<H>(&hashes) == Ok(self.root_hash()))
    }

    /// Indented drawing of the tree, see
    /// [`crate::tree::render_merkle_tree`].
    pub fn render(&self) -> Result<String> {
        render_merkle_tree(&self.tree)
    }
}

fn decode_hashes<S: AsRef<str>>(hashes: &[S]) -> Result<Vec<Hash>> {
    hashes
        .iter()
        .map(|hash| hash_from_hex(hash.as_ref()))
        .collect()
}
