use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Format tag written by [`super::StandardMerkleTree::dump`].
pub const STANDARD_V1_FORMAT: &str = "standard-v1";

/// Serializable form of a [`super::StandardMerkleTree`].
///
/// Treat a document from elsewhere as untrusted; `load` re-validates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardMerkleTreeData {
    /// Always [`STANDARD_V1_FORMAT`].
    pub format: String,
    /// Hex node hashes, one per tree position.
    pub tree: Vec<String>,
    /// Records in input order.
    pub values: Vec<ValueEntry>,
    /// Field type names, e.g. `["address", "uint256"]`.
    pub leaf_encoding: Vec<String>,
}

/// A committed value and the tree position of its leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueEntry {
    /// Field values, integers as decimal strings.
    pub value: Vec<Value>,
    /// Position of the leaf in `tree`.
    pub tree_index: usize,
}
