use thiserror::Error;

/// Errors from Merkle tree construction, proof handling and document loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Empty or malformed construction input, or a value that does not match
    /// its leaf encoding.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A leaf index or tree position past the end, or not a leaf.
    #[error("index out of bounds: {0}")]
    IndexOutOfBounds(String),
    /// Flags, leaves and proof entries of a multiproof do not fit together.
    #[error("invalid multiproof: {0}")]
    InvalidMultiProof(String),
    /// A tree or document failed structural validation.
    #[error("corrupt tree: {0}")]
    CorruptTree(String),
    /// A value looked up by content is not in the tree.
    #[error("not found: {0}")]
    NotFound(String),
    /// Malformed hex or JSON.
    #[error("format error: {0}")]
    Format(String),
}

/// Alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

impl From<hex::FromHexError> for Error {
    fn from(e: hex::FromHexError) -> Self {
        Error::Format(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Format(e.to_string())
    }
}
