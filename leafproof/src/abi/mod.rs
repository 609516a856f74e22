//! Leaf encoding: field types, typed values and their canonical bytes.

mod encode;
mod param_type;
mod token;

pub use encode::{encode, encode_bytes32_array};
pub use param_type::{ParamType, parse_types};
pub use primitive_types::U256;
use serde_json::Value;
pub use token::Token;

use crate::{Error, Result};

/// Read a JSON tuple as tokens, one per entry of `types`.
pub fn tokenize(types: &[ParamType], values: &[Value]) -> Result<Vec<Token>> {
    if types.len() != values.len() {
        return Err(Error::InvalidInput(format!(
            "expected {} fields, got {}",
            types.len(),
            values.len()
        )));
    }
    types
        .iter()
        .zip(values)
        .map(|(param, value)| Token::from_json(param, value))
        .collect()
}
