use std::{fmt, str::FromStr};

use crate::{Error, Result};

/// A field type in a leaf encoding, named with Solidity ABI type names
/// (`uint256`, `address`, `bytes32`, `string`, `uint256[]`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamType {
    /// 20-byte account address.
    Address,
    /// `true` or `false`.
    Bool,
    /// Unsigned integer of the given bit width (8..=256, multiple of 8).
    Uint(usize),
    /// Two's complement signed integer of the given bit width.
    Int(usize),
    /// `bytes1` .. `bytes32`.
    FixedBytes(usize),
    /// Variable-length byte string.
    Bytes,
    /// UTF-8 string.
    String,
    /// `T[]`
    Array(Box<ParamType>),
    /// `T[k]`
    FixedArray(Box<ParamType>, usize),
}

impl ParamType {
    /// Dynamic types are encoded out of line, behind an offset word.
    pub fn is_dynamic(&self) -> bool {
        match self {
            ParamType::Bytes | ParamType::String | ParamType::Array(_) => true,
            ParamType::FixedArray(inner, _) => inner.is_dynamic(),
            _ => false,
        }
    }
}

fn parse_bits(name: &str, digits: &str) -> Result<usize> {
    if digits.is_empty() {
        return Ok(256);
    }
    let bits: usize = digits
        .parse()
        .map_err(|_| Error::InvalidInput(format!("unknown type {:?}", name)))?;
    if bits == 0 || bits > 256 || bits % 8 != 0 {
        return Err(Error::InvalidInput(format!(
            "invalid integer width in {:?}",
            name
        )));
    }
    Ok(bits)
}

/// Deepest array nesting accepted in a type name.
const MAX_ARRAY_DEPTH: usize = 32;

/// Longest fixed-size array accepted in a type name.
const MAX_FIXED_ARRAY_LEN: usize = 1 << 16;

fn parse_elementary(s: &str) -> Result<ParamType> {
    match s {
        "address" => Ok(ParamType::Address),
        "bool" => Ok(ParamType::Bool),
        "bytes" => Ok(ParamType::Bytes),
        "string" => Ok(ParamType::String),
        _ => {
            if let Some(digits) = s.strip_prefix("uint") {
                Ok(ParamType::Uint(parse_bits(s, digits)?))
            } else if let Some(digits) = s.strip_prefix("int") {
                Ok(ParamType::Int(parse_bits(s, digits)?))
            } else if let Some(digits) = s.strip_prefix("bytes") {
                match digits.parse::<usize>() {
                    Ok(len) if (1..=32).contains(&len) => Ok(ParamType::FixedBytes(len)),
                    _ => Err(Error::InvalidInput(format!("unknown type {:?}", s))),
                }
            } else {
                Err(Error::InvalidInput(format!("unknown type {:?}", s)))
            }
        }
    }
}

impl FromStr for ParamType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();

        // array suffixes, outermost first
        let mut base = s;
        let mut dimensions: Vec<Option<usize>> = Vec::new();
        while let Some(rest) = base.strip_suffix(']') {
            let Some(open) = rest.rfind('[') else {
                break;
            };
            if dimensions.len() == MAX_ARRAY_DEPTH {
                return Err(Error::InvalidInput(format!(
                    "arrays nested deeper than {}",
                    MAX_ARRAY_DEPTH
                )));
            }
            let dimension = &rest[open + 1..];
            if dimension.is_empty() {
                dimensions.push(None);
            } else {
                let len = dimension
                    .parse::<usize>()
                    .ok()
                    .filter(|len| (1..=MAX_FIXED_ARRAY_LEN).contains(len))
                    .ok_or_else(|| {
                        Error::InvalidInput(format!("invalid array length {:?}", dimension))
                    })?;
                dimensions.push(Some(len));
            }
            base = &rest[..open];
        }

        let elementary = parse_elementary(base)?;
        Ok(dimensions
            .into_iter()
            .rev()
            .fold(elementary, |inner, dimension| match dimension {
                None => ParamType::Array(Box::new(inner)),
                Some(len) => ParamType::FixedArray(Box::new(inner), len),
            }))
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Address => write!(f, "address"),
            ParamType::Bool => write!(f, "bool"),
            ParamType::Uint(bits) => write!(f, "uint{}", bits),
            ParamType::Int(bits) => write!(f, "int{}", bits),
            ParamType::FixedBytes(len) => write!(f, "bytes{}", len),
            ParamType::Bytes => write!(f, "bytes"),
            ParamType::String => write!(f, "string"),
            ParamType::Array(inner) => write!(f, "{}[]", inner),
            ParamType::FixedArray(inner, len) => write!(f, "{}[{}]", inner, len),
        }
    }
}

/// Parse a list of type names.
pub fn parse_types<S: AsRef<str>>(names: &[S]) -> Result<Vec<ParamType>> {
    names.iter().map(|name| name.as_ref().parse()).collect()
}
