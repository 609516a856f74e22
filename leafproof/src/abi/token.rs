use primitive_types::U256;
use serde_json::Value;

use super::ParamType;
use crate::{
    Error, Result,
    bytes::{from_hex, to_hex},
};

/// A typed field value.
///
/// Signed integers are held in two's complement form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Token {
    Address([u8; 20]),
    Bool(bool),
    Uint(U256),
    Int(U256),
    FixedBytes(Vec<u8>),
    Bytes(Vec<u8>),
    String(String),
    Array(Vec<Token>),
    FixedArray(Vec<Token>),
}

impl From<u64> for Token {
    fn from(value: u64) -> Self {
        Token::Uint(U256::from(value))
    }
}

impl From<U256> for Token {
    fn from(value: U256) -> Self {
        Token::Uint(value)
    }
}

impl From<bool> for Token {
    fn from(value: bool) -> Self {
        Token::Bool(value)
    }
}

fn is_negative(value: &U256) -> bool {
    value.bit(255)
}

fn negate(value: U256) -> U256 {
    (!value).overflowing_add(U256::one()).0
}

impl Token {
    /// Two's complement token for a signed value.
    pub fn int(value: i128) -> Token {
        let magnitude = U256::from(value.unsigned_abs());
        if value < 0 {
            Token::Int(negate(magnitude))
        } else {
            Token::Int(magnitude)
        }
    }

    /// Dynamic tokens are encoded out of line, behind an offset word.
    pub fn is_dynamic(&self) -> bool {
        match self {
            Token::Bytes(_) | Token::String(_) | Token::Array(_) => true,
            Token::FixedArray(tokens) => tokens.iter().any(Token::is_dynamic),
            _ => false,
        }
    }

    /// Whether this token is a valid value of `param`.
    pub fn type_check(&self, param: &ParamType) -> bool {
        match (self, param) {
            (Token::Address(_), ParamType::Address) | (Token::Bool(_), ParamType::Bool) => true,
            (Token::Uint(value), ParamType::Uint(bits)) => value.bits() <= *bits,
            (Token::Int(value), ParamType::Int(bits)) => {
                // the magnitude must fit below the sign bit
                let magnitude = if is_negative(value) { !*value } else { *value };
                magnitude.bits() < *bits
            }
            (Token::FixedBytes(bytes), ParamType::FixedBytes(len)) => bytes.len() == *len,
            (Token::Bytes(_), ParamType::Bytes) | (Token::String(_), ParamType::String) => true,
            (Token::Array(tokens), ParamType::Array(inner)) => {
                tokens.iter().all(|token| token.type_check(inner))
            }
            (Token::FixedArray(tokens), ParamType::FixedArray(inner, len)) => {
                tokens.len() == *len && tokens.iter().all(|token| token.type_check(inner))
            }
            _ => false,
        }
    }

    /// Read a JSON value as a token of type `param`.
    ///
    /// Integers are accepted as JSON numbers, decimal strings (with a leading
    /// `-` for signed types) or `0x` hex strings. Addresses and byte strings
    /// are `0x` hex strings.
    pub fn from_json(param: &ParamType, value: &Value) -> Result<Token> {
        let token = match (param, value) {
            (ParamType::Address, Value::String(s)) => {
                let bytes = from_hex(s)?;
                let address: [u8; 20] = bytes.as_slice().try_into().map_err(|_| {
                    Error::InvalidInput(format!("address must be 20 bytes, got {:?}", s))
                })?;
                Token::Address(address)
            }
            (ParamType::Bool, Value::Bool(b)) => Token::Bool(*b),
            (ParamType::Uint(_), value) => Token::Uint(parse_unsigned(value)?),
            (ParamType::Int(bits), value) => Token::Int(parse_signed(value, *bits)?),
            (ParamType::FixedBytes(_), Value::String(s)) => Token::FixedBytes(from_hex(s)?),
            (ParamType::Bytes, Value::String(s)) => Token::Bytes(from_hex(s)?),
            (ParamType::String, Value::String(s)) => Token::String(s.clone()),
            (ParamType::Array(inner), Value::Array(items)) => Token::Array(
                items
                    .iter()
                    .map(|item| Token::from_json(inner, item))
                    .collect::<Result<_>>()?,
            ),
            (ParamType::FixedArray(inner, _), Value::Array(items)) => Token::FixedArray(
                items
                    .iter()
                    .map(|item| Token::from_json(inner, item))
                    .collect::<Result<_>>()?,
            ),
            (param, value) => {
                return Err(Error::InvalidInput(format!(
                    "cannot read {} as {}",
                    value, param
                )));
            }
        };
        if !token.type_check(param) {
            return Err(Error::InvalidInput(format!(
                "value {} is out of range for {}",
                value, param
            )));
        }
        Ok(token)
    }

    /// JSON form of the token; the inverse of [`Token::from_json`].
    ///
    /// Integers become decimal strings so 256-bit values survive JSON
    /// readers limited to doubles.
    pub fn to_json(&self) -> Value {
        match self {
            Token::Address(address) => Value::String(to_hex(address)),
            Token::Bool(b) => Value::Bool(*b),
            Token::Uint(value) => Value::String(value.to_string()),
            Token::Int(value) => {
                if is_negative(value) {
                    Value::String(format!("-{}", negate(*value)))
                } else {
                    Value::String(value.to_string())
                }
            }
            Token::FixedBytes(bytes) | Token::Bytes(bytes) => Value::String(to_hex(bytes)),
            Token::String(s) => Value::String(s.clone()),
            Token::Array(tokens) | Token::FixedArray(tokens) => {
                Value::Array(tokens.iter().map(Token::to_json).collect())
            }
        }
    }
}

fn parse_magnitude(s: &str) -> Result<U256> {
    if let Some(digits) = s.strip_prefix("0x") {
        if digits.is_empty() {
            return Err(Error::InvalidInput(format!("invalid integer {:?}", s)));
        }
        let padded = if digits.len() % 2 == 1 {
            format!("0{}", digits)
        } else {
            digits.to_string()
        };
        let bytes = hex::decode(padded)?;
        if bytes.len() > 32 {
            return Err(Error::InvalidInput(format!("integer {:?} exceeds 256 bits", s)));
        }
        return Ok(U256::from_big_endian(&bytes));
    }
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidInput(format!("invalid integer {:?}", s)));
    }
    U256::from_dec_str(s).map_err(|_| Error::InvalidInput(format!("integer {:?} exceeds 256 bits", s)))
}

fn parse_unsigned(value: &Value) -> Result<U256> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| Error::InvalidInput(format!("{} is not an unsigned integer", n))),
        Value::String(s) => parse_magnitude(s),
        other => Err(Error::InvalidInput(format!("{} is not an integer", other))),
    }
}

fn parse_signed(value: &Value, bits: usize) -> Result<U256> {
    let (negative, magnitude) = match value {
        Value::Number(n) => {
            let v = n
                .as_i64()
                .ok_or_else(|| Error::InvalidInput(format!("{} is not an integer", n)))?;
            (v < 0, U256::from(v.unsigned_abs()))
        }
        Value::String(s) => match s.strip_prefix('-') {
            Some(rest) => (true, parse_magnitude(rest)?),
            None => (false, parse_magnitude(s)?),
        },
        other => return Err(Error::InvalidInput(format!("{} is not an integer", other))),
    };
    // largest magnitude is 2^(bits-1), reachable only by negative values
    let limit = U256::one() << (bits - 1);
    if magnitude > limit || (!negative && magnitude == limit) {
        return Err(Error::InvalidInput(format!(
            "{} is out of range for int{}",
            value, bits
        )));
    }
    Ok(if negative { negate(magnitude) } else { magnitude })
}
