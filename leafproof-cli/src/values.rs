//! Reading records from a values file and from command line fields.

use std::{fs, path::Path};

use leafproof::abi::{ParamType, Token, U256, tokenize};
use serde_json::Value;

use crate::error::CliError;

/// Decimal places of an 18-decimal token amount.
pub const ETHER_DECIMALS: usize = 18;

pub fn read_file(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Convert a decimal amount such as `"1.5"` to base units with `decimals`
/// fractional digits.
pub fn parse_units(amount: &str, decimals: usize) -> Result<U256, CliError> {
    let (whole, fraction) = amount.split_once('.').unwrap_or((amount, ""));
    let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction) {
        return Err(CliError::Units(format!("{:?} is not a decimal amount", amount)));
    }
    if fraction.len() > decimals {
        return Err(CliError::Units(format!(
            "{:?} has more than {} decimal places",
            amount, decimals
        )));
    }
    let digits = format!("{}{:0<width$}", whole, fraction, width = decimals);
    U256::from_dec_str(&digits)
        .map_err(|_| CliError::Units(format!("{:?} exceeds 256 bits", amount)))
}

fn amount_text(cell: &Value) -> Result<String, CliError> {
    match cell {
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(s.clone()),
        other => Err(CliError::Units(format!("{} is not an amount", other))),
    }
}

/// Parse a JSON array of records. With `units`, that column holds decimal
/// amounts and is converted to 18-decimal base units first.
pub fn parse_rows(
    text: &str,
    encoding: &[ParamType],
    units: Option<usize>,
) -> Result<Vec<Vec<Token>>, CliError> {
    let rows: Vec<Vec<Value>> = serde_json::from_str(text)?;
    rows.into_iter()
        .enumerate()
        .map(|(index, mut row)| {
            if let Some(column) = units {
                let cell = row.get_mut(column).ok_or_else(|| {
                    CliError::Units(format!("record {} has no column {}", index, column))
                })?;
                let wei = parse_units(&amount_text(cell)?, ETHER_DECIMALS)?;
                *cell = Value::String(wei.to_string());
            }
            Ok(tokenize(encoding, &row)?)
        })
        .collect()
}

/// Read a record given as one command line argument per field.
///
/// Booleans and arrays are written as JSON (`true`, `[1,2]`); every other
/// type is taken as the literal string.
pub fn parse_fields(encoding: &[ParamType], fields: &[String]) -> Result<Vec<Token>, CliError> {
    if encoding.len() != fields.len() {
        return Err(leafproof::Error::InvalidInput(format!(
            "expected {} fields, got {}",
            encoding.len(),
            fields.len()
        ))
        .into());
    }
    let values = encoding
        .iter()
        .zip(fields)
        .map(|(param, field)| match param {
            ParamType::Bool | ParamType::Array(_) | ParamType::FixedArray(..) => {
                serde_json::from_str(field).map_err(CliError::from)
            }
            _ => Ok(Value::String(field.clone())),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tokenize(encoding, &values)?)
}
