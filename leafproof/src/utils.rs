//! Bounds checks shared by the tree and the typed facade.

use crate::{Error, Result};

/// Fail with [`Error::IndexOutOfBounds`] unless `index < len`.
pub fn check_bounds(len: usize, index: usize) -> Result<()> {
    if index >= len {
        return Err(Error::IndexOutOfBounds(format!(
            "index {} is out of range (length {})",
            index, len
        )));
    }
    Ok(())
}
