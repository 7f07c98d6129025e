//! Byte-range bounds checking shared by the store and catalog layers. The
//! store's length is only known at runtime (`Store::len()`), so the bound
//! is a parameter rather than a const generic.

use crate::error::ReflowError;

/// Validate that `[offset, offset + len)` fits inside a store of `total_len`
/// bytes. Returns the inclusive `(start, end)` byte range on success.
pub fn range_span(total_len: usize, offset: usize, len: usize) -> Result<(usize, usize), ReflowError> {
    if len == 0 {
        return Err(ReflowError::NoMemory);
    }

    let end = offset.checked_add(len).ok_or(ReflowError::NoMemory)?;

    if end > total_len {
        return Err(ReflowError::NoMemory);
    }

    Ok((offset, end))
}
