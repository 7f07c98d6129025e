//! Persistent byte-addressed memory.

pub mod record;

use crate::error::ReflowError;
use crate::helpers::range_span;

/// A byte-addressable persistent memory of known length. This is the raw
/// substrate the catalog (`crate::catalog`) builds record layout and
/// signature validation on top of — the actual flash/EEPROM driver lives
/// outside this crate; this trait is its required contract.
pub trait Store {
    fn len(&self) -> usize;
    fn read(&self, offset: usize, out: &mut [u8]) -> Result<(), ReflowError>;
    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), ReflowError>;
}

/// A `Store` backed by a fixed-size in-memory byte array: const-generic,
/// bounds-checked, zero-alloc. Used for host-side simulation and tests.
pub struct MemoryStore<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> MemoryStore<N> {
    pub const fn new() -> Self {
        Self { bytes: [0; N] }
    }
}

impl<const N: usize> Default for MemoryStore<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Store for MemoryStore<N> {
    fn len(&self) -> usize {
        N
    }

    fn read(&self, offset: usize, out: &mut [u8]) -> Result<(), ReflowError> {
        let (start, end) = range_span(N, offset, out.len())?;
        out.copy_from_slice(&self.bytes[start..end]);
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), ReflowError> {
        let (start, end) = range_span(N, offset, data.len())?;
        self.bytes[start..end].copy_from_slice(data);
        Ok(())
    }
}
