//! Non-volatile counter storage

/// Errors from the non-volatile region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Nothing has been written yet
    Empty,
    /// Underlying flash failed
    Io,
}

/// Fixed four-byte region holding the interaction count (little endian)
pub trait NvRegion {
    /// Read the region
    fn read(&mut self) -> Result<[u8; 4], StoreError>;

    /// Overwrite the region
    fn write(&mut self, bytes: [u8; 4]) -> Result<(), StoreError>;
}
