//! I2C bus abstractions
//!
//! The display backpack shares its bus with anything else the board hangs
//! off the same pins, so every transaction is bracketed by a cooperative
//! lock. [`BusGuard`] spins until the lock is granted and releases it on
//! drop, so an early `?` return can never leave the bus held.

use core::ops::{Deref, DerefMut};

/// Chip-agnostic I2C failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// Device did not acknowledge its address or a data byte
    Nack,
    /// Another master won arbitration
    Arbitration,
    /// Buffer length or address rejected by the controller
    Invalid,
}

/// I2C bus master
pub trait I2cBus {
    /// Error type for I2C operations
    type Error;

    /// Write data to a device at the given 7-bit address
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error>;

    /// Read data from a device at the given 7-bit address
    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Write then read in a single transaction (repeated start)
    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error>;
}

/// Cooperative bus lock
///
/// `try_lock` must not block. Callers that need the bus go through
/// [`BusGuard::acquire`], which spins on it.
pub trait BusLock {
    /// Attempt to take the bus. Returns `true` when granted.
    fn try_lock(&mut self) -> bool;

    /// Release the bus
    fn unlock(&mut self);
}

/// RAII handle over a locked bus
pub struct BusGuard<'a, B: BusLock> {
    bus: &'a mut B,
}

impl<'a, B: BusLock> BusGuard<'a, B> {
    /// Spin until the bus is granted
    pub fn acquire(bus: &'a mut B) -> Self {
        while !bus.try_lock() {
            core::hint::spin_loop();
        }
        Self { bus }
    }
}

impl<B: BusLock> Deref for BusGuard<'_, B> {
    type Target = B;

    fn deref(&self) -> &B {
        self.bus
    }
}

impl<B: BusLock> DerefMut for BusGuard<'_, B> {
    fn deref_mut(&mut self) -> &mut B {
        self.bus
    }
}

impl<B: BusLock> Drop for BusGuard<'_, B> {
    fn drop(&mut self) {
        self.bus.unlock();
    }
}

/// I2C configuration
#[derive(Debug, Clone, Copy)]
pub struct I2cConfig {
    /// Clock frequency in Hz
    pub frequency: u32,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl I2cConfig {
    /// Standard mode (100 kHz)
    pub const STANDARD: Self = Self { frequency: 100_000 };
}
