//! Blocking I2C with a cooperative bus lock
//!
//! The lock flag is a plain bool behind a critical-section mutex, so it is
//! safe to share between both cores.

use core::cell::Cell;

use embassy_rp::i2c::{self, AbortReason, Blocking, I2c, Instance};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use tapface_hal::{BusError, BusLock, I2cBus, I2cConfig};

/// Ownership flag for one physical bus
pub struct BusFlag {
    held: Mutex<CriticalSectionRawMutex, Cell<bool>>,
}

impl BusFlag {
    pub const fn new() -> Self {
        Self {
            held: Mutex::new(Cell::new(false)),
        }
    }

    fn try_take(&self) -> bool {
        self.held.lock(|held| !held.replace(true))
    }

    fn give(&self) {
        self.held.lock(|held| held.set(false));
    }
}

impl Default for BusFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// embassy-rp controller settings for a tapface bus config
pub fn controller_config(config: &I2cConfig) -> i2c::Config {
    let mut out = i2c::Config::default();
    out.frequency = config.frequency;
    out
}

fn bus_error(e: i2c::Error) -> BusError {
    match e {
        i2c::Error::Abort(AbortReason::NoAcknowledge) => BusError::Nack,
        i2c::Error::Abort(AbortReason::ArbitrationLoss) => BusError::Arbitration,
        _ => BusError::Invalid,
    }
}

/// Blocking I2C controller guarded by a [`BusFlag`]
pub struct RpI2cBus<'d, T: Instance> {
    i2c: I2c<'d, T, Blocking>,
    flag: &'static BusFlag,
}

impl<'d, T: Instance> RpI2cBus<'d, T> {
    pub fn new(i2c: I2c<'d, T, Blocking>, flag: &'static BusFlag) -> Self {
        Self { i2c, flag }
    }
}

impl<T: Instance> I2cBus for RpI2cBus<'_, T> {
    type Error = BusError;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), BusError> {
        self.i2c.blocking_write(address, data).map_err(bus_error)
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), BusError> {
        self.i2c.blocking_read(address, buf).map_err(bus_error)
    }

    fn write_read(&mut self, address: u8, write_data: &[u8], read_buf: &mut [u8]) -> Result<(), BusError> {
        self.i2c
            .blocking_write_read(address, write_data, read_buf)
            .map_err(bus_error)
    }
}

impl<T: Instance> BusLock for RpI2cBus<'_, T> {
    fn try_lock(&mut self) -> bool {
        self.flag.try_take()
    }

    fn unlock(&mut self) {
        self.flag.give();
    }
}
