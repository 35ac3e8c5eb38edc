//! RP2040-specific HAL for the touch-pad sound box
//!
//! Implements the shared `tapface-hal` traits on top of embassy-rp:
//!
//! - GPIO wrappers for the pads, button and amplifier enable
//! - Blocking I2C with a cross-core bus lock for the LCD backpack
//! - ADC channel reads and a noise-derived random seed
//! - Flash storage driver (implements `tapface_hal::FlashStorage`)
//! - Park-until-button power off

#![no_std]

pub mod adc;
pub mod flash;
pub mod gpio;
pub mod i2c;
pub mod power;

// Re-export shared traits from tapface-hal for convenience
pub use tapface_hal::{FlashStorage as FlashStorageTrait, StorageKey};
