//! tapface Hardware Abstraction Layer
//!
//! Chip-agnostic traits for the handful of peripherals the appliance uses.
//! Drivers in `tapface-drivers` are written against these traits, and
//! `tapface-hal-rp2040` implements them on top of embassy-rp.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  tapface-firmware / tapface-drivers     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  tapface-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │ tapface-hal-  │
//!             │    rp2040     │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`] - Digital I/O with polarity helpers
//! - [`i2c::I2cBus`], [`i2c::BusLock`] - Shared I2C bus with cooperative locking
//! - [`adc::AdcReader`] - Single-channel analog sampling
//! - [`flash::FlashStorage`] - Persistent key-value storage

#![no_std]
#![deny(unsafe_code)]

pub mod adc;
pub mod flash;
pub mod gpio;
pub mod i2c;

// Re-export key traits at crate root for convenience
pub use adc::{AdcError, AdcReader};
pub use flash::{FlashError, FlashStorage, StorageKey};
pub use gpio::{InputPin, OutputPin, Polarity};
pub use i2c::{BusError, BusGuard, BusLock, I2cBus, I2cConfig};
