//! Board-agnostic control loop for the touch-pad sound box
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (audio, inputs, battery, storage, power)
//! - Device configuration types and the embedded TOML parser
//! - Pad debouncing
//! - Battery monitoring, the interaction counter and its milestones
//! - Idle chatter and the easter egg detector
//! - Playback coordination
//! - The device state machine and its cooperative tick loop

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod battery;
pub mod chatter;
pub mod config;
pub mod counter;
pub mod debounce;
pub mod device;
pub mod egg;
pub mod playback;
pub mod state;
pub mod traits;

#[cfg(test)]
pub(crate) mod mock;

pub use device::{Board, Device, Fault, Peripherals};
pub use state::{DeviceState, Event};
