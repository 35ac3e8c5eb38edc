//! Peripheral drivers for tapface
//!
//! Board-independent drivers written against the `tapface-hal` traits,
//! each adapting a peripheral to the trait the control loop expects:
//!
//! - [`lcd`] - HD44780 character LCD behind a PCF8574 I2C backpack
//! - [`battery`] - ADC channel behind a resistor divider
//! - [`amp`] - Amplifier shutdown pin
//! - [`inputs`] - Touch pad lines and the I/O button
//! - [`storage`] - Interaction counter on wear-leveled flash
//! - [`wav`] - RIFF/WAVE header parsing and I2S frame packing

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod amp;
pub mod battery;
pub mod inputs;
pub mod lcd;
pub mod storage;
pub mod wav;

pub use amp::GpioAmp;
pub use battery::AdcBattery;
pub use inputs::GpioInputs;
pub use lcd::Hd44780;
pub use storage::FlashCounterRegion;
