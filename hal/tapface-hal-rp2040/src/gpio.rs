//! GPIO wrappers
//!
//! Thin newtypes putting embassy-rp pins behind the `tapface-hal` pin
//! traits.

use embassy_rp::gpio::{AnyPin, Input, Level, Output, Pull};
use embassy_rp::Peri;

/// Push-pull output
pub struct RpOutput<'d>(Output<'d>);

impl<'d> RpOutput<'d> {
    pub fn new(pin: Peri<'d, AnyPin>, initial_high: bool) -> Self {
        let level = if initial_high { Level::High } else { Level::Low };
        Self(Output::new(pin, level))
    }
}

impl tapface_hal::OutputPin for RpOutput<'_> {
    fn set_high(&mut self) {
        self.0.set_high();
    }

    fn set_low(&mut self) {
        self.0.set_low();
    }

    fn is_set_high(&self) -> bool {
        self.0.is_set_high()
    }
}

/// Digital input
pub struct RpInput<'d>(Input<'d>);

impl<'d> RpInput<'d> {
    /// Input with the pad pulled down (touch modules drive high)
    pub fn pull_down(pin: Peri<'d, AnyPin>) -> Self {
        Self(Input::new(pin, Pull::Down))
    }

    /// Input with the pad pulled up (switch to ground)
    pub fn pull_up(pin: Peri<'d, AnyPin>) -> Self {
        Self(Input::new(pin, Pull::Up))
    }
}

impl tapface_hal::InputPin for RpInput<'_> {
    fn is_high(&mut self) -> bool {
        self.0.is_high()
    }
}

/// Input read through a shared reference
///
/// The I/O button has two readers (the control loop and the power-off
/// park loop); both hold a copy of this handle.
#[derive(Clone, Copy)]
pub struct SharedInput(&'static Input<'static>);

impl SharedInput {
    pub fn new(input: &'static Input<'static>) -> Self {
        Self(input)
    }
}

impl tapface_hal::InputPin for SharedInput {
    fn is_high(&mut self) -> bool {
        self.0.is_high()
    }
}
