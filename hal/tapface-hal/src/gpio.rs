//! GPIO pin abstractions
//!
//! Digital pins are described at the electrical level (high/low). The
//! logical meaning (pressed, enabled) is layered on with [`Polarity`], so
//! an active-low button and an active-high touch pad share one code path.

/// Which electrical level means "asserted"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// Asserted when the pin reads high
    #[default]
    ActiveHigh,
    /// Asserted when the pin reads low (pull-up + switch to ground)
    ActiveLow,
}

impl Polarity {
    /// Translate an electrical level into a logical assertion
    pub fn is_asserted(self, high: bool) -> bool {
        match self {
            Polarity::ActiveHigh => high,
            Polarity::ActiveLow => !high,
        }
    }

    /// Electrical level that produces the given logical state
    pub fn level_for(self, asserted: bool) -> bool {
        self.is_asserted(asserted)
    }
}

/// Digital output pin
pub trait OutputPin {
    /// Set the pin high (logic 1)
    fn set_high(&mut self);

    /// Set the pin low (logic 0)
    fn set_low(&mut self);

    /// Check if the pin is currently set high
    fn is_set_high(&self) -> bool;

    /// Drive the pin to a specific level
    fn set_level(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// Drive the pin so that it reads as `asserted` under `polarity`
    fn set_asserted(&mut self, polarity: Polarity, asserted: bool) {
        self.set_level(polarity.level_for(asserted));
    }
}

/// Digital input pin
///
/// Takes `&mut self` so implementations backed by shared peripherals
/// (port expanders, multiplexed lines) can do bus traffic on read.
pub trait InputPin {
    /// Check if the pin reads high (logic 1)
    fn is_high(&mut self) -> bool;

    /// Check if the pin reads low (logic 0)
    fn is_low(&mut self) -> bool {
        !self.is_high()
    }

    /// Check whether the pin is asserted under `polarity`
    fn is_asserted(&mut self, polarity: Polarity) -> bool {
        let high = self.is_high();
        polarity.is_asserted(high)
    }
}
