//! Amplifier power gate
//!
//! The class-D amplifier has a shutdown/enable pin, driven directly from a
//! GPIO. Breakout boards disagree on its sense, so polarity is configurable.

use tapface_core::traits::OutputEnable;
use tapface_hal::{OutputPin, Polarity};

/// Amplifier enable line on a GPIO
pub struct GpioAmp<P> {
    pin: P,
    polarity: Polarity,
    /// Logical state (true = amplifier powered)
    enabled: bool,
}

impl<P: OutputPin> GpioAmp<P> {
    /// Wrap `pin`; the amplifier starts powered down
    pub fn new(pin: P, polarity: Polarity) -> Self {
        let mut amp = Self {
            pin,
            polarity,
            enabled: false,
        };
        amp.set_enabled(false);
        amp
    }

    /// Enable line driven high to power up
    pub fn new_active_high(pin: P) -> Self {
        Self::new(pin, Polarity::ActiveHigh)
    }

    /// Shutdown line pulled low to power up
    pub fn new_active_low(pin: P) -> Self {
        Self::new(pin, Polarity::ActiveLow)
    }

    /// Give the pin back, leaving it at its current level
    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: OutputPin> OutputEnable for GpioAmp<P> {
    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.pin.set_asserted(self.polarity, enabled);
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockPin {
        high: bool,
        writes: usize,
    }

    impl MockPin {
        fn new(high: bool) -> Self {
            Self { high, writes: 0 }
        }
    }

    impl OutputPin for MockPin {
        fn set_high(&mut self) {
            self.high = true;
            self.writes += 1;
        }

        fn set_low(&mut self) {
            self.high = false;
            self.writes += 1;
        }

        fn is_set_high(&self) -> bool {
            self.high
        }
    }

    #[test]
    fn test_active_high_amp() {
        let mut amp = GpioAmp::new_active_high(MockPin::new(true));

        // Forced off at construction
        assert!(!amp.is_enabled());
        assert!(!amp.pin.is_set_high());

        amp.set_enabled(true);
        assert!(amp.is_enabled());
        assert!(amp.pin.is_set_high());

        amp.set_enabled(false);
        assert!(!amp.pin.is_set_high());
    }

    #[test]
    fn test_active_low_amp() {
        let mut amp = GpioAmp::new_active_low(MockPin::new(false));

        assert!(!amp.is_enabled());
        assert!(amp.pin.is_set_high());

        amp.set_enabled(true);
        assert!(!amp.pin.is_set_high());

        let pin = amp.release();
        assert!(!pin.is_set_high());
        assert_eq!(pin.writes, 2);
    }

    #[test]
    fn test_through_trait() {
        fn cycle<O: OutputEnable>(out: &mut O) {
            out.set_enabled(true);
            assert!(out.is_enabled());
            out.set_enabled(false);
        }

        let mut amp = GpioAmp::new_active_high(MockPin::new(false));
        cycle(&mut amp);
        assert!(!amp.is_enabled());
    }
}
