//! ADC channels
//!
//! RP2040 has a single ADC with 5 channels:
//! - ADC0..ADC3: GPIO26..GPIO29 (ADC3 is VSYS/3 on the Pico)
//! - ADC4: Internal temperature sensor

use embassy_rp::adc::{Adc, Blocking, Channel};
use tapface_hal::{AdcError, AdcReader};

/// One converter plus the channel it samples
pub struct RpAdc<'d> {
    adc: Adc<'d, Blocking>,
    channel: Channel<'d>,
}

impl<'d> RpAdc<'d> {
    pub fn new(adc: Adc<'d, Blocking>, channel: Channel<'d>) -> Self {
        Self { adc, channel }
    }

    /// Gather a seed from the low bit of repeated reads of `noisy`
    ///
    /// The temperature sensor's LSB wanders enough to make message choice
    /// differ between boots.
    pub fn noise_seed(&mut self, noisy: &mut Channel<'d>) -> u32 {
        let mut seed = 0u32;
        for _ in 0..32 {
            let bit = self.adc.blocking_read(noisy).map_or(0, |v| u32::from(v & 1));
            seed = (seed << 1) | bit;
        }
        seed
    }
}

impl AdcReader for RpAdc<'_> {
    fn read(&mut self) -> Result<u16, AdcError> {
        self.adc
            .blocking_read(&mut self.channel)
            .map_err(|_| AdcError::Conversion)
    }
}
