//! Battery voltage sensor
//!
//! The cell is measured through a resistor divider on an ADC pin. This
//! driver only hands back raw counts; scaling and averaging happen in
//! `tapface_core::battery`.

use tapface_core::traits::{BatterySensor, SensorError};
use tapface_hal::{AdcError, AdcReader};

/// ADC channel wired to the divider tap
pub struct AdcBattery<A> {
    adc: A,
}

impl<A: AdcReader> AdcBattery<A> {
    pub fn new(adc: A) -> Self {
        Self { adc }
    }

    /// Full-scale count of the underlying converter
    pub fn max_value(&self) -> u16 {
        A::MAX_VALUE
    }
}

fn sensor_error(e: AdcError) -> SensorError {
    match e {
        AdcError::Conversion => SensorError::ConversionError,
        AdcError::NoChannel => SensorError::Unavailable,
    }
}

impl<A: AdcReader> BatterySensor for AdcBattery<A> {
    fn read_raw(&mut self) -> Result<u16, SensorError> {
        let raw = self.adc.read().map_err(sensor_error)?;
        // Noise can push a 12-bit result past full scale on some parts
        Ok(raw.min(A::MAX_VALUE))
    }
}
