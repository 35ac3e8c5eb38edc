//! Battery sensing trait

/// Errors that can occur while sampling the battery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// ADC conversion failed
    ConversionError,
    /// Channel not available
    Unavailable,
}

/// Raw battery voltage sampler
///
/// Returns the ADC count at the divider tap, `0..=adc_max` of the
/// configured [`BatteryConfig`](crate::config::BatteryConfig).
pub trait BatterySensor {
    fn read_raw(&mut self) -> Result<u16, SensorError>;
}
