//! Analog input abstraction

/// ADC conversion errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcError {
    /// Conversion did not complete or returned an error flag
    Conversion,
    /// Channel is not configured
    NoChannel,
}

/// Single-channel ADC reader
pub trait AdcReader {
    /// Full-scale raw value (4095 for a 12-bit converter)
    const MAX_VALUE: u16 = 4095;

    /// Take one raw sample
    fn read(&mut self) -> Result<u16, AdcError>;
}
