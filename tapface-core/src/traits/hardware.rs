//! Inputs, time and power traits

use embedded_hal::delay::DelayNs;

/// Touch pads plus the I/O button
///
/// Polarity is handled by the implementation: `pad_high` is true while a
/// pad is touched and `button_pressed` is true while the button is held.
pub trait InputSource {
    /// Number of pads wired
    fn pad_count(&self) -> usize;

    /// Current level of pad `index`; false for an index out of range
    fn pad_high(&mut self, index: usize) -> bool;

    /// Whether the I/O button is held
    fn button_pressed(&mut self) -> bool;
}

/// Monotonic millisecond clock with a blocking delay
///
/// Delays must advance [`now_ms`](Self::now_ms); the device loop measures
/// its bounded waits with the same clock it sleeps on.
pub trait Clock: DelayNs {
    fn now_ms(&self) -> u64;
}

/// Deep power-off with wake on the I/O button
pub trait PowerControl {
    /// Arm wake-on-button and halt
    ///
    /// On hardware this does not return; the board restarts from reset
    /// when the button is pressed. Host mocks record the call and return.
    fn deep_power_off(&mut self);
}
