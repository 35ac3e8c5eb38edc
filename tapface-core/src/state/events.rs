//! Events that trigger state transitions

/// Events produced by one tick of the device loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// I/O button released before the power-off hold
    ShortPress,
    /// I/O button held for the power-off hold
    PowerOffHold,
    /// No activity for the sleep timeout
    InactivityTimeout,
    /// Battery at or below the critical cutoff
    BatteryCritical,
    /// Debounced press on a pad
    PadFired(u8),
}
