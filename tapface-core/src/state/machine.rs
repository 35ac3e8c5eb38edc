//! State machine definition

use super::events::Event;

/// Top-level device states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceState {
    /// Awake, pads ignored, waiting for the I/O button
    #[default]
    Disarmed,
    /// Awake, pads play clips
    Armed,
    /// Face asleep, backlight pulsing
    Sleeping,
    /// Shutting down; the board restarts from reset on the next press
    PoweringOff,
}

impl DeviceState {
    /// Whether the inactivity timer runs in this state
    pub fn is_awake(&self) -> bool {
        matches!(self, DeviceState::Disarmed | DeviceState::Armed)
    }

    /// Process an event and return the next state
    ///
    /// Unlisted pairs leave the state unchanged.
    pub fn transition(self, event: Event) -> Self {
        use DeviceState::*;
        use Event::*;

        match (self, event) {
            // Power-off wins from every live state
            (PoweringOff, _) => PoweringOff,
            (_, PowerOffHold) | (_, BatteryCritical) => PoweringOff,

            // Short press arms, re-arms, or wakes into Armed
            (Disarmed | Armed | Sleeping, ShortPress) => Armed,

            (Disarmed | Armed, InactivityTimeout) => Sleeping,

            (Armed, PadFired(_)) => Armed,

            _ => self,
        }
    }
}
