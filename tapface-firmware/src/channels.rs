//! Cross-core communication
//!
//! The control loop runs on core 0 and the clip player on core 1. They talk
//! through the statics below; embassy-sync's critical-section mutex is the
//! RP2040 hardware spinlock, so these are safe to share between cores.

use core::sync::atomic::AtomicBool;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use tapface_core::config::AssetPath;
use tapface_core::traits::AudioError;
use tapface_hal_rp2040::i2c::BusFlag;

/// Channel capacity for player commands
const AUDIO_CHANNEL_SIZE: usize = 4;

/// Requests from the control loop to the player
///
/// `seq` is echoed in the [`Reply`] so a late answer to an abandoned
/// request is never taken for the current one.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AudioCommand {
    /// Report whether a clip exists
    Exists { seq: u16, path: AssetPath },
    /// Open a clip and parse its header
    Open { seq: u16, path: AssetPath },
    /// Stream the opened clip
    Play,
    /// Abandon the clip being streamed
    Stop,
}

/// Answers to `Exists` and `Open`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AudioReply {
    Exists(bool),
    Opened(Result<(), AudioError>),
}

/// An [`AudioReply`] tagged with the request it answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reply {
    pub seq: u16,
    pub reply: AudioReply,
}

/// Player commands (core 0 to core 1)
pub static AUDIO_CMD: Channel<CriticalSectionRawMutex, AudioCommand, AUDIO_CHANNEL_SIZE> = Channel::new();

/// Player replies (core 1 to core 0)
pub static AUDIO_REPLY: Signal<CriticalSectionRawMutex, Reply> = Signal::new();

/// Set by core 0 before `Play`, cleared by core 1 when the clip ends
pub static PLAYING: AtomicBool = AtomicBool::new(false);

/// Ownership flag for the LCD's I2C bus
pub static DISPLAY_BUS: BusFlag = BusFlag::new();
