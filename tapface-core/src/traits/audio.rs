//! Audio engine and amplifier traits

/// Errors reported by an audio engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AudioError {
    /// No file at the requested path
    NotFound,
    /// File exists but is not a playable clip
    Unsupported,
    /// Storage failed while opening or reading
    Storage,
}

/// Clip player
///
/// Playback runs in the background once [`play`](Self::play) returns; the
/// control loop polls [`is_playing`](Self::is_playing) to follow it.
pub trait AudioEngine {
    /// Check that `path` exists without loading it
    fn exists(&mut self, path: &str) -> bool;

    /// Open a clip and prepare it for playback
    fn open(&mut self, path: &str) -> Result<(), AudioError>;

    /// Start the opened clip
    fn play(&mut self);

    /// Whether a clip is still playing
    fn is_playing(&mut self) -> bool;

    /// Stop playback; a no-op when idle
    fn stop(&mut self);
}

/// Amplifier power gate
pub trait OutputEnable {
    /// Power the amplifier up or down
    fn set_enabled(&mut self, enabled: bool);

    /// Whether the amplifier is powered
    fn is_enabled(&self) -> bool;
}
