//! Playback coordination
//!
//! Wraps a clip in the amplifier power sequence and keeps the face
//! current while it plays:
//!
//! ```text
//!   stop stale clip ─► playing face ─► amp on ─► settle ─► open
//!        │                                                  │
//!        │                         missing: amp off, "Missing file"
//!        ▼                                                  ▼
//!   poll every 10 ms (cancel on button) ─► stop ─► settle ─► amp off
//! ```

use tapface_display::{CharDisplay, Expression, FaceView, Mouth, Renderer};

use crate::traits::{AudioEngine, Clock, InputSource, OutputEnable};

/// Poll period while a clip plays
const POLL_MS: u32 = 10;

/// Gap after stopping a stale clip
const RESTART_GAP_MS: u32 = 50;

/// What to play and how to present it
#[derive(Debug, Clone, Copy)]
pub struct PlayRequest<'a> {
    /// Full asset path
    pub path: &'a str,
    /// Bottom-row text while playing
    pub label: &'a str,
    /// Eyes while playing; `None` follows the idle animation
    pub expression: Option<Expression>,
    /// Whether the I/O button stops the clip
    pub cancellable: bool,
}

/// How a playback ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlayOutcome {
    /// Clip ran to the end
    Completed,
    /// Clip could not be opened
    Missing,
    /// Stopped by the I/O button
    Cancelled,
}

/// Delays used by [`PlaybackCoordinator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackTiming {
    /// Amplifier settle time before and after a clip
    pub settle_ms: u32,
    /// "Missing file" dwell
    pub missing_ms: u32,
}

/// Owns the audio engine and the amplifier gate
pub struct PlaybackCoordinator<A, O> {
    audio: A,
    amp: O,
    timing: PlaybackTiming,
}

impl<A: AudioEngine, O: OutputEnable> PlaybackCoordinator<A, O> {
    pub fn new(audio: A, amp: O, timing: PlaybackTiming) -> Self {
        Self { audio, amp, timing }
    }

    /// Play a clip with the playing face, blocking until it ends
    pub fn play<D, I, C>(
        &mut self,
        request: &PlayRequest<'_>,
        renderer: &mut Renderer<D>,
        inputs: &mut I,
        clock: &mut C,
    ) -> PlayOutcome
    where
        D: CharDisplay,
        I: InputSource,
        C: Clock,
    {
        if self.audio.is_playing() {
            self.audio.stop();
            clock.delay_ms(RESTART_GAP_MS);
        }

        Self::show_playing(request, renderer, clock);
        self.amp.set_enabled(true);
        clock.delay_ms(self.timing.settle_ms);

        if self.audio.open(request.path).is_err() {
            self.amp.set_enabled(false);
            let _ = renderer.show_status("Missing file", file_name(request.path), false);
            clock.delay_ms(self.timing.missing_ms);
            return PlayOutcome::Missing;
        }

        self.audio.play();
        let mut outcome = PlayOutcome::Completed;
        while self.audio.is_playing() {
            if request.cancellable && inputs.button_pressed() {
                self.audio.stop();
                outcome = PlayOutcome::Cancelled;
                break;
            }
            Self::show_playing(request, renderer, clock);
            clock.delay_ms(POLL_MS);
        }

        self.audio.stop();
        clock.delay_ms(self.timing.settle_ms);
        self.amp.set_enabled(false);
        outcome
    }

    /// Play a clip with no display changes, skipping it if absent
    ///
    /// Returns whether the clip was found.
    pub fn play_if_present<C: Clock>(&mut self, path: &str, clock: &mut C) -> bool {
        if !self.audio.exists(path) {
            return false;
        }
        self.amp.set_enabled(true);
        clock.delay_ms(self.timing.settle_ms);
        if self.audio.open(path).is_ok() {
            self.audio.play();
            while self.audio.is_playing() {
                clock.delay_ms(POLL_MS);
            }
        }
        self.audio.stop();
        clock.delay_ms(self.timing.settle_ms);
        self.amp.set_enabled(false);
        true
    }

    /// Power the amplifier down
    pub fn disable_output(&mut self) {
        self.amp.set_enabled(false);
    }

    /// Amplifier off, then stop any clip
    pub fn shutdown(&mut self) {
        self.amp.set_enabled(false);
        if self.audio.is_playing() {
            self.audio.stop();
        }
    }

    fn show_playing<D: CharDisplay, C: Clock>(request: &PlayRequest<'_>, renderer: &mut Renderer<D>, clock: &C) {
        let expression = match request.expression {
            Some(expression) => expression,
            None => renderer.animated_expression(clock.now_ms()),
        };
        let _ = renderer.show_face(&FaceView {
            text: request.label,
            expression,
            battery: None,
            mouth: Some(Mouth::Open),
        });
    }
}

/// Last path segment, for the "Missing file" screen
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
