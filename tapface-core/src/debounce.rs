//! Pad debouncing
//!
//! A pad fires once it has read high for the debounce threshold, and only
//! once per physical press: it must read low again before it can re-arm.
//! Presses shorter than the threshold never fire.

use heapless::Vec;

use crate::config::MAX_PADS;
use crate::traits::InputSource;

/// A debounced pad press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FireEvent {
    /// Pad index
    pub channel: u8,
    /// Poll time at which the threshold was met
    pub at_ms: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ChannelState {
    high_since: Option<u64>,
    triggered: bool,
}

/// Per-pad debounce tracker
#[derive(Debug, Clone)]
pub struct Debouncer {
    threshold_ms: u32,
    channels: Vec<ChannelState, MAX_PADS>,
}

impl Debouncer {
    /// Track `channels` pads (capped at [`MAX_PADS`])
    pub fn new(channels: usize, threshold_ms: u32) -> Self {
        let mut states = Vec::new();
        for _ in 0..channels.min(MAX_PADS) {
            let _ = states.push(ChannelState::default());
        }
        Self {
            threshold_ms,
            channels: states,
        }
    }

    /// Number of tracked pads
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Whether `channel` has fired and not yet been released
    pub fn is_triggered(&self, channel: usize) -> bool {
        self.channels.get(channel).is_some_and(|c| c.triggered)
    }

    /// Feed one sample for one channel; true when it fires
    fn sample(&mut self, channel: usize, high: bool, now_ms: u64) -> bool {
        let threshold = u64::from(self.threshold_ms);
        let Some(state) = self.channels.get_mut(channel) else {
            return false;
        };
        if !high {
            *state = ChannelState::default();
            return false;
        }
        if state.triggered {
            return false;
        }
        let since = *state.high_since.get_or_insert(now_ms);
        if now_ms.saturating_sub(since) >= threshold {
            state.triggered = true;
            return true;
        }
        false
    }

    /// Sample every pad, returning all that fired
    pub fn poll<I: InputSource>(&mut self, now_ms: u64, inputs: &mut I) -> Vec<FireEvent, MAX_PADS> {
        let mut fired = Vec::new();
        for channel in 0..self.channels.len() {
            let high = inputs.pad_high(channel);
            if self.sample(channel, high, now_ms) {
                let _ = fired.push(FireEvent {
                    channel: channel as u8,
                    at_ms: now_ms,
                });
            }
        }
        fired
    }

    /// Sample pads in order and stop at the first that fires
    ///
    /// Pads after the one that fired are not sampled on this call.
    pub fn poll_first<I: InputSource>(&mut self, now_ms: u64, inputs: &mut I) -> Option<FireEvent> {
        for channel in 0..self.channels.len() {
            let high = inputs.pad_high(channel);
            if self.sample(channel, high, now_ms) {
                return Some(FireEvent {
                    channel: channel as u8,
                    at_ms: now_ms,
                });
            }
        }
        None
    }

    /// Forget the state of every pad that currently reads low
    ///
    /// Pads that read high are left alone; no timer is started.
    pub fn release_all_low<I: InputSource>(&mut self, inputs: &mut I) {
        for (channel, state) in self.channels.iter_mut().enumerate() {
            if !inputs.pad_high(channel) {
                *state = ChannelState::default();
            }
        }
    }
}
