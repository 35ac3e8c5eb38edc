//! Idle chatter
//!
//! The idle screens show their own prompt for one interval, then cycle
//! through the configured messages. The rotation clock is shared between
//! the armed and disarmed screens; any activity restarts it from the prompt.

use crate::config::ChatterConfig;
use crate::traits::RandomSource;

/// Rotating idle text
#[derive(Debug, Clone)]
pub struct Chatter {
    config: ChatterConfig,
    /// `None` while the prompt is showing
    index: Option<usize>,
    since_ms: u64,
}

impl Chatter {
    pub fn new(config: ChatterConfig, now_ms: u64) -> Self {
        Self {
            config,
            index: None,
            since_ms: now_ms,
        }
    }

    /// Go back to the prompt with the dwell clock at `now_ms`
    pub fn reset(&mut self, now_ms: u64) {
        self.index = None;
        self.since_ms = now_ms;
    }

    /// Text for the idle screen at `now_ms`
    ///
    /// Returns `prompt` during the first interval after a reset, then one
    /// message per interval.
    pub fn text<'a>(&'a mut self, now_ms: u64, prompt: &'a str) -> &'a str {
        let count = self.config.messages.len();
        if count == 0 {
            return prompt;
        }
        let due = now_ms.saturating_sub(self.since_ms) >= u64::from(self.config.interval_ms);
        if due {
            self.index = Some(match self.index {
                None => 0,
                Some(i) => (i + 1) % count,
            });
            self.since_ms = now_ms;
        }
        match self.index {
            Some(i) => self.config.messages.get(i).map_or(prompt, |m| m.as_str()),
            None => prompt,
        }
    }

    /// Any message, chosen by `rng`; empty when none are configured
    pub fn random_message<R: RandomSource>(&self, rng: &mut R) -> &str {
        let count = self.config.messages.len() as u32;
        let pick = rng.below(count) as usize;
        self.config.messages.get(pick).map_or("", |m| m.as_str())
    }
}
