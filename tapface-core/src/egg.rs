//! Easter egg detector

use heapless::Vec;

use crate::config::MAX_SECRET_LEN;

/// Rolling window over the most recent pad presses
#[derive(Debug, Clone)]
pub struct EasterEgg {
    secret: Vec<u8, MAX_SECRET_LEN>,
    window: Vec<u8, MAX_SECRET_LEN>,
}

impl EasterEgg {
    /// Detector for `secret`; an empty secret never matches
    pub fn new(secret: &[u8]) -> Self {
        let mut stored = Vec::new();
        for &pad in secret.iter().take(MAX_SECRET_LEN) {
            let _ = stored.push(pad);
        }
        Self {
            secret: stored,
            window: Vec::new(),
        }
    }

    /// Record a press; true when the window now equals the secret
    ///
    /// A match empties the window, so overlapping repeats need the whole
    /// sequence again.
    pub fn record(&mut self, channel: u8) -> bool {
        if self.secret.is_empty() {
            return false;
        }
        if self.window.len() == self.secret.len() {
            self.window.remove(0);
        }
        let _ = self.window.push(channel);
        if self.window == self.secret {
            self.window.clear();
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(egg: &mut EasterEgg, presses: &[u8]) -> std::vec::Vec<bool> {
        presses.iter().map(|&p| egg.record(p)).collect()
    }

    #[test]
    fn test_exact_sequence_triggers() {
        let mut egg = EasterEgg::new(&[0, 2, 4]);
        assert_eq!(feed(&mut egg, &[0, 2, 4]), [false, false, true]);
    }

    #[test]
    fn test_triggers_on_third_of_four() {
        let mut egg = EasterEgg::new(&[0, 2, 4]);
        assert_eq!(feed(&mut egg, &[0, 2, 4, 4]), [false, false, true, false]);
    }

    #[test]
    fn test_wrong_order_does_not_trigger() {
        let mut egg = EasterEgg::new(&[0, 2, 4]);
        assert_eq!(feed(&mut egg, &[2, 4, 0]), [false, false, false]);
    }

    #[test]
    fn test_longer_history_ending_in_secret() {
        let mut egg = EasterEgg::new(&[0, 2, 4]);
        let fired = feed(&mut egg, &[1, 1, 3, 0, 0, 2, 4]);
        assert_eq!(fired.iter().filter(|&&f| f).count(), 1);
        assert!(fired[6]);
    }

    #[test]
    fn test_match_clears_window() {
        let mut egg = EasterEgg::new(&[1, 1]);
        assert_eq!(feed(&mut egg, &[1, 1, 1, 1]), [false, true, false, true]);
    }

    #[test]
    fn test_empty_secret_never_triggers() {
        let mut egg = EasterEgg::new(&[]);
        assert!(!egg.record(0));
    }
}
