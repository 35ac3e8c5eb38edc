//! Face expressions and the idle animation

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::glyphs::{Eye, Mouth};

/// What the two eyes show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Expression {
    /// Both eyes share one shape
    Symmetric(Eye),
    /// Left and right eye differ
    Asymmetric(Eye, Eye),
}

impl Expression {
    /// Shape of the left eye
    pub fn left(self) -> Eye {
        match self {
            Expression::Symmetric(eye) | Expression::Asymmetric(eye, _) => eye,
        }
    }

    /// Shape of the right eye
    pub fn right(self) -> Eye {
        match self {
            Expression::Symmetric(eye) | Expression::Asymmetric(_, eye) => eye,
        }
    }

    /// Mouth implied by the expression; the left eye decides
    pub fn default_mouth(self) -> Mouth {
        self.left().default_mouth()
    }
}

impl From<Eye> for Expression {
    fn from(eye: Eye) -> Self {
        Expression::Symmetric(eye)
    }
}

/// One step of a looping animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationStep {
    pub expression: Expression,
    pub duration_ms: u32,
}

const fn step(expression: Expression, duration_ms: u32) -> AnimationStep {
    AnimationStep {
        expression,
        duration_ms,
    }
}

/// Idle animation: glance around, blink, wink, smile
pub const IDLE_ANIMATION: &[AnimationStep] = &[
    step(Expression::Symmetric(Eye::Center), 3000),
    step(Expression::Symmetric(Eye::Blink), 150),
    step(Expression::Symmetric(Eye::Center), 2000),
    step(Expression::Symmetric(Eye::Left), 1500),
    step(Expression::Symmetric(Eye::Center), 1000),
    step(Expression::Symmetric(Eye::Right), 1500),
    step(Expression::Symmetric(Eye::Center), 2000),
    step(Expression::Symmetric(Eye::Blink), 150),
    step(Expression::Symmetric(Eye::Center), 2000),
    step(Expression::Asymmetric(Eye::Center, Eye::WinkShut), 1500),
    step(Expression::Symmetric(Eye::Center), 2000),
    step(Expression::Symmetric(Eye::Happy), 2000),
];

/// Position in a looping animation
///
/// Pull-based: nothing advances unless [`current`](Self::current) is
/// called, and each call advances at most one step. A caller that stalls
/// for several step durations resumes on the next step rather than
/// skipping ahead.
#[derive(Debug, Clone)]
pub struct AnimationCursor {
    steps: &'static [AnimationStep],
    index: usize,
    phase_start_ms: u64,
}

impl AnimationCursor {
    /// Start `steps` at step 0. `steps` must not be empty.
    pub fn new(steps: &'static [AnimationStep], now_ms: u64) -> Self {
        Self {
            steps,
            index: 0,
            phase_start_ms: now_ms,
        }
    }

    /// Cursor over [`IDLE_ANIMATION`]
    pub fn idle(now_ms: u64) -> Self {
        Self::new(IDLE_ANIMATION, now_ms)
    }

    /// Jump back to step 0 with the phase clock at `now_ms`
    pub fn reset(&mut self, now_ms: u64) {
        self.index = 0;
        self.phase_start_ms = now_ms;
    }

    /// Advance if the active step has run its course, then report it
    pub fn current(&mut self, now_ms: u64) -> Expression {
        let Some(active) = self.steps.get(self.index) else {
            return Expression::Symmetric(Eye::Center);
        };
        if now_ms.saturating_sub(self.phase_start_ms) >= u64::from(active.duration_ms) {
            self.index = (self.index + 1) % self.steps.len();
            self.phase_start_ms = now_ms;
        }
        self.steps[self.index].expression
    }

    /// Index of the active step
    pub fn index(&self) -> usize {
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asymmetric_mouth_follows_left_eye() {
        let wink = Expression::Asymmetric(Eye::Center, Eye::WinkShut);
        assert_eq!(wink.left(), Eye::Center);
        assert_eq!(wink.right(), Eye::WinkShut);
        assert_eq!(wink.default_mouth(), Mouth::Neutral);
        assert_eq!(Expression::Symmetric(Eye::Happy).default_mouth(), Mouth::Smile);
    }

    #[test]
    fn test_cursor_holds_then_advances_once() {
        let mut cursor = AnimationCursor::idle(0);
        assert_eq!(cursor.current(2999), Expression::Symmetric(Eye::Center));
        assert_eq!(cursor.index(), 0);
        assert_eq!(cursor.current(3000), Expression::Symmetric(Eye::Blink));
        assert_eq!(cursor.index(), 1);
    }

    #[test]
    fn test_cursor_never_skips_steps() {
        let mut cursor = AnimationCursor::idle(0);
        // A long stall still moves a single step per call
        cursor.current(60_000);
        assert_eq!(cursor.index(), 1);
        cursor.current(60_000);
        assert_eq!(cursor.index(), 1);
        cursor.current(60_150);
        assert_eq!(cursor.index(), 2);
    }

    #[test]
    fn test_cursor_wraps_and_resets() {
        let mut cursor = AnimationCursor::idle(0);
        let mut now = 0;
        for step in IDLE_ANIMATION {
            now += u64::from(step.duration_ms);
            cursor.current(now);
        }
        assert_eq!(cursor.index(), 0);

        cursor.current(now + 3000);
        assert_eq!(cursor.index(), 1);
        cursor.reset(now + 3001);
        assert_eq!(cursor.index(), 0);
        assert_eq!(cursor.current(now + 3002), Expression::Symmetric(Eye::Center));
    }
}
