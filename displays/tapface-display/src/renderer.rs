//! Change-detecting renderer
//!
//! Two views share the panel:
//!
//! - the status view: two lines on the middle rows, optionally centered
//! - the face view: eyes, mouth and a bottom line with the battery label
//!
//! Each view remembers what it last drew and skips the clear-and-repaint
//! when asked to draw the same content again. Drawing one view forgets the
//! other's cache. Glyph slots are cached separately because CGRAM survives
//! a clear. Any panel error forgets every cache so the next call repaints
//! from scratch.

use embedded_hal::delay::DelayNs;

use crate::backend::{CharDisplay, DisplayError};
use crate::face::{AnimationCursor, Expression};
use crate::glyphs::{Eye, Mouth, LEFT_EYE_SLOT, MOUTH_SLOT, RIGHT_EYE_SLOT};
use crate::text::{self, Line};

/// Face view request
#[derive(Debug, Clone, Copy)]
pub struct FaceView<'a> {
    /// Bottom-row text, left aligned
    pub text: &'a str,
    /// Eye shapes
    pub expression: Expression,
    /// Battery percentage to right-align on the bottom row, if any
    pub battery: Option<u8>,
    /// Mouth override; `None` uses the expression's default
    pub mouth: Option<Mouth>,
}

/// Marquee pacing for [`Renderer::show_message`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollTiming {
    /// Delay between frames
    pub step_ms: u32,
    /// Dwell for messages that fit without scrolling
    pub hold_ms: u32,
    /// Full passes over the longest line
    pub loops: u8,
    /// Dwell after the last scrolled frame
    pub tail_ms: u32,
}

impl Default for ScrollTiming {
    fn default() -> Self {
        Self {
            step_ms: 180,
            hold_ms: 1000,
            loops: 2,
            tail_ms: 250,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FaceState {
    left: Eye,
    right: Eye,
    mouth: Mouth,
    battery: Option<u8>,
    bottom: Line,
}

/// Change-detecting renderer over a [`CharDisplay`]
pub struct Renderer<D> {
    display: D,
    cols: u8,
    rows: u8,
    status: Option<(Line, Line)>,
    face: Option<FaceState>,
    eyes: Option<(Eye, Eye)>,
    mouth: Option<Mouth>,
    backlight: bool,
    animation: AnimationCursor,
}

impl<D: CharDisplay> Renderer<D> {
    /// Wrap a panel. The panel is not touched until the first draw or
    /// [`reset`](Self::reset).
    pub fn new(display: D, now_ms: u64) -> Self {
        let (cols, rows) = display.dimensions();
        Self {
            display,
            cols,
            rows,
            status: None,
            face: None,
            eyes: None,
            mouth: None,
            backlight: true,
            animation: AnimationCursor::idle(now_ms),
        }
    }

    /// Borrow the underlying panel
    pub fn display(&self) -> &D {
        &self.display
    }

    /// Re-run the panel power-up sequence and forget every cache
    pub fn reset(&mut self) -> Result<(), DisplayError> {
        self.invalidate();
        let result = self.display.init();
        self.checked(result)
    }

    /// Forget every cache; the next draw repaints unconditionally
    pub fn invalidate(&mut self) {
        self.status = None;
        self.face = None;
        self.eyes = None;
        self.mouth = None;
    }

    /// Blank the panel
    pub fn clear(&mut self) -> Result<(), DisplayError> {
        self.status = None;
        self.face = None;
        let result = self.display.clear();
        self.checked(result)
    }

    /// Switch the backlight, touching the panel only on a change
    pub fn set_backlight(&mut self, on: bool) -> Result<bool, DisplayError> {
        if self.backlight == on {
            return Ok(false);
        }
        let result = self.display.set_backlight(on);
        self.checked(result)?;
        self.backlight = on;
        Ok(true)
    }

    /// Current backlight state
    pub fn backlight(&self) -> bool {
        self.backlight
    }

    /// Restart the idle animation at step 0
    pub fn reset_animation(&mut self, now_ms: u64) {
        self.animation.reset(now_ms);
    }

    /// Idle animation frame for `now_ms`, advancing at most one step
    pub fn animated_expression(&mut self, now_ms: u64) -> Expression {
        self.animation.current(now_ms)
    }

    /// Index of the active idle animation step
    pub fn animation_step(&self) -> usize {
        self.animation.index()
    }

    /// Draw the two-line status view
    ///
    /// Returns `Ok(true)` when the panel was repainted.
    pub fn show_status(&mut self, top: &str, bottom: &str, center: bool) -> Result<bool, DisplayError> {
        let width = usize::from(self.cols);
        let lines = (text::fit(top, width, center), text::fit(bottom, width, center));
        if self.status.as_ref() == Some(&lines) {
            return Ok(false);
        }
        self.face = None;
        self.status = None;
        let (first, second) = self.status_rows();
        let result = self.paint_status(first, second, &lines);
        self.checked(result)?;
        self.status = Some(lines);
        Ok(true)
    }

    /// Show a message, scrolling lines wider than the panel
    ///
    /// Lines that fit are drawn once and held for `timing.hold_ms`. Otherwise
    /// the wide lines scroll for `timing.loops` passes while narrow lines
    /// stay put, then the last frame is held for `timing.tail_ms`.
    pub fn show_message<Dl: DelayNs>(
        &mut self,
        top: &str,
        bottom: &str,
        center: bool,
        timing: ScrollTiming,
        delay: &mut Dl,
    ) -> Result<(), DisplayError> {
        let width = usize::from(self.cols);
        let top_frames = text::scroll_frame_count(top, width);
        let bottom_frames = text::scroll_frame_count(bottom, width);
        if top_frames == 1 && bottom_frames == 1 {
            self.show_status(top, bottom, center)?;
            delay.delay_ms(timing.hold_ms);
            return Ok(());
        }

        let frames = top_frames.max(bottom_frames);
        for _ in 0..timing.loops {
            for index in 0..frames {
                let a = Self::marquee_line(top, top_frames, width, index, center);
                let b = Self::marquee_line(bottom, bottom_frames, width, index, center);
                self.show_status(&a, &b, false)?;
                delay.delay_ms(timing.step_ms);
            }
        }
        delay.delay_ms(timing.tail_ms);
        Ok(())
    }

    fn marquee_line(line: &str, frames: usize, width: usize, index: usize, center: bool) -> Line {
        if frames > 1 {
            text::scroll_frame(line, width, index % frames)
        } else {
            text::fit(line, width, center)
        }
    }

    /// Draw the face view
    ///
    /// Returns `Ok(true)` when the panel was repainted.
    pub fn show_face(&mut self, view: &FaceView<'_>) -> Result<bool, DisplayError> {
        let width = usize::from(self.cols);
        let bottom = match view.battery {
            Some(pct) => text::split(view.text, &text::percent(pct), width),
            None => text::fit(view.text, width, false),
        };
        let state = FaceState {
            left: view.expression.left(),
            right: view.expression.right(),
            mouth: view.mouth.unwrap_or(view.expression.default_mouth()),
            battery: view.battery,
            bottom,
        };
        if self.face.as_ref() == Some(&state) {
            return Ok(false);
        }
        self.status = None;
        self.face = None;
        let bottom_row = self.rows.saturating_sub(1);
        let result = self.paint_face(state.left, state.right, state.mouth, &[(bottom_row, &state.bottom)]);
        self.checked(result)?;
        self.face = Some(state);
        Ok(true)
    }

    /// Draw the face view, scrolling its text when it is wider than the panel
    ///
    /// Text that fits is drawn once and held for `timing.hold_ms`. Otherwise
    /// the face is drawn once without the battery label and the bottom row
    /// scrolls in place for `timing.loops` passes, then holds for
    /// `timing.tail_ms`.
    pub fn show_face_message<Dl: DelayNs>(
        &mut self,
        view: &FaceView<'_>,
        timing: ScrollTiming,
        delay: &mut Dl,
    ) -> Result<(), DisplayError> {
        let width = usize::from(self.cols);
        let frames = text::scroll_frame_count(view.text, width);
        if frames == 1 {
            self.show_face(view)?;
            delay.delay_ms(timing.hold_ms);
            return Ok(());
        }

        let first = text::scroll_frame(view.text, width, 0);
        self.show_face(&FaceView {
            text: &first,
            battery: None,
            ..*view
        })?;
        let row = self.last_row();
        for _ in 0..timing.loops {
            for index in 0..frames {
                let line = text::scroll_frame(view.text, width, index);
                let result = self.display.write_at(row, 0, &line);
                self.checked(result)?;
                delay.delay_ms(timing.step_ms);
            }
        }
        // The bottom row no longer matches the cached face
        self.face = None;
        delay.delay_ms(timing.tail_ms);
        Ok(())
    }

    /// Closed eyes with a caption on row 2 and a hint on row 3
    ///
    /// Always repaints and leaves both text caches empty.
    pub fn show_sleeping_face(&mut self, caption: &str, hint: &str) -> Result<(), DisplayError> {
        self.status = None;
        self.face = None;
        let width = usize::from(self.cols);
        let caption = text::fit(caption, width, true);
        let hint = text::fit(hint, width, true);
        let last = self.rows.saturating_sub(1);
        let result = self.paint_face(
            Eye::Blink,
            Eye::Blink,
            Mouth::Neutral,
            &[(last.saturating_sub(1), &caption), (last, &hint)],
        );
        self.checked(result)
    }

    /// Overwrite one row in place without clearing or touching caches
    ///
    /// The next change-detected draw only repaints if its own content
    /// changed, so the overwrite persists until then.
    pub fn overwrite_row(&mut self, row: u8, line: &str, center: bool) -> Result<(), DisplayError> {
        let fitted = text::fit(line, usize::from(self.cols), center);
        let result = self.display.write_at(row, 0, &fitted);
        self.checked(result)
    }

    /// Index of the bottom row
    pub fn last_row(&self) -> u8 {
        self.rows.saturating_sub(1)
    }

    fn status_rows(&self) -> (u8, u8) {
        if self.rows >= 4 {
            (1, 2)
        } else {
            (0, 1)
        }
    }

    fn paint_status(&mut self, first: u8, second: u8, lines: &(Line, Line)) -> Result<(), DisplayError> {
        self.display.clear()?;
        self.display.write_at(first, 0, &lines.0)?;
        self.display.write_at(second, 0, &lines.1)
    }

    fn paint_face(
        &mut self,
        left: Eye,
        right: Eye,
        mouth: Mouth,
        rows: &[(u8, &Line)],
    ) -> Result<(), DisplayError> {
        self.load_eyes(left, right)?;
        self.load_mouth(mouth)?;

        let middle = self.cols / 2;
        self.display.clear()?;
        self.display.set_cursor(0, middle.saturating_sub(4))?;
        self.display.write_char(LEFT_EYE_SLOT)?;
        self.display.write_char(LEFT_EYE_SLOT + 1)?;
        self.display.set_cursor(0, middle + 1)?;
        self.display.write_char(RIGHT_EYE_SLOT)?;
        self.display.write_char(RIGHT_EYE_SLOT + 1)?;
        self.display.set_cursor(1, middle.saturating_sub(2))?;
        for slot in MOUTH_SLOT..MOUTH_SLOT + 3 {
            self.display.write_char(slot)?;
        }
        for (row, line) in rows {
            self.display.write_at(*row, 0, line)?;
        }
        Ok(())
    }

    fn load_eyes(&mut self, left: Eye, right: Eye) -> Result<(), DisplayError> {
        if self.eyes == Some((left, right)) {
            return Ok(());
        }
        self.eyes = None;
        let [ll, lr] = left.cells();
        let [rl, rr] = right.cells();
        self.display.program_glyph(LEFT_EYE_SLOT, ll)?;
        self.display.program_glyph(LEFT_EYE_SLOT + 1, lr)?;
        self.display.program_glyph(RIGHT_EYE_SLOT, rl)?;
        self.display.program_glyph(RIGHT_EYE_SLOT + 1, rr)?;
        self.eyes = Some((left, right));
        Ok(())
    }

    fn load_mouth(&mut self, mouth: Mouth) -> Result<(), DisplayError> {
        if self.mouth == Some(mouth) {
            return Ok(());
        }
        self.mouth = None;
        for (offset, cell) in (0u8..).zip(mouth.cells()) {
            self.display.program_glyph(MOUTH_SLOT + offset, cell)?;
        }
        self.mouth = Some(mouth);
        Ok(())
    }

    fn checked<T>(&mut self, result: Result<T, DisplayError>) -> Result<T, DisplayError> {
        if result.is_err() {
            self.invalidate();
        }
        result
    }
}
