//! Character display support for the tapface face
//!
//! This crate provides:
//! - [`CharDisplay`], the write-only interface of an HD44780-class text panel
//! - The eye and mouth glyph bitmaps and the [`Expression`] model
//! - The looping idle animation ([`AnimationCursor`])
//! - Line fitting and marquee helpers for fixed-width rows
//! - [`Renderer`], which gates every redraw behind change detection
//!
//! # Panel layout
//!
//! ```text
//!  col 0         6    11          19
//! row 0         [LL]  [RR]             eyes (glyph slots 0-3)
//! row 1           [MMM]                mouth (glyph slots 4-6)
//! row 2                                spare / "Zzz"
//! row 3  status text            85%
//! ```
//!
//! The status view uses rows 1 and 2 instead and never programs glyphs.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod backend;
pub mod face;
pub mod glyphs;
pub mod renderer;
pub mod text;

// Re-export key types
pub use backend::{CharDisplay, DisplayError, GLYPH_SLOTS};
pub use face::{AnimationCursor, AnimationStep, Expression, IDLE_ANIMATION};
pub use glyphs::{Eye, Mouth};
pub use renderer::{FaceView, Renderer, ScrollTiming};
pub use text::{Line, LINE_CAPACITY};
