//! Display backend trait
//!
//! Defines the interface of a character panel with a small bank of
//! user-programmable glyphs.

/// Display backend errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Bus transfer failed after retries
    Communication,
    /// Row, column or glyph slot outside the panel
    InvalidCoordinates,
}

/// Number of programmable glyph slots (CGRAM entries)
pub const GLYPH_SLOTS: u8 = 8;

/// Write-only character display
///
/// Glyph slot `n` is displayed by writing character code `n`.
pub trait CharDisplay {
    /// Run the panel power-up sequence
    fn init(&mut self) -> Result<(), DisplayError>;

    /// Clear the panel and home the cursor
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Move the write cursor
    fn set_cursor(&mut self, row: u8, col: u8) -> Result<(), DisplayError>;

    /// Write one character code at the cursor
    fn write_char(&mut self, code: u8) -> Result<(), DisplayError>;

    /// Program a 5x8 glyph into one of the [`GLYPH_SLOTS`]
    fn program_glyph(&mut self, slot: u8, bitmap: &[u8; 8]) -> Result<(), DisplayError>;

    /// Switch the backlight
    fn set_backlight(&mut self, on: bool) -> Result<(), DisplayError>;

    /// Panel dimensions as (columns, rows)
    fn dimensions(&self) -> (u8, u8);

    /// Write ASCII text at the cursor
    fn write_str(&mut self, text: &str) -> Result<(), DisplayError> {
        for byte in text.bytes() {
            self.write_char(byte)?;
        }
        Ok(())
    }

    /// Position the cursor and write text
    fn write_at(&mut self, row: u8, col: u8, text: &str) -> Result<(), DisplayError> {
        self.set_cursor(row, col)?;
        self.write_str(text)
    }
}
