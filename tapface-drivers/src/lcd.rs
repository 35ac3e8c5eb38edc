//! HD44780 character LCD over a PCF8574 I2C backpack
//!
//! The backpack exposes the controller's 4-bit interface through an 8-bit
//! port expander:
//!
//! ```text
//!   P7 P6 P5 P4 | P3 | P2 | P1 | P0
//!   D7 D6 D5 D4 | BL | EN | RW | RS
//! ```
//!
//! Every byte is sent as two nibbles, each latched by an EN pulse. The bus
//! is shared, so each byte is sent under a [`BusGuard`] and a failed
//! transfer is retried a few times before giving up.

use embedded_hal::delay::DelayNs;
use tapface_display::{CharDisplay, DisplayError, GLYPH_SLOTS};
use tapface_hal::{BusGuard, BusLock, I2cBus};

/// Default backpack address (A0..A2 open)
pub const DEFAULT_ADDRESS: u8 = 0x27;

/// Widest HD44780 line
const MAX_COLS: u8 = 40;

/// Attempts per expander write
const WRITE_ATTEMPTS: u8 = 3;

/// DDRAM address of the first column of each row (20x4 layout)
const ROW_OFFSETS: [u8; 4] = [0x00, 0x40, 0x14, 0x54];

/// Expander bits
mod pin {
    pub const RS: u8 = 0x01;
    pub const EN: u8 = 0x04;
    pub const BACKLIGHT: u8 = 0x08;
}

/// HD44780 commands
mod cmd {
    pub const CLEAR: u8 = 0x01;
    /// Entry mode: increment, no shift
    pub const ENTRY_MODE: u8 = 0x06;
    /// Display on, cursor off, blink off
    pub const DISPLAY_ON: u8 = 0x0C;
    /// Function set: 4-bit, 2 lines, 5x8 font
    pub const FUNCTION_SET: u8 = 0x28;
    pub const SET_CGRAM: u8 = 0x40;
    pub const SET_DDRAM: u8 = 0x80;
}

/// HD44780 panel behind a PCF8574
pub struct Hd44780<B, D> {
    bus: B,
    delay: D,
    address: u8,
    cols: u8,
    rows: u8,
    backlight: bool,
}

impl<B, D> Hd44780<B, D>
where
    B: I2cBus + BusLock,
    D: DelayNs,
{
    pub fn new(bus: B, delay: D, address: u8, cols: u8, rows: u8) -> Self {
        Self {
            bus,
            delay,
            address,
            cols: cols.min(MAX_COLS),
            rows: rows.min(ROW_OFFSETS.len() as u8),
            backlight: true,
        }
    }

    /// Give back the bus and delay
    pub fn release(self) -> (B, D) {
        (self.bus, self.delay)
    }

    fn backlight_bit(&self) -> u8 {
        if self.backlight {
            pin::BACKLIGHT
        } else {
            0
        }
    }

    /// Send one byte as two nibbles; `mode` is 0 for commands, RS for data
    fn send(&mut self, value: u8, mode: u8) -> Result<(), DisplayError> {
        let flags = mode | self.backlight_bit();
        let address = self.address;
        let mut guard = BusGuard::acquire(&mut self.bus);
        pulse(&mut *guard, &mut self.delay, address, (value & 0xF0) | flags)?;
        pulse(&mut *guard, &mut self.delay, address, ((value << 4) & 0xF0) | flags)
    }

    fn command(&mut self, value: u8) -> Result<(), DisplayError> {
        self.send(value, 0)
    }

    fn data(&mut self, value: u8) -> Result<(), DisplayError> {
        self.send(value, pin::RS)
    }

    /// Raw expander write without an EN pulse
    fn write_port(&mut self, frame: u8) -> Result<(), DisplayError> {
        let address = self.address;
        let mut guard = BusGuard::acquire(&mut self.bus);
        expander_write(&mut *guard, address, frame)
    }
}

fn expander_write<B: I2cBus>(bus: &mut B, address: u8, frame: u8) -> Result<(), DisplayError> {
    for _ in 0..WRITE_ATTEMPTS {
        if bus.write(address, &[frame]).is_ok() {
            return Ok(());
        }
    }
    Err(DisplayError::Communication)
}

/// Present `frame` on the port and latch it with an EN pulse
fn pulse<B: I2cBus, D: DelayNs>(bus: &mut B, delay: &mut D, address: u8, frame: u8) -> Result<(), DisplayError> {
    expander_write(bus, address, frame | pin::EN)?;
    delay.delay_us(1);
    expander_write(bus, address, frame & !pin::EN)?;
    delay.delay_us(50);
    Ok(())
}

impl<B, D> CharDisplay for Hd44780<B, D>
where
    B: I2cBus + BusLock,
    D: DelayNs,
{
    fn init(&mut self) -> Result<(), DisplayError> {
        // Power-on wait, then force 8-bit mode three times and drop to
        // 4-bit ("initializing by instruction")
        self.delay.delay_ms(50);
        self.write_port(self.backlight_bit())?;
        let flags = self.backlight_bit();
        let address = self.address;
        for (nibble, wait_us) in [(0x30, 4_500), (0x30, 4_500), (0x30, 150), (0x20, 150)] {
            let mut guard = BusGuard::acquire(&mut self.bus);
            pulse(&mut *guard, &mut self.delay, address, nibble | flags)?;
            drop(guard);
            self.delay.delay_us(wait_us);
        }
        self.command(cmd::FUNCTION_SET)?;
        self.command(cmd::DISPLAY_ON)?;
        self.clear()?;
        self.command(cmd::ENTRY_MODE)
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.command(cmd::CLEAR)?;
        self.delay.delay_ms(2);
        Ok(())
    }

    fn set_cursor(&mut self, row: u8, col: u8) -> Result<(), DisplayError> {
        if row >= self.rows || col >= self.cols {
            return Err(DisplayError::InvalidCoordinates);
        }
        self.command(cmd::SET_DDRAM | (ROW_OFFSETS[row as usize] + col))
    }

    fn write_char(&mut self, code: u8) -> Result<(), DisplayError> {
        self.data(code)
    }

    fn program_glyph(&mut self, slot: u8, bitmap: &[u8; 8]) -> Result<(), DisplayError> {
        if slot >= GLYPH_SLOTS {
            return Err(DisplayError::InvalidCoordinates);
        }
        self.command(cmd::SET_CGRAM | (slot << 3))?;
        for &line in bitmap {
            self.data(line & 0x1F)?;
        }
        // Back to DDRAM so the next character write lands on the panel
        self.command(cmd::SET_DDRAM)
    }

    fn set_backlight(&mut self, on: bool) -> Result<(), DisplayError> {
        self.backlight = on;
        self.write_port(self.backlight_bit())
    }

    fn dimensions(&self) -> (u8, u8) {
        (self.cols, self.rows)
    }
}
