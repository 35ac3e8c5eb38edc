//! Power off
//!
//! The Pico has no way to cut its own supply, so "off" parks core 0 in
//! `wfi` with everything else already shut down. A level interrupt on the
//! button wakes it and the chip resets, which looks like a cold boot to
//! the firmware.

use cortex_m::asm;
use cortex_m::peripheral::SCB;
use embassy_rp::pac;
use tapface_hal::{InputPin, Polarity};

/// Wake-on-button parking
pub struct ButtonWake<P> {
    button: P,
    polarity: Polarity,
    gpio: u8,
}

impl<P: InputPin> ButtonWake<P> {
    /// `gpio` is the button's GPIO number
    pub fn new(button: P, polarity: Polarity, gpio: u8) -> Self {
        Self {
            button,
            polarity,
            gpio,
        }
    }

    /// Sleep until the button is pressed, then reset
    pub fn park(&mut self) -> ! {
        loop {
            if self.button.is_asserted(self.polarity) {
                SCB::sys_reset();
            }
            // Level triggered: a press that lands before the wfi still
            // leaves the interrupt pending
            self.enable_wake();
            asm::wfi();
        }
    }

    /// Enable the pressed-level interrupt on core 0
    ///
    /// The GPIO bank handler disables it again when it fires.
    fn enable_wake(&self) {
        let group = usize::from(self.gpio / 8);
        let bit = usize::from(self.gpio % 8);
        let active_low = matches!(self.polarity, Polarity::ActiveLow);
        cortex_m::interrupt::free(|_| {
            pac::IO_BANK0.int_proc(0).inte(group).modify(|w| {
                if active_low {
                    w.set_level_low(bit, true);
                } else {
                    w.set_level_high(bit, true);
                }
            });
        });
    }
}
