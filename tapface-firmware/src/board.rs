//! Raspberry Pi Pico board definition
//!
//! Pin map:
//!
//! | Function        | GPIO                      |
//! |-----------------|---------------------------|
//! | LCD I2C0        | SDA 0, SCL 1 (PCF8574)    |
//! | SD card SPI0    | SCK 2, MOSI 3, MISO 4     |
//! | SD card CS      | 5                         |
//! | Touch pads      | 6, 7, 8, 16, 17           |
//! | I2S             | DATA 9, BCLK 10, LRC 11   |
//! | I/O button      | 21 (to ground, pulled up) |
//! | Amplifier gate  | 22 (active high)          |
//! | Battery         | 29 (VSYS / 3, ADC3)       |

use embassy_rp::peripherals::I2C0;
use embassy_time::{block_for, Delay, Duration, Instant};
use embedded_hal::delay::DelayNs;

use tapface_core::traits::{Clock, PowerControl, XorShift32};
use tapface_core::Board;
use tapface_drivers::{AdcBattery, FlashCounterRegion, GpioAmp, GpioInputs, Hd44780};
use tapface_hal_rp2040::adc::RpAdc;
use tapface_hal_rp2040::flash::Rp2040FlashStorage;
use tapface_hal_rp2040::gpio::{RpInput, RpOutput, SharedInput};
use tapface_hal_rp2040::i2c::RpI2cBus;
use tapface_hal_rp2040::power::ButtonWake;

use crate::audio::AudioLink;

/// The Pico carrier board
pub struct RpBoard;

impl Board for RpBoard {
    type Display = Hd44780<RpI2cBus<'static, I2C0>, Delay>;
    type Audio = AudioLink;
    type Amp = GpioAmp<RpOutput<'static>>;
    type Battery = AdcBattery<RpAdc<'static>>;
    type Store = FlashCounterRegion<Rp2040FlashStorage<'static>>;
    type Inputs = GpioInputs<RpInput<'static>, SharedInput>;
    type Power = ParkPower;
    type Clock = EmbassyClock;
    type Rng = XorShift32;
}

/// Blocking clock on the embassy time driver
pub struct EmbassyClock;

impl DelayNs for EmbassyClock {
    fn delay_ns(&mut self, ns: u32) {
        block_for(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_us(&mut self, us: u32) {
        block_for(Duration::from_micros(u64::from(us)));
    }

    fn delay_ms(&mut self, ms: u32) {
        block_for(Duration::from_millis(u64::from(ms)));
    }
}

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }
}

/// Power off by parking until the I/O button resets the chip
pub struct ParkPower(ButtonWake<SharedInput>);

impl ParkPower {
    pub fn new(wake: ButtonWake<SharedInput>) -> Self {
        Self(wake)
    }
}

impl PowerControl for ParkPower {
    fn deep_power_off(&mut self) {
        defmt::info!("Parked until the I/O button is pressed");
        self.0.park()
    }
}
