//! tapface - touch-pad sound box firmware
//!
//! Main firmware binary for the Raspberry Pi Pico build: five capacitive
//! pads, a 20x4 character LCD face, an I2S amplifier playing clips from an
//! SD card and a battery on VSYS.
//!
//! Core 0 runs the control loop from `tapface-core`; core 1 runs the clip
//! player so card reads and I2S DMA never stall the face or the pads.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::{Executor, Spawner};
use embassy_rp::adc::{self, Adc, Channel};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{AnyPin, Input, Level, Output, Pull};
use embassy_rp::i2c::I2c;
use embassy_rp::multicore::{spawn_core1, Stack};
use embassy_rp::peripherals::{DMA_CH0, PIN_10, PIN_11, PIN_2, PIN_3, PIN_4, PIN_5, PIN_9, PIO0, SPI0};
use embassy_rp::pio::Pio;
use embassy_rp::pio_programs::i2s::{PioI2sOut, PioI2sOutProgram};
use embassy_rp::spi::{self, Spi};
use embassy_rp::Peri;
use embassy_time::Delay;
use embedded_hal_bus::spi::ExclusiveDevice;
use embedded_sdmmc::SdCard;
use static_cell::{ConstStaticCell, StaticCell};
use {defmt_rtt as _, panic_probe as _};

use tapface_core::traits::XorShift32;
use tapface_core::{Device, Peripherals};
use tapface_drivers::{AdcBattery, FlashCounterRegion, GpioAmp, GpioInputs, Hd44780};
use tapface_hal::{I2cConfig, Polarity};
use tapface_hal_rp2040::adc::RpAdc;
use tapface_hal_rp2040::flash::Rp2040FlashStorage;
use tapface_hal_rp2040::gpio::{RpInput, RpOutput, SharedInput};
use tapface_hal_rp2040::i2c::{controller_config, RpI2cBus};
use tapface_hal_rp2040::power::ButtonWake;

use crate::audio::{AudioLink, Player, BIT_DEPTH, BLOCK_FRAMES, OUTPUT_RATE, SD_FAST_HZ};
use crate::board::{EmbassyClock, ParkPower, RpBoard};
use crate::channels::DISPLAY_BUS;

mod audio;
mod board;
mod channels;
mod config;

bind_interrupts!(struct Irqs {
    PIO0_IRQ_0 => embassy_rp::pio::InterruptHandler<PIO0>;
});

/// GPIO of the I/O button
const BUTTON_GPIO: u8 = 21;

/// SPI clock while the SD card is initialised
const SD_INIT_HZ: u32 = 400_000;

/// Core 1 stack size
const CORE1_STACK_SIZE: usize = 16 * 1024;

static CORE1_STACK: ConstStaticCell<Stack<CORE1_STACK_SIZE>> = ConstStaticCell::new(Stack::new());
static CORE1_EXECUTOR: StaticCell<Executor> = StaticCell::new();

// I2S DMA buffers (must live forever)
static FRONT_BUF: ConstStaticCell<[u32; BLOCK_FRAMES]> = ConstStaticCell::new([0; BLOCK_FRAMES]);
static BACK_BUF: ConstStaticCell<[u32; BLOCK_FRAMES]> = ConstStaticCell::new([0; BLOCK_FRAMES]);

// The I/O button is read by both the control loop and the power-off park
static BUTTON: StaticCell<Input<'static>> = StaticCell::new();

/// Peripherals handed to core 1
struct AudioResources {
    spi: Peri<'static, SPI0>,
    sck: Peri<'static, PIN_2>,
    mosi: Peri<'static, PIN_3>,
    miso: Peri<'static, PIN_4>,
    cs: Peri<'static, PIN_5>,
    pio: Peri<'static, PIO0>,
    dma: Peri<'static, DMA_CH0>,
    data: Peri<'static, PIN_9>,
    bclk: Peri<'static, PIN_10>,
    lrc: Peri<'static, PIN_11>,
}

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("tapface firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Flash must be touched before core 1 starts: the unique ID read runs
    // with XIP disabled
    let mut flash = Rp2040FlashStorage::new(p.FLASH, p.DMA_CH2);
    let flash_id = flash.unique_id().unwrap_or(0);

    let (config, source) = config::load_config(&mut flash).await;
    info!(
        "Configuration loaded from {}: {} pads, {}x{} panel",
        source,
        config.pads.len(),
        config.display.cols,
        config.display.rows
    );

    // Audio player on core 1
    let resources = AudioResources {
        spi: p.SPI0,
        sck: p.PIN_2,
        mosi: p.PIN_3,
        miso: p.PIN_4,
        cs: p.PIN_5,
        pio: p.PIO0,
        dma: p.DMA_CH0,
        data: p.PIN_9,
        bclk: p.PIN_10,
        lrc: p.PIN_11,
    };
    spawn_core1(p.CORE1, CORE1_STACK.take(), move || {
        let player = audio_player(resources);
        let executor = CORE1_EXECUTOR.init(Executor::new());
        executor.run(move |spawner| spawner.spawn(audio::audio_task(player)).unwrap())
    });

    // LCD on I2C0 (SDA GP0, SCL GP1)
    let i2c_config = I2cConfig {
        frequency: config.display.i2c_frequency,
    };
    let i2c = I2c::new_blocking(p.I2C0, p.PIN_1, p.PIN_0, controller_config(&i2c_config));
    let display = Hd44780::new(
        RpI2cBus::new(i2c, &DISPLAY_BUS),
        Delay,
        config.display.i2c_address,
        config.display.cols,
        config.display.rows,
    );

    // Battery on ADC3 (VSYS / 3); the temperature sensor seeds the RNG
    let mut adc = RpAdc::new(
        Adc::new_blocking(p.ADC, adc::Config::default()),
        Channel::new_pin(p.PIN_29, Pull::None),
    );
    let mut temp_sensor = Channel::new_temp_sensor(p.ADC_TEMP_SENSOR);
    let seed = adc.noise_seed(&mut temp_sensor) ^ (flash_id as u32) ^ ((flash_id >> 32) as u32);

    // Pads and the I/O button
    let pads: [Peri<'static, AnyPin>; 5] = [
        p.PIN_6.into(),
        p.PIN_7.into(),
        p.PIN_8.into(),
        p.PIN_16.into(),
        p.PIN_17.into(),
    ];
    let button = SharedInput::new(BUTTON.init(Input::new(p.PIN_21, Pull::Up)));
    let inputs = unwrap!(GpioInputs::new(pads.into_iter().map(RpInput::pull_down), button));

    let amp = GpioAmp::new(RpOutput::new(p.PIN_22.into(), false), Polarity::ActiveHigh);

    let peripherals: Peripherals<RpBoard> = Peripherals {
        display,
        audio: AudioLink::default(),
        amp,
        battery: AdcBattery::new(adc),
        store: FlashCounterRegion::new(flash),
        inputs,
        power: ParkPower::new(ButtonWake::new(button, Polarity::ActiveLow, BUTTON_GPIO)),
        clock: EmbassyClock,
        rng: XorShift32::new(seed),
    };

    let mut device = Device::new(config, peripherals);
    let count = device.boot();
    info!("Booted with {} interactions on record", count);

    // The control loop blocks between ticks; nothing else runs on core 0
    loop {
        if let Some(event) = device.run_once() {
            info!("{} -> {}", event, device.state());
        }
        while let Some(fault) = device.take_fault() {
            warn!("Recovered: {}", fault);
        }
    }
}

/// Bring up the SD card and the I2S output on core 1
fn audio_player(r: AudioResources) -> Player {
    let mut spi_config = spi::Config::default();
    spi_config.frequency = SD_INIT_HZ;
    let spi = Spi::new_blocking(r.spi, r.sck, r.mosi, r.miso, spi_config);
    let cs = Output::new(r.cs, Level::High);
    let device = match ExclusiveDevice::new(spi, cs, Delay) {
        Ok(device) => device,
        Err(never) => match never {},
    };

    let card = SdCard::new(device, Delay);
    match card.num_bytes() {
        Ok(bytes) => {
            info!("SD card found, {} MB", bytes / (1024 * 1024));
            card.spi(|dev| dev.bus_mut().set_frequency(SD_FAST_HZ));
        }
        // The card is initialised again on first use
        Err(e) => warn!("SD card not ready: {}", Debug2Format(&e)),
    }

    let Pio { mut common, sm0, .. } = Pio::new(r.pio, Irqs);
    let program = PioI2sOutProgram::new(&mut common);
    let i2s = PioI2sOut::new(
        &mut common,
        sm0,
        r.dma,
        r.data,
        r.bclk,
        r.lrc,
        OUTPUT_RATE,
        BIT_DEPTH,
        &program,
    );

    Player::new(card, i2s, common, FRONT_BUF.take(), BACK_BUF.take())
}
