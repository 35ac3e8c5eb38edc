//! Clip playback
//!
//! [`AudioLink`] is the control loop's [`AudioEngine`]: it forwards each
//! request to the player on core 1 and waits (bounded) for the answer.
//! [`Player`] owns the SD card and the I2S state machine, and streams
//! clips with two DMA buffers so that reading the card overlaps output.

use core::sync::atomic::Ordering;

use defmt::*;
use embassy_rp::gpio::Output;
use embassy_rp::peripherals::{PIO0, SPI0};
use embassy_rp::pio::Common;
use embassy_rp::pio_programs::i2s::PioI2sOut;
use embassy_rp::spi::{Blocking, Spi};
use embassy_sync::channel::TrySendError;
use embassy_time::{block_for, Delay, Duration, Instant};
use embedded_hal_bus::spi::ExclusiveDevice;
use embedded_sdmmc::{
    Mode, RawDirectory, RawFile, RawVolume, SdCard, TimeSource, Timestamp, VolumeIdx, VolumeManager,
};

use tapface_core::config::truncated;
use tapface_core::traits::{AudioEngine, AudioError};
use tapface_drivers::wav::{parse_header, ClipStream, WavHeader, HEADER_WINDOW};

use crate::channels::{AudioCommand, AudioReply, Reply, AUDIO_CMD, AUDIO_REPLY, PLAYING};

/// I2S frame rate; clips at other rates are resampled
pub const OUTPUT_RATE: u32 = 44_100;

/// Bits per I2S sample
pub const BIT_DEPTH: u32 = 16;

/// Frames per DMA block (about 12ms at 44.1kHz)
pub const BLOCK_FRAMES: usize = 512;

/// SPI clock once the card is initialised
pub const SD_FAST_HZ: u32 = 16_000_000;

/// Longest wait for the player to answer `Exists` or `Open`
const REPLY_TIMEOUT: Duration = Duration::from_millis(2000);

/// Longest wait for the player to acknowledge `Stop`
const STOP_TIMEOUT: Duration = Duration::from_millis(100);

const POLL: Duration = Duration::from_millis(1);

// ============================================================================
// Core 0 side
// ============================================================================

/// Control-loop handle on the player
#[derive(Default)]
pub struct AudioLink {
    seq: u16,
}

impl AudioLink {
    fn send(&mut self, command: AudioCommand, deadline: Instant) -> bool {
        let mut command = command;
        loop {
            match AUDIO_CMD.try_send(command) {
                Ok(()) => return true,
                Err(TrySendError::Full(back)) => {
                    if Instant::now() >= deadline {
                        warn!("Audio command queue full");
                        return false;
                    }
                    command = back;
                    block_for(POLL);
                }
            }
        }
    }

    /// Send the command built for a fresh sequence number and wait for
    /// the reply carrying it
    fn request(&mut self, command: impl FnOnce(u16) -> AudioCommand) -> Option<AudioReply> {
        self.seq = self.seq.wrapping_add(1);
        let seq = self.seq;
        let deadline = Instant::now() + REPLY_TIMEOUT;
        if !self.send(command(seq), deadline) {
            return None;
        }
        while Instant::now() < deadline {
            match AUDIO_REPLY.try_take() {
                Some(Reply { seq: got, reply }) if got == seq => return Some(reply),
                Some(stale) => debug!("Dropped stale audio reply {}", stale.seq),
                None => {}
            }
            block_for(POLL);
        }
        warn!("Audio player did not answer");
        None
    }
}

impl AudioEngine for AudioLink {
    fn exists(&mut self, path: &str) -> bool {
        let path = truncated(path);
        matches!(
            self.request(|seq| AudioCommand::Exists { seq, path }),
            Some(AudioReply::Exists(true))
        )
    }

    fn open(&mut self, path: &str) -> Result<(), AudioError> {
        let path = truncated(path);
        match self.request(|seq| AudioCommand::Open { seq, path }) {
            Some(AudioReply::Opened(result)) => result,
            _ => Err(AudioError::Storage),
        }
    }

    fn play(&mut self) {
        PLAYING.store(true, Ordering::Release);
        if !self.send(AudioCommand::Play, Instant::now() + REPLY_TIMEOUT) {
            PLAYING.store(false, Ordering::Release);
        }
    }

    fn is_playing(&mut self) -> bool {
        PLAYING.load(Ordering::Acquire)
    }

    fn stop(&mut self) {
        if !self.is_playing() {
            return;
        }
        let deadline = Instant::now() + STOP_TIMEOUT;
        if !self.send(AudioCommand::Stop, deadline) {
            return;
        }
        while self.is_playing() && Instant::now() < deadline {
            block_for(POLL);
        }
    }
}

// ============================================================================
// Core 1 side
// ============================================================================

/// The card has no clock; every file gets the FAT epoch
pub struct FixedTime;

impl TimeSource for FixedTime {
    fn get_timestamp(&self) -> Timestamp {
        Timestamp {
            year_since_1970: 0,
            zero_indexed_month: 0,
            zero_indexed_day: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
        }
    }
}

pub type SdSpi = ExclusiveDevice<Spi<'static, SPI0, Blocking>, Output<'static>, Delay>;
pub type Card = SdCard<SdSpi, Delay>;

/// A clip ready to stream
struct OpenClip {
    file: RawFile,
    header: WavHeader,
}

/// SD card reader plus I2S output
pub struct Player {
    volumes: VolumeManager<Card, FixedTime>,
    volume: Option<RawVolume>,
    clip: Option<OpenClip>,
    i2s: PioI2sOut<'static, PIO0, 0>,
    // Dropping the PIO common block would release the I2S pins
    _common: Common<'static, PIO0>,
    front: &'static mut [u32; BLOCK_FRAMES],
    back: &'static mut [u32; BLOCK_FRAMES],
    pending: Option<AudioCommand>,
}

fn audio_error<E: core::fmt::Debug>(e: embedded_sdmmc::Error<E>) -> AudioError {
    match e {
        embedded_sdmmc::Error::NotFound => AudioError::NotFound,
        _ => AudioError::Storage,
    }
}

/// Split `dir/name` into its directory (if any) and file name
fn split_path(path: &str) -> (Option<&str>, &str) {
    match path.rsplit_once('/') {
        Some((dir, name)) if !dir.is_empty() => (Some(dir), name),
        Some((_, name)) => (None, name),
        None => (None, path),
    }
}

impl Player {
    /// Take ownership of an initialised card and the I2S output
    pub fn new(
        card: Card,
        i2s: PioI2sOut<'static, PIO0, 0>,
        common: Common<'static, PIO0>,
        front: &'static mut [u32; BLOCK_FRAMES],
        back: &'static mut [u32; BLOCK_FRAMES],
    ) -> Self {
        Self {
            volumes: VolumeManager::new(card, FixedTime),
            volume: None,
            clip: None,
            i2s,
            _common: common,
            front,
            back,
            pending: None,
        }
    }

    /// Serve commands forever
    pub async fn run(&mut self) -> ! {
        loop {
            let command = match self.pending.take() {
                Some(command) => command,
                None => AUDIO_CMD.receive().await,
            };
            match command {
                AudioCommand::Exists { seq, path } => {
                    let found = self.exists(&path);
                    AUDIO_REPLY.signal(Reply {
                        seq,
                        reply: AudioReply::Exists(found),
                    });
                }
                AudioCommand::Open { seq, path } => {
                    let result = self.open(&path);
                    if let Err(e) = result {
                        debug!("Cannot open {}: {}", path.as_str(), e);
                    }
                    AUDIO_REPLY.signal(Reply {
                        seq,
                        reply: AudioReply::Opened(result),
                    });
                }
                AudioCommand::Play => self.play().await,
                AudioCommand::Stop => PLAYING.store(false, Ordering::Release),
            }
        }
    }

    /// Mount the first FAT volume if it is not mounted yet
    fn mount(&mut self) -> Result<RawVolume, AudioError> {
        if let Some(volume) = self.volume {
            return Ok(volume);
        }
        match self.volumes.open_raw_volume(VolumeIdx(0)) {
            Ok(volume) => {
                info!("SD card mounted");
                self.volume = Some(volume);
                Ok(volume)
            }
            Err(e) => {
                warn!("SD card mount failed: {}", defmt::Debug2Format(&e));
                Err(AudioError::Storage)
            }
        }
    }

    /// Forget the mount so the next request retries it
    fn unmount(&mut self) {
        self.close_clip();
        if let Some(volume) = self.volume.take() {
            let _ = self.volumes.close_volume(volume);
        }
    }

    /// Open the directory part of `path`, or the root
    fn open_parent(&mut self, volume: RawVolume, dir: Option<&str>) -> Result<RawDirectory, AudioError> {
        let root = self.volumes.open_root_dir(volume).map_err(audio_error)?;
        let Some(dir) = dir else {
            return Ok(root);
        };
        let opened = self.volumes.open_dir(root, dir).map_err(audio_error);
        let _ = self.volumes.close_dir(root);
        opened
    }

    fn exists(&mut self, path: &str) -> bool {
        let Ok(volume) = self.mount() else {
            return false;
        };
        let (dir, name) = split_path(path);
        let parent = match self.open_parent(volume, dir) {
            Ok(parent) => parent,
            Err(AudioError::NotFound) => return false,
            Err(_) => {
                self.unmount();
                return false;
            }
        };
        let found = self.volumes.find_directory_entry(parent, name).is_ok();
        let _ = self.volumes.close_dir(parent);
        found
    }

    fn open(&mut self, path: &str) -> Result<(), AudioError> {
        self.close_clip();
        let volume = self.mount()?;
        let (dir, name) = split_path(path);

        let parent = self.open_parent(volume, dir).inspect_err(|e| {
            if *e == AudioError::Storage {
                self.unmount();
            }
        })?;
        let file = self.volumes.open_file_in_dir(parent, name, Mode::ReadOnly);
        let _ = self.volumes.close_dir(parent);
        let file = file.map_err(audio_error)?;

        match self.read_header(file) {
            Ok(header) => {
                debug!(
                    "Opened {}: {} Hz, {} ch, {} ms",
                    path,
                    header.format.sample_rate,
                    header.format.channels,
                    header.duration_ms()
                );
                self.clip = Some(OpenClip { file, header });
                Ok(())
            }
            Err(e) => {
                let _ = self.volumes.close_file(file);
                Err(e)
            }
        }
    }

    fn read_header(&mut self, file: RawFile) -> Result<WavHeader, AudioError> {
        let mut window = [0u8; HEADER_WINDOW];
        let mut filled = 0;
        while filled < window.len() {
            match self.volumes.read(file, &mut window[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) => return Err(audio_error(e)),
            }
        }
        let header = parse_header(&window[..filled]).map_err(|e| {
            debug!("Not a playable clip: {}", e);
            AudioError::Unsupported
        })?;
        self.volumes
            .file_seek_from_start(file, header.data_offset)
            .map_err(audio_error)?;
        Ok(header)
    }

    fn close_clip(&mut self) {
        if let Some(clip) = self.clip.take() {
            let _ = self.volumes.close_file(clip.file);
        }
    }

    /// Stream the opened clip until it ends or another command arrives
    async fn play(&mut self) {
        let Some(clip) = self.clip.take() else {
            PLAYING.store(false, Ordering::Release);
            return;
        };

        let mut stream = ClipStream::new(&clip.header, OUTPUT_RATE);
        let Self {
            volumes,
            i2s,
            front,
            back,
            pending,
            ..
        } = self;
        let file = clip.file;
        let mut read = |buf: &mut [u8]| volumes.read(file, buf).unwrap_or(0);

        let mut frames = stream.fill(&mut read, &mut front[..]);
        while frames > 0 {
            front[frames..].fill(0);
            let transfer = i2s.write(&front[..]);
            let next = stream.fill(&mut read, &mut back[..]);
            transfer.await;
            core::mem::swap(front, back);
            frames = next;

            if let Ok(command) = AUDIO_CMD.try_receive() {
                if !matches!(command, AudioCommand::Stop) {
                    *pending = Some(command);
                }
                break;
            }
        }

        // Trailing silence so the amplifier does not hold the last sample
        front.fill(0);
        i2s.write(&front[..]).await;

        let _ = self.volumes.close_file(file);
        PLAYING.store(false, Ordering::Release);
    }
}

/// Core 1 task owning the player
#[embassy_executor::task]
pub async fn audio_task(mut player: Player) {
    info!("Audio player running on core 1");
    player.run().await
}

