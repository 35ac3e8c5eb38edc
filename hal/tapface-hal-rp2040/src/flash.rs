//! Flash storage driver for RP2040
//!
//! Wear-leveled key-value storage in the last 64KB of flash, holding the
//! interaction count and an optional configuration override. `memory.x`
//! keeps the firmware image out of this range.

use embassy_rp::dma::Channel;
use embassy_rp::flash::{Async, Flash, ERASE_SIZE};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;
use embedded_storage_async::nor_flash::NorFlash;
use sequential_storage::cache::NoCache;
use sequential_storage::map;

pub use tapface_hal::flash::{FlashError, StorageKey};

/// 2MB flash on the Pico
pub const FLASH_SIZE: usize = 2 * 1024 * 1024;
pub const STORE_PARTITION_SIZE: usize = 64 * 1024;
pub const STORE_PARTITION_START: usize = FLASH_SIZE - STORE_PARTITION_SIZE;

/// Largest stored item (the configuration override)
pub const MAX_ITEM_SIZE: usize = 2048;

/// Item buffer: payload plus key and item header
const ITEM_BUFFER_SIZE: usize = MAX_ITEM_SIZE + 32;

const _: () = assert!(STORE_PARTITION_SIZE % ERASE_SIZE == 0);

/// Flash range for the store partition
pub const STORE_RANGE: core::ops::Range<u32> = (STORE_PARTITION_START as u32)..(FLASH_SIZE as u32);

/// RP2040 flash key-value store
pub struct Rp2040FlashStorage<'d> {
    flash: Flash<'d, FLASH, Async, FLASH_SIZE>,
}

impl<'d> Rp2040FlashStorage<'d> {
    pub fn new(flash: Peri<'d, FLASH>, dma: Peri<'d, impl Channel>) -> Self {
        Self {
            flash: Flash::new(flash, dma),
        }
    }

    /// Unique ID of the flash chip, used to salt the random seed
    pub fn unique_id(&mut self) -> Option<u64> {
        let mut id = [0u8; 8];
        self.flash.blocking_unique_id(&mut id).ok()?;
        Some(u64::from_le_bytes(id))
    }
}

impl tapface_hal::FlashStorage for Rp2040FlashStorage<'_> {
    async fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
        let mut item_buffer = [0u8; ITEM_BUFFER_SIZE];

        let result = map::fetch_item::<StorageKey, &[u8], _>(
            &mut self.flash,
            STORE_RANGE,
            &mut NoCache::new(),
            &mut item_buffer,
            &key,
        )
        .await;

        match result {
            Ok(Some(data)) => {
                let len = data.len();
                if buffer.len() < len {
                    return Err(FlashError::BufferTooSmall);
                }
                buffer[..len].copy_from_slice(data);
                Ok(len)
            }
            Ok(None) => Err(FlashError::NotFound),
            Err(_) => Err(FlashError::Storage),
        }
    }

    async fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError> {
        if data.len() > MAX_ITEM_SIZE {
            return Err(FlashError::BufferTooSmall);
        }
        let mut item_buffer = [0u8; ITEM_BUFFER_SIZE];

        map::store_item(
            &mut self.flash,
            STORE_RANGE,
            &mut NoCache::new(),
            &mut item_buffer,
            &key,
            &data,
        )
        .await
        .map_err(|_| FlashError::Storage)
    }

    async fn erase_all(&mut self) -> Result<(), FlashError> {
        self.flash
            .erase(STORE_RANGE.start, STORE_RANGE.end)
            .await
            .map_err(|_| FlashError::Flash)
    }
}
