//! Persistent storage on flash
//!
//! The interaction counter lives under its own key in the wear-leveled
//! key-value store. The control loop is synchronous, and a flash operation
//! on this board runs to completion without yielding, so the async storage
//! API is driven with `block_on`.

use embassy_futures::block_on;
use tapface_core::traits::{NvRegion, StoreError};
use tapface_hal::{FlashError, FlashStorage, StorageKey};

fn store_error(e: FlashError) -> StoreError {
    match e {
        FlashError::NotFound => StoreError::Empty,
        FlashError::Flash | FlashError::Storage | FlashError::BufferTooSmall => StoreError::Io,
    }
}

/// The interaction count as a four-byte flash item
pub struct FlashCounterRegion<F> {
    flash: F,
}

impl<F: FlashStorage> FlashCounterRegion<F> {
    pub fn new(flash: F) -> Self {
        Self { flash }
    }

    /// Borrow the store for other keys
    pub fn flash(&mut self) -> &mut F {
        &mut self.flash
    }
}

impl<F: FlashStorage> NvRegion for FlashCounterRegion<F> {
    fn read(&mut self) -> Result<[u8; 4], StoreError> {
        let mut bytes = [0u8; 4];
        let len = block_on(self.flash.read(StorageKey::InteractionCount, &mut bytes)).map_err(store_error)?;
        if len != bytes.len() {
            return Err(StoreError::Io);
        }
        Ok(bytes)
    }

    fn write(&mut self, bytes: [u8; 4]) -> Result<(), StoreError> {
        block_on(self.flash.write(StorageKey::InteractionCount, &bytes)).map_err(store_error)
    }
}

/// Read the configuration override text, if one was stored
///
/// Returns `Ok(None)` when nothing is stored or the bytes are not UTF-8.
pub async fn read_config_text<'a, F: FlashStorage>(
    flash: &mut F,
    buffer: &'a mut [u8],
) -> Result<Option<&'a str>, FlashError> {
    match flash.read(StorageKey::DeviceConfigToml, buffer).await {
        Ok(len) => Ok(buffer.get(..len).and_then(|b| core::str::from_utf8(b).ok())),
        Err(FlashError::NotFound) => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MockFlash {
        items: HashMap<u8, std::vec::Vec<u8>>,
        broken: bool,
        writes: usize,
    }

    impl FlashStorage for MockFlash {
        async fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
            if self.broken {
                return Err(FlashError::Flash);
            }
            let item = self.items.get(&key.as_u8()).ok_or(FlashError::NotFound)?;
            if item.len() > buffer.len() {
                return Err(FlashError::BufferTooSmall);
            }
            buffer[..item.len()].copy_from_slice(item);
            Ok(item.len())
        }

        async fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError> {
            if self.broken {
                return Err(FlashError::Storage);
            }
            self.writes += 1;
            self.items.insert(key.as_u8(), data.to_vec());
            Ok(())
        }

        async fn erase_all(&mut self) -> Result<(), FlashError> {
            self.items.clear();
            Ok(())
        }
    }

    #[test]
    fn test_empty_region() {
        let mut region = FlashCounterRegion::new(MockFlash::default());
        assert_eq!(region.read(), Err(StoreError::Empty));
    }

    #[test]
    fn test_write_then_read() {
        let mut region = FlashCounterRegion::new(MockFlash::default());
        region.write(49u32.to_le_bytes()).unwrap();
        assert_eq!(region.read().map(u32::from_le_bytes), Ok(49));
        assert_eq!(region.flash().writes, 1);
    }

    #[test]
    fn test_wrong_length_is_io() {
        let mut flash = MockFlash::default();
        flash.items.insert(StorageKey::InteractionCount.as_u8(), vec![1, 2]);
        let mut region = FlashCounterRegion::new(flash);
        assert_eq!(region.read(), Err(StoreError::Io));
    }

    #[test]
    fn test_flash_failure_is_io() {
        let mut region = FlashCounterRegion::new(MockFlash {
            broken: true,
            ..Default::default()
        });
        assert_eq!(region.read(), Err(StoreError::Io));
        assert_eq!(region.write([0; 4]), Err(StoreError::Io));
    }

    #[test]
    fn test_config_text() {
        let mut flash = MockFlash::default();
        let mut buffer = [0u8; 64];
        assert_eq!(block_on(read_config_text(&mut flash, &mut buffer)), Ok(None));

        flash
            .items
            .insert(StorageKey::DeviceConfigToml.as_u8(), b"[egg]\nsequence = [1, 2]\n".to_vec());
        let text = block_on(read_config_text(&mut flash, &mut buffer)).unwrap();
        assert_eq!(text, Some("[egg]\nsequence = [1, 2]\n"));
    }

    #[test]
    fn test_config_text_rejects_binary() {
        let mut flash = MockFlash::default();
        flash.items.insert(StorageKey::DeviceConfigToml.as_u8(), vec![0xFF, 0xFE]);
        let mut buffer = [0u8; 8];
        assert_eq!(block_on(read_config_text(&mut flash, &mut buffer)), Ok(None));
    }
}
