//! Persistent interaction counter
//!
//! Counts handled pad presses across power cycles. Writes are batched:
//! the count is persisted every `flush_threshold` increments and whenever
//! the device sleeps or powers off.

use crate::config::CounterConfig;
use crate::traits::{NvRegion, StoreError};

/// Interaction counter backed by a four-byte region
pub struct InteractionCounter<N> {
    store: N,
    config: CounterConfig,
    count: u32,
    pending: u8,
}

impl<N: NvRegion> InteractionCounter<N> {
    pub fn new(store: N, config: CounterConfig) -> Self {
        Self {
            store,
            config,
            count: 0,
            pending: 0,
        }
    }

    /// Read the stored count
    ///
    /// Unreadable regions and values above the ceiling (erased flash reads
    /// as `0xFFFF_FFFF`) load as zero.
    pub fn load(&mut self) -> u32 {
        let stored = self.store.read().map(u32::from_le_bytes).unwrap_or(0);
        self.count = if stored > self.config.ceiling { 0 } else { stored };
        self.pending = 0;
        self.count
    }

    /// Count one interaction, persisting when enough have accumulated
    ///
    /// The count advances even when the batched write fails; `pending` is
    /// zeroed either way so the next batch retries.
    pub fn increment(&mut self) -> Result<(), StoreError> {
        self.count = self.count.saturating_add(1);
        self.pending = self.pending.saturating_add(1);
        if self.pending >= self.config.flush_threshold {
            return self.flush();
        }
        Ok(())
    }

    /// Persist the count now
    pub fn flush(&mut self) -> Result<(), StoreError> {
        self.pending = 0;
        self.store.write(self.count.to_le_bytes())
    }

    /// Whether `count` earns a celebration
    pub fn is_milestone(&self, count: u32) -> bool {
        self.config.milestones.contains(&count)
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Increments not yet persisted
    pub fn pending(&self) -> u8 {
        self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Journal, MockStore};

    fn counter(stored: Option<u32>) -> (InteractionCounter<MockStore>, MockStore) {
        let store = MockStore::new(stored, Journal::default());
        let handle = store.clone();
        (InteractionCounter::new(store, CounterConfig::default()), handle)
    }

    #[test]
    fn test_load_sanitizes() {
        let (mut c, _) = counter(Some(42));
        assert_eq!(c.load(), 42);

        let (mut c, _) = counter(Some(1_000_000));
        assert_eq!(c.load(), 1_000_000);

        let (mut c, _) = counter(Some(1_000_001));
        assert_eq!(c.load(), 0);

        let (mut c, _) = counter(Some(u32::MAX));
        assert_eq!(c.load(), 0);

        let (mut c, _) = counter(None);
        assert_eq!(c.load(), 0);
    }

    #[test]
    fn test_flushes_every_tenth_increment() {
        let (mut c, store) = counter(Some(7));
        c.load();
        for _ in 0..9 {
            c.increment().unwrap();
        }
        assert_eq!(store.writes(), 0);
        assert_eq!(store.value(), Some(7));
        assert_eq!(c.pending(), 9);

        c.increment().unwrap();
        assert_eq!(c.count(), 17);
        assert_eq!(store.writes(), 1);
        assert_eq!(store.value(), Some(17));
        assert_eq!(c.pending(), 0);
    }

    #[test]
    fn test_flush_forces_write() {
        let (mut c, store) = counter(None);
        c.load();
        c.increment().unwrap();
        assert!(c.flush().is_ok());
        assert_eq!(store.value(), Some(1));
        assert_eq!(c.pending(), 0);
    }

    #[test]
    fn test_write_failure_is_reported() {
        let (mut c, store) = counter(None);
        store.fail_writes(true);
        c.increment().unwrap();
        assert_eq!(c.flush(), Err(StoreError::Io));
        assert_eq!(c.pending(), 0);
        assert_eq!(c.count(), 1);
    }

    #[test]
    fn test_batched_write_failure_still_counts() {
        let (mut c, store) = counter(Some(0));
        c.load();
        store.fail_writes(true);
        for _ in 0..9 {
            c.increment().unwrap();
        }
        assert_eq!(c.increment(), Err(StoreError::Io));
        assert_eq!(c.count(), 10);
        assert_eq!(c.pending(), 0);
    }

    #[test]
    fn test_milestones() {
        let (c, _) = counter(None);
        assert!(!c.is_milestone(49));
        assert!(c.is_milestone(50));
        assert!(!c.is_milestone(51));
        assert!(c.is_milestone(1000));
        assert!(!c.is_milestone(0));
    }
}
