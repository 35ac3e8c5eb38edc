//! Battery monitor
//!
//! Averages a few ADC samples into a charge percentage through a linear
//! cell model, caches the result for the refresh interval and classifies
//! it against the low and critical cutoffs.

use crate::config::BatteryConfig;
use crate::traits::{BatterySensor, Clock, SensorError};

/// Charge classification, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BatteryLevel {
    /// At or below the critical cutoff
    Critical,
    /// At or below the low cutoff
    Low,
    /// Above both cutoffs, or no valid reading yet
    Normal,
}

/// Convert an averaged raw reading to a percentage in `0..=100`
pub fn percent_for_raw(config: &BatteryConfig, raw: u16) -> u8 {
    let adc_max = u64::from(config.adc_max.max(1));
    let cell_mv = (u64::from(raw) * u64::from(config.vref_mv) * u64::from(config.divider) / adc_max) as i64;
    let span = i64::from(config.full_mv) - i64::from(config.empty_mv);
    if span <= 0 {
        return 0;
    }
    let pct = (cell_mv - i64::from(config.empty_mv)) * 100 / span;
    pct.clamp(0, 100) as u8
}

/// Cached battery reader
pub struct BatteryMonitor<S> {
    sensor: S,
    config: BatteryConfig,
    percent: Option<u8>,
    sampled_at_ms: Option<u64>,
    last_fault: Option<SensorError>,
}

impl<S: BatterySensor> BatteryMonitor<S> {
    pub fn new(sensor: S, config: BatteryConfig) -> Self {
        Self {
            sensor,
            config,
            percent: None,
            sampled_at_ms: None,
            last_fault: None,
        }
    }

    /// Current charge, sampling the sensor when the cache has expired
    ///
    /// A failed sample keeps the previous value; `None` means no sample
    /// has ever succeeded.
    pub fn read_percent<C: Clock>(&mut self, clock: &mut C) -> Option<u8> {
        let now = clock.now_ms();
        let fresh = self
            .sampled_at_ms
            .is_some_and(|at| now.saturating_sub(at) < u64::from(self.config.update_ms));
        if fresh {
            return self.percent;
        }

        self.sampled_at_ms = Some(now);
        match self.sample(clock) {
            Ok(raw) => {
                self.percent = Some(percent_for_raw(&self.config, raw));
                self.last_fault = None;
            }
            Err(e) => self.last_fault = Some(e),
        }
        self.percent
    }

    /// Classify the current charge, critical first
    pub fn check_threshold<C: Clock>(&mut self, clock: &mut C) -> BatteryLevel {
        match self.read_percent(clock) {
            Some(pct) if pct <= self.config.critical_pct => BatteryLevel::Critical,
            Some(pct) if pct <= self.config.low_pct => BatteryLevel::Low,
            _ => BatteryLevel::Normal,
        }
    }

    /// Last cached value without sampling
    pub fn cached_percent(&self) -> Option<u8> {
        self.percent
    }

    /// Error from the most recent refresh, if it failed
    pub fn last_fault(&self) -> Option<SensorError> {
        self.last_fault
    }

    fn sample<C: Clock>(&mut self, clock: &mut C) -> Result<u16, SensorError> {
        let samples = self.config.samples.max(1);
        let mut total: u32 = 0;
        for i in 0..samples {
            total += u32::from(self.sensor.read_raw()?);
            if i + 1 < samples {
                clock.delay_ms(self.config.sample_gap_ms);
            }
        }
        Ok((total / u32::from(samples)) as u16)
    }
}
