//! Configuration loading
//!
//! A `device.toml` stored in flash overrides the one compiled into the
//! image. If neither parses, the stock configuration is used.

use defmt::*;

use tapface_core::config::{parse_config, DeviceConfig};
use tapface_drivers::storage::read_config_text;
use tapface_hal::FlashStorage;

/// Embedded default configuration (compiled into firmware)
/// Edit device.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../device.toml");

/// Largest configuration text read from flash
const MAX_TOML_SIZE: usize = 2048;

/// Where the running configuration came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigSource {
    Flash,
    Embedded,
    Defaults,
}

/// Load the configuration, trying flash first
pub async fn load_config<F: FlashStorage>(flash: &mut F) -> (DeviceConfig, ConfigSource) {
    let mut buffer = [0u8; MAX_TOML_SIZE];

    match read_config_text(flash, &mut buffer).await {
        Ok(Some(text)) => match parse_config(text) {
            Ok(config) => return (config, ConfigSource::Flash),
            Err(e) => warn!("Stored configuration invalid ({}), ignoring it", e),
        },
        Ok(None) => debug!("No configuration in flash"),
        Err(e) => warn!("Failed to read configuration from flash: {}", e),
    }

    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => (config, ConfigSource::Embedded),
        Err(e) => {
            // Only reachable if device.toml slipped past build validation
            error!("Failed to parse embedded config: {}", e);
            (DeviceConfig::default(), ConfigSource::Defaults)
        }
    }
}
