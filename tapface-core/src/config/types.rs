//! Configuration type definitions
//!
//! These types describe one device: panel geometry, timings, battery
//! model, sound clips, pads and the idle texts. `Default` is the stock
//! five-pad build; the firmware overrides it from `device.toml`.

use core::fmt::Write;

use heapless::{String, Vec};
use tapface_display::{Expression, Eye};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum number of touch pads
pub const MAX_PADS: usize = 8;

/// Maximum length of a clip file name or directory (8.3 names fit)
pub const MAX_NAME_LEN: usize = 16;

/// Maximum length of a pad label
pub const MAX_LABEL_LEN: usize = 16;

/// Maximum length of a chatter or easter egg message
pub const MAX_MESSAGE_LEN: usize = 24;

/// Maximum number of chatter messages
pub const MAX_MESSAGES: usize = 24;

/// Maximum easter egg sequence length
pub const MAX_SECRET_LEN: usize = 8;

/// Maximum number of counter milestones
pub const MAX_MILESTONES: usize = 8;

/// Maximum length of a joined `dir/file` asset path
pub const MAX_PATH_LEN: usize = 2 * MAX_NAME_LEN + 1;

/// Full asset path handed to the audio engine
pub type AssetPath = String<MAX_PATH_LEN>;

/// Copy `text` into a fixed-capacity string, dropping what does not fit
pub fn truncated<const N: usize>(text: &str) -> String<N> {
    let mut out = String::new();
    for ch in text.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

/// Character panel wiring and geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisplayConfig {
    /// Columns
    pub cols: u8,
    /// Rows
    pub rows: u8,
    /// 7-bit I2C address of the PCF8574 backpack
    pub i2c_address: u8,
    /// I2C clock in Hz
    pub i2c_frequency: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            cols: 20,
            rows: 4,
            i2c_address: 0x27,
            i2c_frequency: 50_000,
        }
    }
}

/// Loop timings, all in milliseconds unless noted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimingConfig {
    /// Idle time before going to sleep
    pub sleep_after_ms: u32,
    /// How long the sleeping face is held before pulsing starts
    pub sleep_message_ms: u32,
    /// Backlight pulse period while asleep
    pub sleep_pulse_ms: u32,
    /// Share of the pulse period with the backlight on (percent)
    pub sleep_pulse_on_pct: u8,
    /// Pause after each handled pad press
    pub cooldown_ms: u32,
    /// Wait for the pad to be released before scanning again
    pub release_required: bool,
    /// Upper bound on the release wait
    pub release_timeout_ms: u32,
    /// Pad must read high this long to fire
    pub debounce_ms: u32,
    /// Countdown window before sleep
    pub countdown_show_ms: u32,
    /// Button hold that powers the device off
    pub power_off_hold_ms: u32,
    /// Celebration dwell (easter egg, milestones)
    pub celebration_ms: u32,
    /// Boot and power-off message dwell
    pub message_ms: u32,
    /// "Missing file" dwell
    pub missing_file_ms: u32,
    /// Amplifier settle time around playback
    pub amp_settle_ms: u32,
    /// Low battery warning toggle period
    pub low_battery_flash_ms: u32,
    /// Pause after handling a short button press
    pub button_pause_ms: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            sleep_after_ms: 300_000,
            sleep_message_ms: 2_000,
            sleep_pulse_ms: 2_500,
            sleep_pulse_on_pct: 40,
            cooldown_ms: 1_000,
            release_required: true,
            release_timeout_ms: 5_000,
            debounce_ms: 80,
            countdown_show_ms: 60_000,
            power_off_hold_ms: 5_000,
            celebration_ms: 3_000,
            message_ms: 2_000,
            missing_file_ms: 1_200,
            amp_settle_ms: 150,
            low_battery_flash_ms: 2_000,
            button_pause_ms: 200,
        }
    }
}

/// Linear LiPo model behind a resistor divider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BatteryConfig {
    /// Cell voltage reported as 100 %
    pub full_mv: u16,
    /// Cell voltage reported as 0 %
    pub empty_mv: u16,
    /// Divider ratio between the cell and the ADC pin
    pub divider: u8,
    /// ADC reference voltage
    pub vref_mv: u16,
    /// Raw reading at `vref_mv`
    pub adc_max: u16,
    /// Cache lifetime of a reading
    pub update_ms: u32,
    /// Warning threshold (inclusive)
    pub low_pct: u8,
    /// Power-off threshold (inclusive)
    pub critical_pct: u8,
    /// Samples averaged per reading
    pub samples: u8,
    /// Gap between samples
    pub sample_gap_ms: u32,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            full_mv: 4_200,
            empty_mv: 3_200,
            divider: 3,
            vref_mv: 3_300,
            adc_max: 4_095,
            update_ms: 30_000,
            low_pct: 15,
            critical_pct: 5,
            samples: 5,
            sample_gap_ms: 1,
        }
    }
}

/// Clip locations on the card
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SoundsConfig {
    /// Directory holding every clip
    pub dir: String<MAX_NAME_LEN>,
    /// Played at boot and wake when present
    pub boot: String<MAX_NAME_LEN>,
    /// Arm confirmation clip
    pub arm: String<MAX_NAME_LEN>,
    /// Face label while the arm clip plays
    pub arm_label: String<MAX_LABEL_LEN>,
}

impl Default for SoundsConfig {
    fn default() -> Self {
        Self {
            dir: truncated("SOUNDS"),
            boot: truncated("BOOT.WAV"),
            arm: truncated("STARTBTN.WAV"),
            arm_label: truncated("Start Button"),
        }
    }
}

/// One touch pad
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PadConfig {
    /// Name used in logs
    pub label: String<MAX_LABEL_LEN>,
    /// Clip file inside [`SoundsConfig::dir`]
    pub file: String<MAX_NAME_LEN>,
    /// Face shown while the clip plays; `None` keeps the idle animation
    pub expression: Option<Expression>,
}

impl PadConfig {
    fn stock(label: &str, file: &str, expression: Expression) -> Self {
        Self {
            label: truncated(label),
            file: truncated(file),
            expression: Some(expression),
        }
    }
}

/// Idle chatter
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChatterConfig {
    /// Dwell per message
    pub interval_ms: u32,
    /// Rotation, also the pool for playback labels
    pub messages: Vec<String<MAX_MESSAGE_LEN>, MAX_MESSAGES>,
}

const STOCK_MESSAGES: [&str; 20] = [
    "Planet B? Nope.",
    "Act now or swim later",
    "Cool it. Literally.",
    "Fossil fools beware",
    "The sea is rising...",
    "Earth: Handle w/care",
    "Less talk more trees",
    "Your ice caps called",
    "Compost happens",
    "Skip the straw",
    "Trees > Tweets",
    "Go green or go home",
    "Think global act now",
    "Carbon who? Footwhat",
    "Recycle this thought",
    "Hug a tree today",
    "Be the change. Now.",
    "Save water. Drink tea",
    "Reduce. Reuse. Relax",
    "Earth called. Pick up",
];

impl Default for ChatterConfig {
    fn default() -> Self {
        let mut messages = Vec::new();
        for message in STOCK_MESSAGES {
            let _ = messages.push(truncated(message));
        }
        Self {
            interval_ms: 60_000,
            messages,
        }
    }
}

/// Secret pad combination
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EggConfig {
    /// Pad indices in press order; empty disables the egg
    pub sequence: Vec<u8, MAX_SECRET_LEN>,
    /// Celebration text
    pub message: String<MAX_MESSAGE_LEN>,
}

impl Default for EggConfig {
    fn default() -> Self {
        let mut sequence = Vec::new();
        for pad in [0, 2, 4] {
            let _ = sequence.push(pad);
        }
        Self {
            sequence,
            message: truncated("You found the secret!"),
        }
    }
}

/// Interaction counter persistence
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CounterConfig {
    /// Unsaved increments that force a write
    pub flush_threshold: u8,
    /// Stored values above this load as zero
    pub ceiling: u32,
    /// Counts that get a celebration
    pub milestones: Vec<u32, MAX_MILESTONES>,
}

impl Default for CounterConfig {
    fn default() -> Self {
        let mut milestones = Vec::new();
        for count in [50, 100, 200, 500, 1000] {
            let _ = milestones.push(count);
        }
        Self {
            flush_threshold: 10,
            ceiling: 1_000_000,
            milestones,
        }
    }
}

/// Complete device configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceConfig {
    pub display: DisplayConfig,
    pub timing: TimingConfig,
    pub battery: BatteryConfig,
    pub sounds: SoundsConfig,
    pub pads: Vec<PadConfig, MAX_PADS>,
    pub chatter: ChatterConfig,
    pub egg: EggConfig,
    pub counter: CounterConfig,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        let mut pads = Vec::new();
        for pad in [
            PadConfig::stock("StartUp", "STARTUP.WAV", Expression::Symmetric(Eye::Surprised)),
            PadConfig::stock("Tip2", "TIP2.WAV", Expression::Symmetric(Eye::Center)),
            PadConfig::stock("Tip3", "TIP3.WAV", Expression::Symmetric(Eye::Happy)),
            PadConfig::stock("Tip4", "TIP4.WAV", Expression::Asymmetric(Eye::Center, Eye::WinkShut)),
            PadConfig::stock("Tip5", "TIP5.WAV", Expression::Symmetric(Eye::Surprised)),
        ] {
            let _ = pads.push(pad);
        }
        Self {
            display: DisplayConfig::default(),
            timing: TimingConfig::default(),
            battery: BatteryConfig::default(),
            sounds: SoundsConfig::default(),
            pads,
            chatter: ChatterConfig::default(),
            egg: EggConfig::default(),
            counter: CounterConfig::default(),
        }
    }
}

impl DeviceConfig {
    /// `dir/file` for a clip in the sounds directory
    pub fn asset_path(&self, file: &str) -> AssetPath {
        let mut path = AssetPath::new();
        if self.sounds.dir.is_empty() {
            let _ = path.push_str(file);
        } else {
            let _ = write!(path, "{}/{}", self.sounds.dir, file);
        }
        path
    }

    /// Path of the boot clip
    pub fn boot_path(&self) -> AssetPath {
        self.asset_path(&self.sounds.boot)
    }

    /// Path of the arm confirmation clip
    pub fn arm_path(&self) -> AssetPath {
        self.asset_path(&self.sounds.arm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_config() {
        let config = DeviceConfig::default();
        assert_eq!(config.pads.len(), 5);
        assert_eq!(config.chatter.messages.len(), 20);
        assert_eq!(config.egg.sequence.as_slice(), &[0, 2, 4]);
        assert_eq!(config.counter.milestones.as_slice(), &[50, 100, 200, 500, 1000]);
        assert_eq!(
            config.pads[3].expression,
            Some(Expression::Asymmetric(Eye::Center, Eye::WinkShut))
        );
    }

    #[test]
    fn test_stock_messages_fit_the_panel() {
        for message in STOCK_MESSAGES {
            assert!(message.len() <= 21, "{message}");
            assert_eq!(truncated::<MAX_MESSAGE_LEN>(message).as_str(), message);
        }
    }

    #[test]
    fn test_asset_paths() {
        let mut config = DeviceConfig::default();
        assert_eq!(config.boot_path().as_str(), "SOUNDS/BOOT.WAV");
        assert_eq!(config.arm_path().as_str(), "SOUNDS/STARTBTN.WAV");
        config.sounds.dir.clear();
        assert_eq!(config.asset_path("TIP2.WAV").as_str(), "TIP2.WAV");
    }

    #[test]
    fn test_truncated_drops_overflow() {
        assert_eq!(truncated::<4>("abcdef").as_str(), "abcd");
    }
}
