//! Simple TOML parser for device configuration
//!
//! This is a minimal, allocation-free parser for the subset of TOML used
//! by `device.toml`. It does NOT support the full TOML language.
//!
//! Supported features:
//! - Key = value pairs (string, integer, boolean)
//! - Single-line arrays of strings or integers
//! - [section] headers and [pad.<name>] headers
//! - Comments (# ...)
//!
//! NOT supported:
//! - Multi-line strings or arrays
//! - Inline tables
//! - Dotted keys outside section headers
//!
//! Keys that are not recognised are ignored. Every value starts from
//! [`DeviceConfig::default`]; the first `[pad.*]` section replaces the
//! stock pad list.

use heapless::{String, Vec};
use tapface_display::{Expression, Eye};

use super::types::{truncated, DeviceConfig, PadConfig, MAX_LABEL_LEN};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Invalid or unknown section header
    InvalidSection,
    /// Value of the wrong type or out of range
    InvalidValue,
    /// Too many items (exceeded heapless capacity)
    TooManyItems,
}

/// Current parsing context
#[derive(Debug, Clone)]
enum Section {
    Root,
    Display,
    Timing,
    Battery,
    Sounds,
    Chatter,
    Egg,
    Counter,
    Pad(String<MAX_LABEL_LEN>),
}

/// Parse TOML text into a [`DeviceConfig`]
pub fn parse_config(input: &str) -> Result<DeviceConfig, ParseError> {
    let mut config = DeviceConfig::default();
    let mut section = Section::Root;
    let mut current_pad: Option<PadConfig> = None;
    let mut custom_pads = false;

    for line in input.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            save_section(&mut config, &mut current_pad)?;
            section = parse_section_header(&line[1..line.len() - 1])?;

            if let Section::Pad(name) = &section {
                if !custom_pads {
                    config.pads.clear();
                    custom_pads = true;
                }
                current_pad = Some(PadConfig {
                    label: name.clone(),
                    file: String::new(),
                    expression: None,
                });
            }
            continue;
        }

        if let Some((key, value)) = parse_key_value(line) {
            apply_value(&section, key, value, &mut config, &mut current_pad)?;
        }
    }

    save_section(&mut config, &mut current_pad)?;
    validate(&config)?;
    Ok(config)
}

/// Reject combinations the loop cannot work with
fn validate(config: &DeviceConfig) -> Result<(), ParseError> {
    let b = &config.battery;
    if b.full_mv <= b.empty_mv || b.samples == 0 || b.adc_max == 0 || b.divider == 0 {
        return Err(ParseError::InvalidValue);
    }
    if config.pads.is_empty() || config.display.cols == 0 || config.display.rows < 2 {
        return Err(ParseError::InvalidValue);
    }
    Ok(())
}

/// Parse a section header like "timing" or "pad.tip2"
fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    let header = header.trim();

    if let Some((kind, name)) = header.split_once('.') {
        if kind != "pad" || name.is_empty() || name.contains('.') {
            return Err(ParseError::InvalidSection);
        }
        let name = String::try_from(name).map_err(|_| ParseError::InvalidSection)?;
        return Ok(Section::Pad(name));
    }

    match header {
        "display" => Ok(Section::Display),
        "timing" => Ok(Section::Timing),
        "battery" => Ok(Section::Battery),
        "sounds" => Ok(Section::Sounds),
        "chatter" => Ok(Section::Chatter),
        "egg" => Ok(Section::Egg),
        "counter" => Ok(Section::Counter),
        _ => Err(ParseError::InvalidSection),
    }
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    // Strip a trailing comment that is not inside a string
    let mut in_string = false;
    let mut end = value.len();
    for (pos, ch) in value.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => {
                end = pos;
                break;
            }
            _ => {}
        }
    }
    let value = value[..end].trim();

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse a string value (removes quotes)
fn parse_string(value: &str) -> Result<&str, ParseError> {
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        Ok(&value[1..value.len() - 1])
    } else {
        // Allow unquoted strings for simple values
        Ok(value)
    }
}

/// Parse a quoted or bare string into a fixed-capacity string
fn parse_heapless<const N: usize>(value: &str) -> Result<String<N>, ParseError> {
    String::try_from(parse_string(value)?).map_err(|_| ParseError::InvalidValue)
}

/// Parse an integer value (underscores allowed)
fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    let mut digits: String<24> = String::new();
    for ch in value.chars().filter(|&c| c != '_') {
        digits.push(ch).map_err(|_| ParseError::InvalidValue)?;
    }
    digits.parse().map_err(|_| ParseError::InvalidValue)
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}

/// Call `f` on each item of a single-line array, splitting on commas
/// outside quotes
fn for_each_item<'a>(
    value: &'a str,
    mut f: impl FnMut(&'a str) -> Result<(), ParseError>,
) -> Result<(), ParseError> {
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .ok_or(ParseError::InvalidValue)?;

    let mut in_string = false;
    let mut start = 0;
    for (pos, ch) in inner.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            ',' if !in_string => {
                let item = inner[start..pos].trim();
                if !item.is_empty() {
                    f(item)?;
                }
                start = pos + 1;
            }
            _ => {}
        }
    }
    if in_string {
        return Err(ParseError::InvalidValue);
    }
    let item = inner[start..].trim();
    if !item.is_empty() {
        f(item)?;
    }
    Ok(())
}

/// Parse an integer array
fn parse_int_array<T: core::str::FromStr, const N: usize>(value: &str) -> Result<Vec<T, N>, ParseError> {
    let mut out = Vec::new();
    for_each_item(value, |item| {
        out.push(parse_int(item)?).map_err(|_| ParseError::TooManyItems)
    })?;
    Ok(out)
}

/// Parse an eye name
fn parse_eye(value: &str) -> Result<Eye, ParseError> {
    Eye::from_name(parse_string(value)?).ok_or(ParseError::InvalidValue)
}

/// Parse `"happy"`, `["center", "wink_shut"]` or `"idle"` (no override)
fn parse_expression(value: &str) -> Result<Option<Expression>, ParseError> {
    if value.starts_with('[') {
        let mut eyes: Vec<Eye, 2> = Vec::new();
        for_each_item(value, |item| {
            eyes.push(parse_eye(item)?).map_err(|_| ParseError::InvalidValue)
        })?;
        return match eyes.as_slice() {
            [eye] => Ok(Some(Expression::Symmetric(*eye))),
            [left, right] if left == right => Ok(Some(Expression::Symmetric(*left))),
            [left, right] => Ok(Some(Expression::Asymmetric(*left, *right))),
            _ => Err(ParseError::InvalidValue),
        };
    }
    if parse_string(value)? == "idle" {
        return Ok(None);
    }
    parse_eye(value).map(|eye| Some(Expression::Symmetric(eye)))
}

/// Apply a key-value pair to the current section
fn apply_value(
    section: &Section,
    key: &str,
    value: &str,
    config: &mut DeviceConfig,
    current_pad: &mut Option<PadConfig>,
) -> Result<(), ParseError> {
    match section {
        Section::Display => {
            let d = &mut config.display;
            match key {
                "cols" => d.cols = parse_int(value)?,
                "rows" => d.rows = parse_int(value)?,
                "i2c_address" | "address" => d.i2c_address = parse_address(value)?,
                "i2c_frequency" | "frequency" => d.i2c_frequency = parse_int(value)?,
                _ => {}
            }
        }
        Section::Timing => {
            let t = &mut config.timing;
            match key {
                "sleep_after_ms" => t.sleep_after_ms = parse_int(value)?,
                "sleep_message_ms" => t.sleep_message_ms = parse_int(value)?,
                "sleep_pulse_ms" => t.sleep_pulse_ms = parse_int(value)?,
                "sleep_pulse_on_pct" => {
                    t.sleep_pulse_on_pct = parse_int(value)?;
                    if t.sleep_pulse_on_pct > 100 {
                        return Err(ParseError::InvalidValue);
                    }
                }
                "cooldown_ms" => t.cooldown_ms = parse_int(value)?,
                "release_required" => t.release_required = parse_bool(value)?,
                "release_timeout_ms" => t.release_timeout_ms = parse_int(value)?,
                "debounce_ms" => t.debounce_ms = parse_int(value)?,
                "countdown_show_ms" => t.countdown_show_ms = parse_int(value)?,
                "power_off_hold_ms" => t.power_off_hold_ms = parse_int(value)?,
                "celebration_ms" => t.celebration_ms = parse_int(value)?,
                "message_ms" => t.message_ms = parse_int(value)?,
                "missing_file_ms" => t.missing_file_ms = parse_int(value)?,
                "amp_settle_ms" => t.amp_settle_ms = parse_int(value)?,
                "low_battery_flash_ms" => t.low_battery_flash_ms = parse_int(value)?,
                "button_pause_ms" => t.button_pause_ms = parse_int(value)?,
                _ => {}
            }
        }
        Section::Battery => {
            let b = &mut config.battery;
            match key {
                "full_mv" => b.full_mv = parse_int(value)?,
                "empty_mv" => b.empty_mv = parse_int(value)?,
                "divider" => b.divider = parse_int(value)?,
                "vref_mv" => b.vref_mv = parse_int(value)?,
                "adc_max" => b.adc_max = parse_int(value)?,
                "update_ms" => b.update_ms = parse_int(value)?,
                "low_pct" => b.low_pct = parse_int(value)?,
                "critical_pct" => b.critical_pct = parse_int(value)?,
                "samples" => b.samples = parse_int(value)?,
                "sample_gap_ms" => b.sample_gap_ms = parse_int(value)?,
                _ => {}
            }
        }
        Section::Sounds => {
            let s = &mut config.sounds;
            match key {
                "dir" => s.dir = parse_heapless(value)?,
                "boot" => s.boot = parse_heapless(value)?,
                "arm" => s.arm = parse_heapless(value)?,
                "arm_label" => s.arm_label = parse_heapless(value)?,
                _ => {}
            }
        }
        Section::Chatter => match key {
            "interval_ms" => config.chatter.interval_ms = parse_int(value)?,
            "messages" => {
                let messages = &mut config.chatter.messages;
                messages.clear();
                for_each_item(value, |item| {
                    let message = truncated(parse_string(item)?);
                    messages.push(message).map_err(|_| ParseError::TooManyItems)
                })?;
            }
            _ => {}
        },
        Section::Egg => match key {
            "sequence" => config.egg.sequence = parse_int_array(value)?,
            "message" => config.egg.message = truncated(parse_string(value)?),
            _ => {}
        },
        Section::Counter => {
            let c = &mut config.counter;
            match key {
                "flush_threshold" => {
                    c.flush_threshold = parse_int(value)?;
                    if c.flush_threshold == 0 {
                        return Err(ParseError::InvalidValue);
                    }
                }
                "ceiling" => c.ceiling = parse_int(value)?,
                "milestones" => c.milestones = parse_int_array(value)?,
                _ => {}
            }
        }
        Section::Pad(_) => {
            let p = current_pad.as_mut().ok_or(ParseError::InvalidSection)?;
            match key {
                "file" => p.file = parse_heapless(value)?,
                "label" => p.label = parse_heapless(value)?,
                "expression" => p.expression = parse_expression(value)?,
                _ => {}
            }
        }
        Section::Root => {}
    }

    Ok(())
}

/// Parse a decimal or `0x` hexadecimal I2C address
fn parse_address(value: &str) -> Result<u8, ParseError> {
    let value = parse_string(value)?;
    let address = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16).map_err(|_| ParseError::InvalidValue)?,
        None => parse_int(value)?,
    };
    if address > 0x7F {
        return Err(ParseError::InvalidValue);
    }
    Ok(address)
}

/// Push a finished pad section
fn save_section(config: &mut DeviceConfig, current_pad: &mut Option<PadConfig>) -> Result<(), ParseError> {
    if let Some(pad) = current_pad.take() {
        if pad.file.is_empty() {
            return Err(ParseError::InvalidValue);
        }
        config.pads.push(pad).map_err(|_| ParseError::TooManyItems)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_section_header() {
        assert!(matches!(parse_section_header("timing"), Ok(Section::Timing)));
        match parse_section_header("pad.tip2").unwrap() {
            Section::Pad(name) => assert_eq!(name.as_str(), "tip2"),
            _ => panic!("Wrong section type"),
        }
        assert_eq!(parse_section_header("stepper.x").unwrap_err(), ParseError::InvalidSection);
        assert_eq!(parse_section_header("pad.").unwrap_err(), ParseError::InvalidSection);
        assert_eq!(parse_section_header("lights").unwrap_err(), ParseError::InvalidSection);
    }

    #[test]
    fn test_parse_key_value_strips_comments() {
        assert_eq!(parse_key_value("a = 1 # one"), Some(("a", "1")));
        assert_eq!(parse_key_value(r##"m = "No #1" # c"##), Some(("m", r##""No #1""##)));
        assert_eq!(parse_key_value("a = # nothing"), None);
    }

    #[test]
    fn test_parse_expression() {
        assert_eq!(parse_expression("\"happy\""), Ok(Some(Expression::Symmetric(Eye::Happy))));
        assert_eq!(
            parse_expression(r#"["center", "wink_shut"]"#),
            Ok(Some(Expression::Asymmetric(Eye::Center, Eye::WinkShut)))
        );
        assert_eq!(parse_expression(r#"["left", "left"]"#), Ok(Some(Expression::Symmetric(Eye::Left))));
        assert_eq!(parse_expression("\"idle\""), Ok(None));
        assert_eq!(parse_expression("\"grumpy\""), Err(ParseError::InvalidValue));
        assert_eq!(
            parse_expression(r#"["a", "b", "c"]"#),
            Err(ParseError::InvalidValue)
        );
    }

    #[test]
    fn test_parse_arrays() {
        let seq: Vec<u8, 8> = parse_int_array("[1, 3, 0,]").unwrap();
        assert_eq!(seq.as_slice(), &[1, 3, 0]);
        let too_many: Result<Vec<u8, 2>, _> = parse_int_array("[1, 2, 3]");
        assert_eq!(too_many.unwrap_err(), ParseError::TooManyItems);
        assert_eq!(parse_int_array::<u8, 4>("1, 2").unwrap_err(), ParseError::InvalidValue);
    }

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("0x27"), Ok(0x27));
        assert_eq!(parse_address("39"), Ok(0x27));
        assert_eq!(parse_address("0x80"), Err(ParseError::InvalidValue));
    }

    #[test]
    fn test_empty_input_is_default() {
        assert_eq!(parse_config("# nothing here\n").unwrap(), DeviceConfig::default());
    }

    #[test]
    fn test_parse_full_config() {
        let config_str = r#"
[display]
address = 0x3F

[timing]
sleep_after_ms = 120_000   # two minutes
release_required = false

[sounds]
dir = "CLIPS"

[chatter]
interval_ms = 30000
messages = ["Hello, world", "Bye"]

[egg]
sequence = [1, 1, 2]
message = "Secret!"

[counter]
milestones = [10, 20]

[pad.moo]
file = "MOO.WAV"
expression = ["center", "wink_shut"]

[pad.baa]
file = "BAA.WAV"
label = "Sheep"
"#;

        let config = parse_config(config_str).unwrap();
        assert_eq!(config.display.i2c_address, 0x3F);
        assert_eq!(config.display.cols, 20);
        assert_eq!(config.timing.sleep_after_ms, 120_000);
        assert!(!config.timing.release_required);
        assert_eq!(config.timing.debounce_ms, 80);
        assert_eq!(config.asset_path("MOO.WAV").as_str(), "CLIPS/MOO.WAV");
        assert_eq!(config.chatter.messages.len(), 2);
        assert_eq!(config.chatter.messages[0].as_str(), "Hello, world");
        assert_eq!(config.egg.sequence.as_slice(), &[1, 1, 2]);
        assert_eq!(config.counter.milestones.as_slice(), &[10, 20]);

        assert_eq!(config.pads.len(), 2);
        assert_eq!(config.pads[0].label.as_str(), "moo");
        assert_eq!(
            config.pads[0].expression,
            Some(Expression::Asymmetric(Eye::Center, Eye::WinkShut))
        );
        assert_eq!(config.pads[1].label.as_str(), "Sheep");
        assert_eq!(config.pads[1].expression, None);
    }

    #[test]
    fn test_pad_without_file_is_rejected() {
        let err = parse_config("[pad.x]\nlabel = \"X\"\n").unwrap_err();
        assert_eq!(err, ParseError::InvalidValue);
    }

    #[test]
    fn test_bad_battery_model_is_rejected() {
        let err = parse_config("[battery]\nfull_mv = 3000\n").unwrap_err();
        assert_eq!(err, ParseError::InvalidValue);
    }
}
