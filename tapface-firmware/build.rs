//! Build script for tapface-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates device.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Limits mirrored from tapface-core's config types
const MAX_PADS: usize = 8;
const MAX_LABEL_LEN: usize = 16;
const MAX_FILE_LEN: usize = 12;
const MAX_MESSAGES: usize = 24;
const MAX_SECRET_LEN: usize = 8;
const MAX_MILESTONES: usize = 8;

const EYES: &[&str] = &[
    "center",
    "left",
    "right",
    "blink",
    "happy",
    "surprised",
    "sleepy",
    "wink_shut",
];

const SECTIONS: &[&str] = &[
    "display", "timing", "battery", "sounds", "chatter", "egg", "counter", "pad",
];

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate device.toml at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=device.toml");

    let config_path = Path::new("device.toml");
    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read device.toml", &[e.to_string()]),
    };

    let config: toml::Value = match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => fail(
            "Invalid TOML syntax in device.toml",
            &e.to_string().lines().map(str::to_string).collect::<Vec<_>>(),
        ),
    };

    let mut errors = Vec::new();
    validate_sections(&config, &mut errors);
    validate_single_line_arrays(&content, &mut errors);
    let pad_count = validate_pads(&config, &mut errors);
    validate_battery(&config, &mut errors);
    validate_chatter(&config, &mut errors);
    validate_egg(&config, pad_count, &mut errors);
    validate_counter(&config, &mut errors);

    if !errors.is_empty() {
        fail("Invalid configuration in device.toml", &errors);
    }

    println!("cargo:warning=device.toml validated successfully ({} pads)", pad_count);
}

/// Abort the build with a boxed error listing
fn fail(title: &str, lines: &[String]) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<57}║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        lines
            .iter()
            .map(|line| {
                let line = if line.len() > 62 {
                    format!("{}...", &line[..59])
                } else {
                    line.clone()
                };
                format!("║  • {:<62}║", line)
            })
            .collect::<Vec<_>>()
            .join("\n")
    );
}

fn table<'a>(config: &'a toml::Value, name: &str) -> Option<&'a toml::value::Table> {
    config.get(name).and_then(|v| v.as_table())
}

fn int(table: &toml::value::Table, key: &str) -> Option<i64> {
    table.get(key).and_then(|v| v.as_integer())
}

fn validate_sections(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(root) = config.as_table() else {
        return;
    };
    for (name, value) in root {
        if !SECTIONS.contains(&name.as_str()) {
            errors.push(format!("unknown section [{}]", name));
        } else if !value.is_table() {
            errors.push(format!("'{}' must be a [section]", name));
        }
    }
}

/// The firmware's parser reads arrays from a single line
fn validate_single_line_arrays(content: &str, errors: &mut Vec<String>) {
    for (number, line) in content.lines().enumerate() {
        let code = line.split('#').next().unwrap_or("");
        let opens = code.matches('[').count();
        let closes = code.matches(']').count();
        let header = code.trim_start().starts_with('[');
        if !header && opens != closes {
            errors.push(format!("line {}: arrays must fit on one line", number + 1));
        }
    }
}

fn validate_pads(config: &toml::Value, errors: &mut Vec<String>) -> usize {
    let Some(pads) = table(config, "pad") else {
        // Stock pads are used when none are configured
        return 5;
    };
    if pads.is_empty() {
        errors.push("[pad.*] present but empty".to_string());
    }
    if pads.len() > MAX_PADS {
        errors.push(format!("at most {} pads are supported", MAX_PADS));
    }

    for (name, pad) in pads {
        let Some(pad) = pad.as_table() else {
            errors.push(format!("[pad.{}] must be a table", name));
            continue;
        };
        if name.len() > MAX_LABEL_LEN {
            errors.push(format!("[pad.{}] name longer than {}", name, MAX_LABEL_LEN));
        }
        match pad.get("file").and_then(|v| v.as_str()) {
            None => errors.push(format!("[pad.{}] missing 'file'", name)),
            Some(file) if !is_short_name(file) => {
                errors.push(format!("[pad.{}] file '{}' is not an 8.3 name", name, file))
            }
            Some(_) => {}
        }
        if let Some(label) = pad.get("label").and_then(|v| v.as_str()) {
            if label.len() > MAX_LABEL_LEN {
                errors.push(format!("[pad.{}] label longer than {}", name, MAX_LABEL_LEN));
            }
        }
        match pad.get("expression") {
            None => {}
            Some(toml::Value::String(eye)) if eye == "idle" || EYES.contains(&eye.as_str()) => {}
            Some(toml::Value::Array(eyes))
                if (1..=2).contains(&eyes.len())
                    && eyes
                        .iter()
                        .all(|e| e.as_str().is_some_and(|e| EYES.contains(&e))) => {}
            Some(_) => errors.push(format!(
                "[pad.{}] expression must be an eye name, a [left, right] pair or \"idle\"",
                name
            )),
        }
    }
    pads.len()
}

/// FAT short names: up to 8 characters, a dot, up to 3 characters
fn is_short_name(file: &str) -> bool {
    let (stem, ext) = file.split_once('.').unwrap_or((file, ""));
    file.len() <= MAX_FILE_LEN
        && !stem.is_empty()
        && stem.len() <= 8
        && ext.len() <= 3
        && !file.contains('/')
}

fn validate_battery(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(battery) = table(config, "battery") else {
        return;
    };
    if let (Some(full), Some(empty)) = (int(battery, "full_mv"), int(battery, "empty_mv")) {
        if full <= empty {
            errors.push("[battery] full_mv must be above empty_mv".to_string());
        }
    }
    for key in ["divider", "adc_max", "samples"] {
        if int(battery, key) == Some(0) {
            errors.push(format!("[battery] {} must be non-zero", key));
        }
    }
    if let (Some(low), Some(critical)) = (int(battery, "low_pct"), int(battery, "critical_pct")) {
        if critical > low {
            errors.push("[battery] critical_pct must not exceed low_pct".to_string());
        }
    }
}

fn validate_chatter(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(chatter) = table(config, "chatter") else {
        return;
    };
    if let Some(messages) = chatter.get("messages").and_then(|v| v.as_array()) {
        if messages.len() > MAX_MESSAGES {
            errors.push(format!("[chatter] at most {} messages", MAX_MESSAGES));
        }
        if messages.iter().any(|m| !m.is_str()) {
            errors.push("[chatter] messages must be strings".to_string());
        }
    }
}

fn validate_egg(config: &toml::Value, pad_count: usize, errors: &mut Vec<String>) {
    let Some(egg) = table(config, "egg") else {
        return;
    };
    if let Some(sequence) = egg.get("sequence").and_then(|v| v.as_array()) {
        if sequence.len() > MAX_SECRET_LEN {
            errors.push(format!("[egg] sequence longer than {}", MAX_SECRET_LEN));
        }
        for pad in sequence {
            match pad.as_integer() {
                Some(index) if (0..pad_count as i64).contains(&index) => {}
                _ => errors.push(format!("[egg] sequence entry {} is not a pad index", pad)),
            }
        }
    }
}

fn validate_counter(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(counter) = table(config, "counter") else {
        return;
    };
    if int(counter, "flush_threshold") == Some(0) {
        errors.push("[counter] flush_threshold must be non-zero".to_string());
    }
    if let Some(milestones) = counter.get("milestones").and_then(|v| v.as_array()) {
        if milestones.len() > MAX_MILESTONES {
            errors.push(format!("[counter] at most {} milestones", MAX_MILESTONES));
        }
    }
}
