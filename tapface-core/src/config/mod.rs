//! Device configuration
//!
//! Typed configuration plus the TOML-subset parser the firmware runs on
//! the embedded `device.toml`.

pub mod toml;
pub mod types;

pub use toml::{parse_config, ParseError};
pub use types::*;
