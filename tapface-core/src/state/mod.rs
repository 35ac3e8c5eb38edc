//! Device state machine
//!
//! Four top-level states with total, pure transitions. The timed
//! sub-steps of the loop (button hold, pad release, cooldown) live in
//! [`crate::device::Phase`]; this module only decides where an event leads.

pub mod events;
pub mod machine;

pub use events::Event;
pub use machine::DeviceState;
