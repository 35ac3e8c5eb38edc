//! Hardware abstraction traits
//!
//! These traits define the interface between the control loop and the
//! board: the panel goes through `tapface_display::CharDisplay`, everything
//! else through the traits below.

pub mod audio;
pub mod hardware;
pub mod random;
pub mod sensor;
pub mod storage;

pub use audio::{AudioEngine, AudioError, OutputEnable};
pub use hardware::{Clock, InputSource, PowerControl};
pub use random::{RandomSource, XorShift32};
pub use sensor::{BatterySensor, SensorError};
pub use storage::{NvRegion, StoreError};
