mod media_controller;
mod media_devices;
mod media_track;

pub use media_controller::*;
pub use media_devices::*;
pub use media_track::*;
