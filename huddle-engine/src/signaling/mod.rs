mod memory_relay;
mod sequencer;
mod signal_relay;
mod signaling_channel;

pub use memory_relay::*;
pub use sequencer::*;
pub use signal_relay::*;
pub use signaling_channel::*;
