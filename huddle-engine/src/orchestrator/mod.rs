mod handle_signal_impl;
mod handle_transport_impl;
mod orchestrator;
mod orchestrator_command;
mod peer_event;
mod peer_session;
mod timer_impl;

pub use orchestrator::*;
pub use orchestrator_command::*;
pub use peer_event::*;
pub use peer_session::*;
