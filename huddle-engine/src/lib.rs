mod backoff;
mod chat;
mod client;
mod config;
mod error;
mod media;
mod orchestrator;
mod presence;
mod signaling;
mod store;
mod transport;

pub use backoff::*;
pub use chat::*;
pub use client::*;
pub use config::*;
pub use error::*;
pub use media::*;
pub use orchestrator::*;
pub use presence::*;
pub use signaling::*;
pub use store::*;
pub use transport::*;
