mod chat_log;
mod memory_store;
mod room_store;
mod room_subscription;

pub use chat_log::*;
pub use memory_store::*;
pub use room_store::*;
pub use room_subscription::*;
