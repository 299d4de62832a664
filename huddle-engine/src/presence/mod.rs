mod presence_manager;
mod roster;

pub use presence_manager::*;
pub use roster::*;
