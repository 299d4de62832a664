mod joined_room;
mod mesh_client;
mod room_event;

pub use joined_room::*;
pub use mesh_client::*;
pub use room_event::*;
