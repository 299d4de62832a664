pub mod mock_transport;
pub mod test_network;

pub use mock_transport::*;
pub use scripted_peer::*;
pub use test_network::*;
pub use wait_helpers::*;
