pub mod channel;
pub mod endpoint;
pub mod memory;
pub mod ws;

pub use channel::{ChannelState, Link, LinkEvent, TransportChannel};
pub use endpoint::Endpoint;
pub use memory::MemoryLink;
pub use ws::WsLink;
