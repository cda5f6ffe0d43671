//! UDP server module

pub mod dispatcher;
pub mod events;
pub mod udp_server;

pub use dispatcher::Dispatcher;
pub use events::{Event, EventSink, TracingSink};
pub use udp_server::{LoopState, UdpServer};
