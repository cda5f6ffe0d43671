//! Client module

pub mod udp_client;

pub use udp_client::UdpClient;
