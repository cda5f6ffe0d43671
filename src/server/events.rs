//! Telemetry events emitted by the request loop

use crate::Error;
use crate::protocol::{Command, DecodeError, Reply};
use std::net::SocketAddr;
use tracing::{debug, error, info, warn};

/// Something observable that happened while serving requests
#[derive(Debug)]
pub enum Event<'a> {
    RequestReceived {
        peer: SocketAddr,
        len: usize,
    },
    CommandApplied {
        peer: SocketAddr,
        command: &'a Command,
        reply: &'a Reply,
    },
    DecodeFailed {
        peer: SocketAddr,
        error: &'a DecodeError,
    },
    LoopFatal {
        error: &'a Error,
    },
}

impl Event<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Event::RequestReceived { .. } => "request_received",
            Event::CommandApplied { .. } => "command_applied",
            Event::DecodeFailed { .. } => "decode_failed",
            Event::LoopFatal { .. } => "loop_fatal",
        }
    }
}

/// Destination for loop events, injected into [`crate::UdpServer`]
pub trait EventSink {
    fn record(&mut self, event: Event<'_>);
}

/// Forwards every event to `tracing` as a structured record
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&mut self, event: Event<'_>) {
        let name = event.name();
        match event {
            Event::RequestReceived { peer, len } => {
                debug!(event = name, %peer, len, "Received datagram");
            }
            Event::CommandApplied {
                peer,
                command,
                reply,
            } => {
                info!(
                    event = name,
                    %peer,
                    verb = command.name(),
                    key = command.key(),
                    reply = reply.tag(),
                    "Applied command"
                );
            }
            Event::DecodeFailed { peer, error } => {
                warn!(event = name, %peer, %error, "Rejected malformed request");
            }
            Event::LoopFatal { error } => {
                error!(event = name, %error, "Request loop terminated");
            }
        }
    }
}
