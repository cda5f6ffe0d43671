//! UDP client for talking to a keyvo server

use crate::protocol::{Codec, Command, Reply};
use crate::{Error, Result};
use nix::errno::Errno;
use nix::sys::socket::{MsgFlags, recv};
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::os::fd::AsRawFd;
use std::time::Duration;
use tokio::net::{UdpSocket, lookup_host};
use tracing::debug;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Largest reply datagram the client will accept
const REPLY_BUFFER_LEN: usize = 65_536;

/// Sends one request datagram per command and waits for its reply.
pub struct UdpClient {
    socket: UdpSocket,
    timeout: Duration,
    buf: Vec<u8>,
}

impl UdpClient {
    /// Bind an ephemeral port and associate it with the server address.
    pub async fn connect(addr: &str) -> Result<Self> {
        let server = lookup_host(addr)
            .await?
            .next()
            .ok_or_else(|| Error::Config(format!("cannot resolve {}", addr)))?;

        let local: SocketAddr = if server.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(server).await?;
        debug!("Client socket {} associated with {}", socket.local_addr()?, server);

        Ok(UdpClient {
            socket,
            timeout: DEFAULT_TIMEOUT,
            buf: vec![0; REPLY_BUFFER_LEN],
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Execute a command and get its reply.
    pub async fn execute(&mut self, command: &Command) -> Result<Reply> {
        let payload = Codec::encode_command(command);
        self.send_raw(&payload).await
    }

    /// Send an arbitrary payload and decode whatever reply comes back.
    pub async fn send_raw(&mut self, payload: &[u8]) -> Result<Reply> {
        self.discard_stale_replies()?;

        debug!("Sending: {:?}", String::from_utf8_lossy(payload));
        self.socket.send(payload).await?;

        let len = tokio::time::timeout(self.timeout, self.socket.recv(&mut self.buf))
            .await
            .map_err(|_| Error::Timeout(self.timeout))??;

        let reply = Codec::decode_reply(&self.buf[..len])
            .map_err(|e| Error::Protocol(format!("bad reply: {}", e)))?;
        debug!("Received: {}", reply);
        Ok(reply)
    }

    /// Drop replies that arrived after an earlier request timed out.
    ///
    /// Reads the kernel queue directly; the runtime may not have observed
    /// readiness for datagrams that landed while it was idle.
    fn discard_stale_replies(&mut self) -> Result<()> {
        let fd = self.socket.as_raw_fd();
        loop {
            match recv(fd, &mut self.buf, MsgFlags::MSG_DONTWAIT) {
                Ok(len) => debug!(
                    "Discarding late reply: {:?}",
                    String::from_utf8_lossy(&self.buf[..len])
                ),
                Err(Errno::EAGAIN) => return Ok(()),
                // Queued ICMP errors belong to earlier requests too.
                Err(Errno::EINTR | Errno::ECONNREFUSED) => continue,
                Err(e) => return Err(io::Error::from(e).into()),
            }
        }
    }
}
