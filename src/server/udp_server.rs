//! UDP request loop

use crate::config::Config;
use crate::protocol::{Codec, Limits, Reply};
use crate::server::events::{Event, EventSink, TracingSink};
use crate::server::Dispatcher;
use crate::{Error, Result};
use std::future::Future;
use std::io::ErrorKind;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tracing::{info, trace};

/// Phase of the request loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    AwaitingReadiness,
    Processing,
}

/// Owns the listening socket and serves one datagram per readiness event.
///
/// Each iteration reads, decodes, applies, encodes and replies before the
/// next datagram is looked at, so commands apply in arrival order.
pub struct UdpServer<S = TracingSink> {
    socket: UdpSocket,
    limits: Limits,
    dispatcher: Dispatcher,
    sink: S,
    state: LoopState,
}

impl UdpServer<TracingSink> {
    /// Bind the listening socket described by `config`
    pub async fn bind(config: &Config) -> Result<Self> {
        let addr = config.socket_addr();
        let socket = UdpSocket::bind(addr).await?;
        Ok(Self::new(socket, config.limits(), TracingSink))
    }
}

impl<S: EventSink> UdpServer<S> {
    /// Wrap an already bound socket
    pub fn new(socket: UdpSocket, limits: Limits, sink: S) -> Self {
        UdpServer {
            socket,
            limits,
            dispatcher: Dispatcher::new(),
            sink,
            state: LoopState::Idle,
        }
    }

    /// Swap in a dispatcher whose table was prepared beforehand
    #[cfg(test)]
    pub(crate) fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Serve requests until `shutdown` resolves or a fatal condition occurs.
    ///
    /// Transport failures, zero-length datagrams and table corruption end
    /// the loop with an error after a `loop_fatal` event. The socket is
    /// closed when this returns.
    pub async fn run<F>(mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        // One spare byte so an oversize datagram is seen rather than truncated.
        let mut buf = vec![0u8; self.limits.max_payload_len + 1];
        info!("Keyvo server listening on {}", self.local_addr()?);

        let result = loop {
            self.transition(LoopState::AwaitingReadiness);
            tokio::select! {
                biased;
                () = &mut shutdown => {
                    info!("Shutdown requested");
                    break Ok(());
                }
                ready = self.socket.readable() => {
                    if let Err(e) = ready {
                        break Err(Error::Transport(format!("readiness wait failed: {}", e)));
                    }
                }
            }

            let (len, peer) = match self.socket.try_recv_from(&mut buf) {
                Ok(received) => received,
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) => {
                    self.transition(LoopState::Idle);
                    continue;
                }
                Err(e) => break Err(Error::Transport(format!("receive failed: {}", e))),
            };

            self.transition(LoopState::Processing);
            if let Err(e) = self.process(&buf[..len], peer).await {
                break Err(e);
            }
            self.transition(LoopState::Idle);
        };

        if let Err(error) = &result {
            self.sink.record(Event::LoopFatal { error });
        }

        info!(
            "Closing socket; {} mutations applied, {} keys live",
            self.dispatcher.ops_count(),
            self.dispatcher.table().len()
        );
        result
    }

    async fn process(&mut self, payload: &[u8], peer: SocketAddr) -> Result<()> {
        self.sink.record(Event::RequestReceived {
            peer,
            len: payload.len(),
        });

        if payload.is_empty() {
            return Err(Error::Transport(format!("zero-length datagram from {}", peer)));
        }

        let reply = match Codec::decode(payload, &self.limits) {
            Ok(command) => {
                let reply = self.dispatcher.apply(command.clone());
                self.sink.record(Event::CommandApplied {
                    peer,
                    command: &command,
                    reply: &reply,
                });
                reply
            }
            Err(error) => {
                self.sink.record(Event::DecodeFailed {
                    peer,
                    error: &error,
                });
                Reply::Malformed
            }
        };

        self.socket
            .send_to(&Codec::encode(&reply), peer)
            .await
            .map_err(|e| Error::Transport(format!("send to {} failed: {}", peer, e)))?;

        if reply == Reply::InternalError {
            return Err(Error::Internal(format!(
                "table invariant violated while serving {}",
                peer
            )));
        }

        Ok(())
    }

    fn transition(&mut self, next: LoopState) {
        trace!("loop state {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Table;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::time::timeout;

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<&'static str>>>);

    impl EventSink for Recorder {
        fn record(&mut self, event: Event<'_>) {
            self.0.lock().unwrap().push(event.name());
        }
    }

    #[tokio::test]
    async fn corrupted_table_sends_error_then_stops_the_loop() {
        let mut table = Table::new();
        table.insert("a".into(), "1".into()).unwrap();
        table.corrupt("a", "z");

        let recorder = Recorder::default();
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let server = UdpServer::new(socket, Limits::default(), recorder.clone())
            .with_dispatcher(Dispatcher::with_table(table));
        let addr = server.local_addr().unwrap();
        let handle = tokio::spawn(server.run(std::future::pending()));

        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        peer.send_to(b"GET a", addr).await.unwrap();

        let mut buf = [0u8; 64];
        let (len, _) = timeout(Duration::from_secs(5), peer.recv_from(&mut buf))
            .await
            .expect("no reply")
            .unwrap();
        assert_eq!(&buf[..len], b"ERROR");

        let outcome = timeout(Duration::from_secs(5), handle)
            .await
            .expect("loop kept running")
            .unwrap();
        assert!(matches!(outcome, Err(Error::Internal(_))), "{outcome:?}");

        let events = recorder.0.lock().unwrap().clone();
        assert_eq!(
            events,
            vec!["request_received", "command_applied", "loop_fatal"]
        );
    }
}
