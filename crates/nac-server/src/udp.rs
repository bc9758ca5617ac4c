//! Generic UDP listener daemon

use crate::daemon::{DaemonContext, EntryPoint};
use crate::error::ServerError;
use async_trait::async_trait;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Largest datagram read from the socket
pub const MAX_DATAGRAM_SIZE: usize = 4096;

/// Handles one received datagram.
///
/// Replies, if any, are sent by the handler through `socket`.
#[async_trait]
pub trait DatagramHandler: Send + Sync + 'static {
    async fn handle(
        &self,
        socket: &UdpSocket,
        data: &[u8],
        peer: SocketAddr,
    ) -> Result<(), ServerError>;
}

/// [`EntryPoint`] that binds one UDP socket and feeds datagrams to a
/// [`DatagramHandler`] strictly one at a time.
///
/// Receives and handler calls are both abandoned on cancellation. Handler
/// errors are logged and do not end the run.
pub struct UdpDaemon<H> {
    bind_addr: SocketAddr,
    handler: H,
    local_addr: watch::Sender<Option<SocketAddr>>,
}

impl<H: DatagramHandler> UdpDaemon<H> {
    pub fn new(bind_addr: SocketAddr, handler: H) -> Self {
        let (local_addr, _) = watch::channel(None);
        Self {
            bind_addr,
            handler,
            local_addr,
        }
    }

    /// Address of the bound socket while a run is active.
    ///
    /// Useful when binding to port 0.
    pub fn local_addr(&self) -> watch::Receiver<Option<SocketAddr>> {
        self.local_addr.subscribe()
    }
}

#[async_trait]
impl<H: DatagramHandler> EntryPoint for UdpDaemon<H> {
    async fn run(&self, ctx: DaemonContext) {
        let socket = match UdpSocket::bind(self.bind_addr).await {
            Ok(socket) => socket,
            Err(e) => {
                error!(
                    daemon = ctx.name(),
                    address = %self.bind_addr,
                    error = %e,
                    "Failed to bind listener"
                );
                return;
            }
        };
        let local = socket.local_addr().ok();
        self.local_addr.send_replace(local);
        info!(daemon = ctx.name(), address = ?local, "Listening");
        ctx.mark_running();

        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        loop {
            let (len, peer) = tokio::select! {
                _ = ctx.cancelled() => break,
                received = socket.recv_from(&mut buf) => match received {
                    Ok(received) => received,
                    Err(e) => {
                        warn!(daemon = ctx.name(), error = %e, "Receive failed");
                        continue;
                    }
                },
            };

            tokio::select! {
                _ = ctx.cancelled() => break,
                result = self.handler.handle(&socket, &buf[..len], peer) => {
                    if let Err(e) = result {
                        debug!(daemon = ctx.name(), client_addr = %peer, error = %e, "Error handling datagram");
                    }
                }
            }
        }

        self.local_addr.send_replace(None);
        info!(daemon = ctx.name(), "Listener closed");
    }
}
