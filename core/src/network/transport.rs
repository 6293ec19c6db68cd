//! Connection seam between the engine and the network.
//!
//! The probe and query phases only need "open a byte stream to this socket
//! address". Keeping that behind [`Connector`] lets the scanner run against
//! real TCP in production and against simulated accessories in tests.

use std::io;
use std::net::SocketAddrV4;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::debug;

#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Opens one connection. Must not apply its own deadline; callers wrap
    /// the returned future in the phase timeout.
    async fn connect(&self, addr: SocketAddrV4) -> io::Result<Self::Stream>;
}

/// Plain TCP over the host's network stack.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&self, addr: SocketAddrV4) -> io::Result<TcpStream> {
        let stream: TcpStream = TcpStream::connect(addr).await?;
        // The handshake already succeeded, so the host counts as reachable.
        if let Err(e) = stream.set_nodelay(true) {
            debug!("could not disable Nagle on {addr}: {e}");
        }
        Ok(stream)
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
