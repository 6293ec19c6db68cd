//! The two timed network phases run against every host.
//!
//! [`probe`] only checks that the accessory port accepts a connection.
//! [`query`] reconnects, sends the attribute query and collects the reply.
//! The phases keep separate deadlines: the probe deadline is tiny so that a
//! sweep over silent addresses stays fast, while the query deadline leaves
//! the accessory firmware room to assemble its answer.
//!
//! A phase that completes at exactly its deadline counts as completed.

use std::net::SocketAddrV4;
use std::time::Duration;

use tadisc_common::config::RESPONSE_BUFFER_SIZE;
use tadisc_common::device::QueryFailure;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::{self, Instant};
use tracing::trace;

use super::transport::Connector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus {
    Reachable,
    /// The connection was actively rejected.
    Unreachable,
    TimedOut,
}

/// Attempts one connection to `addr` and closes it straight away.
pub async fn probe<C: Connector>(connector: &C, addr: SocketAddrV4, timeout: Duration) -> ProbeStatus {
    match time::timeout(timeout, connector.connect(addr)).await {
        Ok(Ok(stream)) => {
            drop(stream);
            trace!("{addr} accepted the probe");
            ProbeStatus::Reachable
        }
        Ok(Err(e)) => {
            trace!("{addr} rejected the probe: {e}");
            ProbeStatus::Unreachable
        }
        Err(_elapsed) => ProbeStatus::TimedOut,
    }
}

/// Sends `payload` to `addr` and reads the reply.
///
/// Reading stops when the peer closes, when [`RESPONSE_BUFFER_SIZE`] bytes
/// have arrived, or when `timeout` runs out. In the last case whatever was
/// received is returned; only a reply that never started is a timeout.
pub async fn query<C: Connector>(
    connector: &C,
    addr: SocketAddrV4,
    payload: &[u8],
    timeout: Duration,
) -> Result<Vec<u8>, QueryFailure> {
    let deadline: Instant = Instant::now() + timeout;

    let mut stream = match time::timeout_at(deadline, connector.connect(addr)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            trace!("{addr} refused the query connection: {e}");
            return Err(QueryFailure::Send);
        }
        Err(_elapsed) => return Err(QueryFailure::TimedOut),
    };

    let sent = time::timeout_at(deadline, async {
        stream.write_all(payload).await?;
        stream.flush().await
    })
    .await;

    match sent {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            trace!("failed to send query to {addr}: {e}");
            return Err(QueryFailure::Send);
        }
        Err(_elapsed) => return Err(QueryFailure::TimedOut),
    }

    let mut buf: Vec<u8> = vec![0u8; RESPONSE_BUFFER_SIZE];
    let mut filled: usize = 0;

    while filled < buf.len() {
        match time::timeout_at(deadline, stream.read(&mut buf[filled..])).await {
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => filled += n,
            Ok(Err(e)) if filled == 0 => {
                trace!("{addr} dropped the connection before replying: {e}");
                return Err(QueryFailure::ConnectionClosed);
            }
            Ok(Err(e)) => {
                trace!("{addr} dropped the connection mid-reply: {e}");
                break;
            }
            Err(_elapsed) if filled == 0 => return Err(QueryFailure::TimedOut),
            Err(_elapsed) => break,
        }
    }

    buf.truncate(filled);
    trace!("{addr} replied with {filled} bytes");
    Ok(buf)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
