//! Simulated accessories for engine tests.
//!
//! Every connection is an in-memory duplex pipe. The far end plays the part
//! of the accessory: it waits for the query, optionally sleeps, writes its
//! reply and hangs up. Timings go through `tokio::time`, so tests running on
//! a paused clock see exact, repeatable deadlines.

use std::collections::HashMap;
use std::io;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

use super::transport::Connector;

pub(crate) const EXAMPLE_REPLY: &str = "MAC=00:11:22:33:44:55;Batt=Full;PoeV=48V;NsType=Ethernet";

#[derive(Debug, Clone)]
pub(crate) enum Accessory {
    /// Actively refuses the port.
    Refuse,
    /// Drops the SYN on the floor; connect never completes.
    Silent,
    /// Accepts the connection but never answers the query.
    Mute,
    /// Answers the query with `reply` after `delay`, then closes.
    Reply { delay: Duration, reply: Vec<u8> },
    /// Sends the start of a reply and then stalls with the connection open.
    PartialThenMute { reply: Vec<u8> },
}

#[derive(Debug, Clone)]
struct SimHost {
    connect_delay: Duration,
    accessory: Accessory,
}

#[derive(Debug, Default)]
pub(crate) struct SimConnector {
    hosts: HashMap<Ipv4Addr, SimHost>,
    connects: Mutex<HashMap<Ipv4Addr, usize>>,
}

impl SimConnector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn host(mut self, addr: Ipv4Addr, accessory: Accessory) -> Self {
        self.hosts.insert(
            addr,
            SimHost {
                connect_delay: Duration::ZERO,
                accessory,
            },
        );
        self
    }

    /// Like [`host`](Self::host) but the handshake takes `connect_delay`.
    pub(crate) fn slow_host(mut self, addr: Ipv4Addr, connect_delay: Duration, accessory: Accessory) -> Self {
        self.hosts.insert(
            addr,
            SimHost {
                connect_delay,
                accessory,
            },
        );
        self
    }

    pub(crate) fn replying(self, addr: Ipv4Addr, delay: Duration) -> Self {
        self.host(
            addr,
            Accessory::Reply {
                delay,
                reply: EXAMPLE_REPLY.as_bytes().to_vec(),
            },
        )
    }

    /// Connection attempts seen for `addr`, probe and query included.
    pub(crate) fn connects_to(&self, addr: Ipv4Addr) -> usize {
        let connects = self.connects.lock().unwrap();
        connects.get(&addr).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Connector for SimConnector {
    type Stream = DuplexStream;

    async fn connect(&self, addr: SocketAddrV4) -> io::Result<DuplexStream> {
        let ip: Ipv4Addr = *addr.ip();
        *self.connects.lock().unwrap().entry(ip).or_insert(0) += 1;

        let Some(host) = self.hosts.get(&ip).cloned() else {
            return Err(io::Error::from(io::ErrorKind::ConnectionRefused));
        };

        match host.accessory {
            Accessory::Refuse => return Err(io::Error::from(io::ErrorKind::ConnectionRefused)),
            Accessory::Silent => std::future::pending::<()>().await,
            _ => {}
        }

        tokio::time::sleep(host.connect_delay).await;

        let (client, server) = tokio::io::duplex(8192);
        tokio::spawn(serve(server, host.accessory));
        Ok(client)
    }
}

async fn serve(mut server: DuplexStream, accessory: Accessory) {
    let mut query = [0u8; 64];
    match server.read(&mut query).await {
        // Probe connections hang up without sending anything.
        Ok(0) | Err(_) => return,
        Ok(_) => {}
    }

    match accessory {
        Accessory::Reply { delay, reply } => {
            tokio::time::sleep(delay).await;
            let _ = server.write_all(&reply).await;
            let _ = server.shutdown().await;
        }
        Accessory::PartialThenMute { reply } => {
            let _ = server.write_all(&reply).await;
            std::future::pending::<()>().await
        }
        Accessory::Mute => std::future::pending::<()>().await,
        Accessory::Refuse | Accessory::Silent => {}
    }
}
