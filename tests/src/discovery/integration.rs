#![cfg(test)]
use std::net::Ipv4Addr;
use std::time::Duration;

use tadisc_common::config::ScanConfig;
use tadisc_common::device::{ProbeOutcome, QueryFailure, ScanResult};
use tadisc_common::network::range::NetworkRange;
use tadisc_core::{CancelHandle, HostEvent, Scanner};
use tadisc_protocols::format_record;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const REPLY: &[u8] = b"ethaddr=00:11:22:33:44:55;PS9: Full;PS8: 48V";

/// How the loopback accessory answers a query.
#[derive(Clone, Copy)]
enum Answer {
    Reply(&'static [u8]),
    Never,
    /// Aborts the connection with a RST instead of replying.
    Reset,
}

/// Serves accessory queries on 127.0.0.1. Probe connections carry no data
/// and are closed right away.
async fn spawn_accessory(answer: Answer) -> anyhow::Result<(u16, JoinHandle<()>)> {
    let listener: TcpListener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
    let port: u16 = listener.local_addr()?.port();

    let server: JoinHandle<()> = tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 64];
                match stream.read(&mut buf).await {
                    Ok(0) | Err(_) => {}
                    Ok(_) => match answer {
                        Answer::Reply(reply) => {
                            let _ = stream.write_all(reply).await;
                            let _ = stream.shutdown().await;
                        }
                        Answer::Never => tokio::time::sleep(Duration::from_secs(30)).await,
                        Answer::Reset => {
                            #[allow(deprecated)]
                            let _ = stream.set_linger(Some(Duration::ZERO));
                            drop(stream);
                        }
                    },
                }
            });
        }
    });

    Ok((port, server))
}

fn config(port: u16) -> ScanConfig {
    ScanConfig::new(0.160, false).unwrap().with_port(port)
}

fn loopback(prefix: &str) -> NetworkRange {
    format!("127.0.0.1/{prefix}").parse().unwrap()
}

#[tokio::test]
async fn discovers_a_loopback_accessory() {
    let (port, server) = spawn_accessory(Answer::Reply(REPLY)).await.unwrap();

    let result: ScanResult = Scanner::new(config(port))
        .run(&loopback("32"), &CancelHandle::new())
        .await
        .unwrap();
    server.abort();

    assert!(!result.interrupted);
    assert_eq!(result.summary.scanned, 1);
    assert_eq!(result.summary.responsive, 1);
    assert_eq!(result.devices.len(), 1);

    let device = &result.devices[0];
    assert_eq!(device.address, Ipv4Addr::LOCALHOST);
    assert_eq!(
        format_record(device.address, &device.attributes),
        "127.0.0.1: MAC=00:11:22:33:44:55;Batt=Full;PoeV=48V"
    );
}

/// 127.0.0.2 routes to the loopback device on Linux but nothing listens
/// there, so it is refused.
#[tokio::test]
#[cfg(target_os = "linux")]
async fn refused_neighbour_is_scanned_but_not_responsive() {
    let (port, server) = spawn_accessory(Answer::Reply(REPLY)).await.unwrap();

    let result: ScanResult = Scanner::new(config(port))
        .run(&loopback("30"), &CancelHandle::new())
        .await
        .unwrap();
    server.abort();

    assert_eq!(result.summary.scanned, 2);
    assert_eq!(result.summary.responsive, 1);
    assert_eq!(result.summary.discovered, 1);
    assert_eq!(result.devices[0].address, Ipv4Addr::LOCALHOST);
}

#[tokio::test]
async fn garbage_reply_counts_as_invalid() {
    let (port, server) = spawn_accessory(Answer::Reply(b"no pairs in here")).await.unwrap();

    let result: ScanResult = Scanner::new(config(port))
        .run(&loopback("32"), &CancelHandle::new())
        .await
        .unwrap();
    server.abort();

    assert!(result.devices.is_empty());
    assert_eq!(result.summary.responsive, 1);
    assert_eq!(result.summary.invalid(), 1);
}

#[tokio::test]
async fn reset_before_replying_is_a_closed_connection() {
    let (port, server) = spawn_accessory(Answer::Reset).await.unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel::<HostEvent>();

    let result: ScanResult = Scanner::new(config(port))
        .with_events(tx)
        .run(&loopback("32"), &CancelHandle::new())
        .await
        .unwrap();
    server.abort();

    assert!(result.devices.is_empty());
    assert_eq!(result.summary.responsive, 1);

    let event: HostEvent = rx.recv().await.unwrap();
    assert_eq!(event.address, Ipv4Addr::LOCALHOST);
    assert_eq!(event.outcome, ProbeOutcome::QueryFailed(QueryFailure::ConnectionClosed));
}

#[tokio::test]
async fn cancelling_abandons_a_silent_accessory() {
    let (port, server) = spawn_accessory(Answer::Never).await.unwrap();
    let cancel: CancelHandle = CancelHandle::new();

    let trigger: CancelHandle = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let started = tokio::time::Instant::now();
    let result: ScanResult = Scanner::new(config(port))
        .run(&loopback("32"), &cancel)
        .await
        .unwrap();
    server.abort();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(result.interrupted);
    assert_eq!(result.summary.scanned, 0);
    assert!(result.devices.is_empty());
}

#[tokio::test]
async fn discover_rejects_an_out_of_range_timeout() {
    let result = tadisc_core::discover(&loopback("32"), 0.5, false, &CancelHandle::new()).await;
    assert!(result.is_err());
}
