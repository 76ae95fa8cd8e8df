use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Ports whose acceptance marks a host as live.
pub const PROBE_PORTS: [u16; 5] = [22, 23, 80, 443, 161];

pub async fn port_open(address: SocketAddr, connect_timeout: Duration) -> bool {
    matches!(
        tokio::time::timeout(connect_timeout, TcpStream::connect(address)).await,
        Ok(Ok(_))
    )
}

async fn probe_host(ip: Ipv4Addr, connect_timeout: Duration) -> Vec<u16> {
    let mut open = Vec::new();
    for port in PROBE_PORTS {
        let address = SocketAddr::new(IpAddr::V4(ip), port);
        if port_open(address, connect_timeout).await {
            open.push(port);
        }
    }
    open
}

/// Connect-probes every target in parallel under a bounded worker pool and
/// returns the hosts that accepted on at least one port, with the ports seen
/// open. Per-host errors are swallowed: no answer means no entry.
pub async fn probe_hosts(
    targets: Vec<Ipv4Addr>,
    connect_timeout: Duration,
    concurrency: usize,
) -> BTreeMap<Ipv4Addr, Vec<u16>> {
    debug!(hosts = targets.len(), "tcp connect probing started");
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));

    let mut handles = Vec::with_capacity(targets.len());
    for ip in targets {
        let semaphore = Arc::clone(&semaphore);
        handles.push(tokio::spawn(async move {
            let Ok(_permit) = semaphore.acquire().await else {
                return None;
            };
            let open = probe_host(ip, connect_timeout).await;
            if open.is_empty() { None } else { Some((ip, open)) }
        }));
    }

    let mut live = BTreeMap::new();
    for handle in handles {
        match handle.await {
            Ok(Some((ip, ports))) => {
                live.insert(ip, ports);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "tcp probe task failed"),
        }
    }
    debug!(live = live.len(), "tcp connect probing finished");
    live
}
